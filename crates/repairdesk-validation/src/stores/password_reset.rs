//! Forgot-password flow
//!
//! The flow collects the password-reset form over three screens. Each step
//! validates only the fields it introduces (plus the ones it depends on)
//! against the `password_reset` schema, so the same rules drive the live
//! per-field feedback and the step transitions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::forms;
use crate::schema::{FormSchema, SchemaOutcome};
use crate::values::FieldValues;

/// Screens of the forgot-password flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStep {
    RequestCode,
    VerifyCode,
    SetPassword,
    Complete,
}

/// State of one password-reset attempt
#[derive(Debug, Clone)]
pub struct PasswordResetFlow {
    schema: FormSchema,
    step: ResetStep,
    values: FieldValues,
}

impl PasswordResetFlow {
    pub fn new() -> Result<Self> {
        Ok(Self {
            schema: forms::password_reset()?,
            step: ResetStep::RequestCode,
            values: FieldValues::new(),
        })
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn email(&self) -> Option<&str> {
        self.values.get_str("email")
    }

    /// Values collected so far. Passwords are never retained.
    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Submit the account email; moves to code verification
    pub fn request_code(&mut self, email: &str) -> Result<()> {
        self.expect_step(ResetStep::RequestCode)?;
        let candidate = self.values.clone().with("email", email.trim());
        self.check(&candidate, &["email"])?;
        self.values = candidate;
        self.step = ResetStep::VerifyCode;
        tracing::debug!("Password reset code requested");
        Ok(())
    }

    /// Submit the emailed verification code
    pub fn verify_code(&mut self, code: &str) -> Result<()> {
        self.expect_step(ResetStep::VerifyCode)?;
        let candidate = self.values.clone().with("code", code.trim());
        self.check(&candidate, &["email", "code"])?;
        self.values = candidate;
        self.step = ResetStep::SetPassword;
        Ok(())
    }

    /// Submit the new password and its confirmation
    pub fn set_password(&mut self, new_password: &str, confirm_password: &str) -> Result<()> {
        self.expect_step(ResetStep::SetPassword)?;
        let candidate = self
            .values
            .clone()
            .with("new_password", new_password)
            .with("confirm_password", confirm_password);
        self.check(&candidate, &["email", "code", "new_password", "confirm_password"])?;

        let mut values = candidate;
        values.remove("new_password");
        values.remove("confirm_password");
        self.values = values;
        self.step = ResetStep::Complete;
        tracing::debug!("Password reset flow complete");
        Ok(())
    }

    /// Return to the previous screen, discarding that screen's input
    pub fn back(&mut self) {
        self.step = match self.step {
            ResetStep::RequestCode | ResetStep::VerifyCode => {
                self.values.remove("email");
                ResetStep::RequestCode
            }
            ResetStep::SetPassword => {
                self.values.remove("code");
                ResetStep::VerifyCode
            }
            ResetStep::Complete => ResetStep::Complete,
        };
    }

    /// Abandon the attempt and start over
    pub fn reset(&mut self) {
        self.step = ResetStep::RequestCode;
        self.values = FieldValues::new();
    }

    fn expect_step(&self, expected: ResetStep) -> Result<()> {
        if self.step != expected {
            return Err(ValidationError::flow_error(format!(
                "Expected step {:?} but the flow is at {:?}",
                expected, self.step
            )));
        }
        Ok(())
    }

    fn check(&self, values: &FieldValues, fields: &[&str]) -> Result<()> {
        match self.schema.validate_fields(values, fields) {
            SchemaOutcome::Valid => Ok(()),
            SchemaOutcome::Invalid(issues) => {
                let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
                Err(ValidationError::invalid_input(messages.join("; ")))
            }
        }
    }
}
