//! Built-in schemas for the dashboard forms
//!
//! Each function returns a compiled [`FormSchema`]; [`definition`] exposes the
//! underlying data so it can be exported or extended.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::schema::{FieldDefinition, FieldRule, FormSchema, SchemaDefinition};

/// Minimum password length across all forms
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Agent roles accepted by the agent form
pub const AGENT_ROLES: [&str; 3] = ["technician", "supervisor", "admin"];

/// Service request priorities
pub const REQUEST_PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ()-]{6,19}$";
const RESET_CODE_PATTERN: &str = r"^[0-9]{6}$";

/// The dashboard's forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Login,
    Agent,
    ServiceRequest,
    PasswordReset,
}

impl FormKind {
    pub const ALL: [FormKind; 4] = [
        FormKind::Login,
        FormKind::Agent,
        FormKind::ServiceRequest,
        FormKind::PasswordReset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Login => "login",
            FormKind::Agent => "agent",
            FormKind::ServiceRequest => "service_request",
            FormKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "login" => Ok(FormKind::Login),
            "agent" => Ok(FormKind::Agent),
            "service_request" | "request" => Ok(FormKind::ServiceRequest),
            "password_reset" | "forgot_password" => Ok(FormKind::PasswordReset),
            _ => Err(ValidationError::invalid_input(format!("Unknown form: {}", s))),
        }
    }
}

/// Data definition of a built-in form
pub fn definition(kind: FormKind) -> SchemaDefinition {
    match kind {
        FormKind::Login => SchemaDefinition::new("login")
            .field(email_field("email"))
            .field(
                FieldDefinition::new("password")
                    .rule(FieldRule::required().with_message("Password is required"))
                    .rule(password_length()),
            ),
        FormKind::Agent => SchemaDefinition::new("agent")
            .field(
                FieldDefinition::new("name")
                    .rule(FieldRule::required().with_message("Name is required"))
                    .rule(FieldRule::min_length(2))
                    .rule(FieldRule::max_length(80)),
            )
            .field(email_field("email"))
            .field(
                FieldDefinition::new("phone").rule(
                    FieldRule::pattern(PHONE_PATTERN).with_message("Invalid phone number"),
                ),
            )
            .field(
                FieldDefinition::new("role")
                    .rule(FieldRule::required().with_message("Role is required"))
                    .rule(FieldRule::one_of(AGENT_ROLES)),
            ),
        FormKind::ServiceRequest => SchemaDefinition::new("service_request")
            .field(
                FieldDefinition::new("customer_name")
                    .rule(FieldRule::required().with_message("Customer name is required"))
                    .rule(FieldRule::max_length(120)),
            )
            .field(
                FieldDefinition::new("device")
                    .rule(FieldRule::required().with_message("Device is required")),
            )
            .field(
                FieldDefinition::new("issue_description")
                    .rule(FieldRule::required().with_message("Describe the issue"))
                    .rule(
                        FieldRule::min_length(10)
                            .with_message("Description must be at least 10 characters"),
                    )
                    .rule(FieldRule::max_length(2000)),
            )
            .field(
                FieldDefinition::new("priority")
                    .rule(FieldRule::required().with_message("Priority is required"))
                    .rule(FieldRule::one_of(REQUEST_PRIORITIES)),
            ),
        FormKind::PasswordReset => SchemaDefinition::new("password_reset")
            .field(email_field("email"))
            .field(
                FieldDefinition::new("code")
                    .rule(FieldRule::required().with_message("Verification code is required"))
                    .rule(
                        FieldRule::pattern(RESET_CODE_PATTERN)
                            .with_message("Code must be 6 digits"),
                    ),
            )
            .field(
                FieldDefinition::new("new_password")
                    .rule(FieldRule::required().with_message("New password is required"))
                    .rule(password_length()),
            )
            .field(
                FieldDefinition::new("confirm_password")
                    .rule(FieldRule::required().with_message("Confirm your new password"))
                    .rule(
                        FieldRule::matches("new_password").with_message("Passwords do not match"),
                    ),
            ),
    }
}

/// Compiled schema for a built-in form
pub fn builtin(kind: FormKind) -> Result<FormSchema> {
    definition(kind).compile()
}

pub fn login() -> Result<FormSchema> {
    builtin(FormKind::Login)
}

pub fn agent() -> Result<FormSchema> {
    builtin(FormKind::Agent)
}

pub fn service_request() -> Result<FormSchema> {
    builtin(FormKind::ServiceRequest)
}

pub fn password_reset() -> Result<FormSchema> {
    builtin(FormKind::PasswordReset)
}

fn email_field(name: &str) -> FieldDefinition {
    FieldDefinition::new(name)
        .rule(FieldRule::required().with_message("Email is required"))
        .rule(FieldRule::email())
}

fn password_length() -> FieldRule {
    FieldRule::min_length(MIN_PASSWORD_LENGTH).with_message(format!(
        "Password must be at least {} characters",
        MIN_PASSWORD_LENGTH
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::values::FieldValues;

    #[test]
    fn test_all_builtins_compile() {
        for kind in FormKind::ALL {
            let schema = builtin(kind).unwrap();
            assert_eq!(schema.name(), kind.as_str());
            assert_eq!(kind.as_str().parse::<FormKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_login_messages() {
        let outcome = login()
            .unwrap()
            .validate(&FieldValues::new().with("email", "").with("password", "ab"))
            .unwrap();
        assert_eq!(
            outcome.first_issue_for("email").unwrap().message,
            "Email is required"
        );
        assert_eq!(
            outcome.first_issue_for("password").unwrap().message,
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn test_agent_form() {
        let schema = agent().unwrap();
        let values = FieldValues::new()
            .with("name", "Dana Okafor")
            .with("email", "dana@repair.shop")
            .with("phone", "+1 (555) 010-2030")
            .with("role", "technician");
        assert!(schema.validate(&values).unwrap().is_valid());

        let values = values.with("role", "owner").with("phone", "call me");
        let outcome = schema.validate(&values).unwrap();
        assert_eq!(
            outcome.first_issue_for("role").unwrap().message,
            "Must be one of: technician, supervisor, admin"
        );
        assert_eq!(
            outcome.first_issue_for("phone").unwrap().message,
            "Invalid phone number"
        );
    }

    #[test]
    fn test_service_request_description_length() {
        let values = FieldValues::new()
            .with("customer_name", "Lee")
            .with("device", "Laptop")
            .with("issue_description", "Broken")
            .with("priority", "urgent");
        let outcome = service_request().unwrap().validate(&values).unwrap();
        assert_eq!(outcome.issues().len(), 1);
        assert_eq!(
            outcome.first_issue_for("issue_description").unwrap().message,
            "Description must be at least 10 characters"
        );
    }

    #[test]
    fn test_password_reset_confirmation() {
        let values = FieldValues::new()
            .with("email", "a@b.com")
            .with("code", "123456")
            .with("new_password", "longenough1")
            .with("confirm_password", "longenough2");
        let outcome = password_reset().unwrap().validate(&values).unwrap();
        assert_eq!(
            outcome.first_issue_for("confirm_password").unwrap().message,
            "Passwords do not match"
        );
    }

    #[test]
    fn test_unknown_form_name() {
        assert!("billing".parse::<FormKind>().is_err());
        assert_eq!("forgot-password".parse::<FormKind>().unwrap(), FormKind::PasswordReset);
    }
}
