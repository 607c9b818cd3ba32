//! Dashboard filter state
//!
//! Filters narrow the service-request tables and analytics cards. They are
//! rendered into query parameters for the backend API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, ValidationError};

/// Lifecycle status of a service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    InProgress,
    AwaitingParts,
    Completed,
    Cancelled,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::AwaitingParts => "awaiting_parts",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ValidationError::invalid_input(format!(
                "Date range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Active dashboard filters. `Default` is the unfiltered state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilters {
    date_range: Option<DateRange>,
    statuses: BTreeSet<RequestStatus>,
    agent_id: Option<String>,
    search: String,
}

impl DashboardFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        self.date_range = Some(DateRange::new(start, end)?);
        Ok(())
    }

    pub fn clear_date_range(&mut self) {
        self.date_range = None;
    }

    /// Add the status if absent, remove it if present
    pub fn toggle_status(&mut self, status: RequestStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn set_agent(&mut self, agent_id: Option<String>) {
        self.agent_id = agent_id.filter(|id| !id.trim().is_empty());
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into().trim().to_string();
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn statuses(&self) -> &BTreeSet<RequestStatus> {
        &self.statuses
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Whether any filter narrows the results
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    /// Back to the unfiltered state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Query parameters for the request-listing endpoint
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(range) = &self.date_range {
            query.push(("from".to_string(), range.start.format("%Y-%m-%d").to_string()));
            query.push(("to".to_string(), range.end.format("%Y-%m-%d").to_string()));
        }
        if !self.statuses.is_empty() {
            let statuses: Vec<String> = self.statuses.iter().map(ToString::to_string).collect();
            query.push(("status".to_string(), statuses.join(",")));
        }
        if let Some(agent) = &self.agent_id {
            query.push(("agent".to_string(), agent.clone()));
        }
        if !self.search.is_empty() {
            query.push(("q".to_string(), self.search.clone()));
        }
        query
    }
}
