//! Trace log filtering shared by the store and the dashboard.

use crate::{Role, TurnRecord, UnknownRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dashboard selector value meaning "no filter".
pub const ALL_OPTION: &str = "All";

/// Conjunctive filter over the trace log. `None` fields impose no predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFilter {
    /// Keep records of this session (`"unknown"` selects records without one).
    #[serde(default)]
    pub session_id: Option<String>,
    /// Keep records with this role.
    #[serde(default)]
    pub role: Option<Role>,
    /// Keep records whose content contains this text, ignoring case.
    #[serde(default)]
    pub search_text: Option<String>,
}

impl TraceFilter {
    /// Filter that keeps every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_search(mut self, search_text: impl Into<String>) -> Self {
        self.search_text = Some(search_text.into());
        self
    }

    /// Build a filter from dashboard selector values, where `"All"` and empty
    /// strings mean "no predicate".
    pub fn from_selection(
        session: Option<&str>,
        role: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, UnknownRole> {
        let selected = |value: Option<&str>| {
            value
                .filter(|value| !value.is_empty() && *value != ALL_OPTION)
                .map(str::to_string)
        };
        let role = match selected(role) {
            Some(role) => Some(role.parse::<Role>()?),
            None => None,
        };
        Ok(Self {
            session_id: selected(session),
            role,
            search_text: search.filter(|text| !text.is_empty()).map(str::to_string),
        })
    }

    /// Whether the filter imposes no predicate at all.
    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.role.is_none() && self.search_needle().is_none()
    }

    /// Check a single record against every supplied predicate.
    pub fn matches(&self, record: &TurnRecord) -> bool {
        let needle = self.search_needle();
        self.matches_with(record, needle.as_deref())
    }

    /// Return the matching records in their original order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<TurnRecord>
    where
        I: IntoIterator<Item = &'a TurnRecord>,
    {
        let needle = self.search_needle();
        records
            .into_iter()
            .filter(|record| self.matches_with(record, needle.as_deref()))
            .cloned()
            .collect()
    }

    fn search_needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }

    fn matches_with(&self, record: &TurnRecord, needle: Option<&str>) -> bool {
        if let Some(session_id) = self.session_id.as_deref()
            && record.session_key() != session_id
        {
            return false;
        }
        if let Some(role) = self.role
            && record.role != role
        {
            return false;
        }
        match needle {
            Some(needle) => record
                .content_text()
                .is_some_and(|content| content.to_lowercase().contains(needle)),
            None => true,
        }
    }
}

/// Distinct session ids across the log, sorted, including `"unknown"` when
/// any record lacks one.
pub fn distinct_sessions<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a TurnRecord>,
{
    records
        .into_iter()
        .map(|record| record.session_key().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
