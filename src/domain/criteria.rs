//! Search and filter criteria
//!
//! [`FilterCriteria`] is kind-agnostic: it maps a filter-group identifier
//! to the option identifiers selected in that group. Translating groups into
//! query syntax is the gateway's job, not the browser's.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const BRAND_GROUP: &str = "brand";
pub const DEPARTMENT_GROUP: &str = "department";

/// Selected option identifiers within one filter group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FilterGroup {
    pub group_id: String,
    pub selected_values: Vec<String>,
}

impl FilterGroup {
    pub fn is_empty(&self) -> bool {
        self.selected_values.is_empty()
    }
}

/// Ordered set of filter groups; an absent or empty group means no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilterCriteria {
    pub groups: Vec<FilterGroup>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selections of `group_id`, replacing any previous selections.
    /// Duplicate values are collapsed, first occurrence wins.
    #[must_use]
    pub fn with_group<I, S>(mut self, group_id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected_values: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !selected_values.contains(&value) {
                selected_values.push(value);
            }
        }

        if let Some(group) = self.groups.iter_mut().find(|g| g.group_id == group_id) {
            group.selected_values = selected_values;
        } else {
            self.groups.push(FilterGroup {
                group_id: group_id.to_string(),
                selected_values,
            });
        }
        self
    }

    #[must_use]
    pub fn brands<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(BRAND_GROUP, ids)
    }

    #[must_use]
    pub fn departments<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(DEPARTMENT_GROUP, ids)
    }

    pub fn selected(&self, group_id: &str) -> &[String] {
        self.groups
            .iter()
            .find(|g| g.group_id == group_id)
            .map(|g| g.selected_values.as_slice())
            .unwrap_or_default()
    }

    /// Groups that actually constrain the result.
    pub fn active_groups(&self) -> impl Iterator<Item = &FilterGroup> {
        self.groups.iter().filter(|g| !g.is_empty())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active_groups().next().is_none()
    }
}

/// Free-text search input, trimmed once on construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    lowered: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let lowered = text.to_lowercase();
        Self { text, lowered }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Empty or whitespace-only input means "no search".
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Case-insensitive substring test.
    pub fn matches(&self, haystack: &str) -> bool {
        !self.lowered.is_empty() && haystack.to_lowercase().contains(&self.lowered)
    }
}

impl From<&str> for SearchQuery {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
