//! Resolved caller identity and per-number resolution state

use crate::telephony;
use std::sync::{Arc, OnceLock};

/// A caller identity resolved from the contacts directory.
///
/// Immutable except `formatted`, which is filled lazily exactly once the
/// first time a row renders it.
#[derive(Debug, Clone)]
pub struct Identity {
    pub contact_id: i64,
    pub name: Option<String>,
    pub number_type: i64,
    pub number_label: Option<String>,
    pub number: String,
    formatted: OnceLock<String>,
}

impl Identity {
    pub fn new(
        contact_id: i64,
        name: Option<String>,
        number_type: i64,
        number_label: Option<String>,
        number: String,
    ) -> Self {
        Self {
            contact_id,
            name,
            number_type,
            number_label,
            number,
            formatted: OnceLock::new(),
        }
    }

    /// Display form of the number, computed on first use and cached.
    pub fn formatted_number(&self) -> &str {
        self.formatted
            .get_or_init(|| telephony::format_number(&self.number))
    }

    /// True when the entry already carries a usable display name.
    pub fn has_name(&self) -> bool {
        matches!(&self.name, Some(name) if !name.is_empty())
    }

    /// Compare against the identity snapshot embedded in a call-log row.
    /// Absent and empty strings are treated alike so a directory row without
    /// a label never fights a stored empty label.
    pub fn matches_snapshot(
        &self,
        name: Option<&str>,
        number_type: i64,
        number_label: Option<&str>,
    ) -> bool {
        fn text_eq(a: Option<&str>, b: Option<&str>) -> bool {
            a.unwrap_or("") == b.unwrap_or("")
        }

        text_eq(self.name.as_deref(), name)
            && self.number_type == number_type
            && text_eq(self.number_label.as_deref(), number_label)
    }
}

/// Resolution state of one number within the active session.
///
/// Resolved identities are shared rather than copied so every holder sees the
/// same lazily-filled formatted number.
#[derive(Debug, Clone, Default)]
pub enum ResolutionState {
    /// No lookup has been issued yet.
    #[default]
    NotQueried,
    /// A lookup ran (or is in flight) and found nothing; never retried within
    /// the session.
    QueriedNoMatch,
    /// The directory matched.
    Resolved(Arc<Identity>),
}

impl ResolutionState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionState::Resolved(_))
    }
}
