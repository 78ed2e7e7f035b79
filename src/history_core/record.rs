//! Raw call-log rows as read from the call log store

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    #[serde(rename = "INCOMING")]
    Incoming,
    #[serde(rename = "OUTGOING")]
    Outgoing,
    #[serde(rename = "MISSED")]
    Missed,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Incoming => "INCOMING",
            CallType::Outgoing => "OUTGOING",
            CallType::Missed => "MISSED",
        }
    }

    /// Stored type code in the call log table.
    pub fn code(&self) -> i64 {
        match self {
            CallType::Incoming => 1,
            CallType::Outgoing => 2,
            CallType::Missed => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(CallType::Incoming),
            2 => Some(CallType::Outgoing),
            3 => Some(CallType::Missed),
            _ => None,
        }
    }
}

/// One row of the call log. The cached_* columns hold the caller identity as
/// it was known when the call was logged; the resolver repairs them when the
/// contacts directory disagrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    pub number: String,
    pub timestamp_ms: i64,
    pub duration_secs: i64,
    pub call_type: CallType,
    pub cached_name: Option<String>,
    pub cached_number_type: i64,
    pub cached_number_label: Option<String>,
}

impl CallRecord {
    /// True when the stored identity snapshot carries a usable name.
    pub fn has_cached_name(&self) -> bool {
        matches!(&self.cached_name, Some(name) if !name.is_empty())
    }
}
