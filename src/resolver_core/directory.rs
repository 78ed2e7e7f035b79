//! Contacts directory interface consumed by the resolution worker

/// A directory row matched against a dialed number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMatch {
    pub contact_id: i64,
    pub name: Option<String>,
    pub number_type: i64,
    pub number_label: Option<String>,
    /// The number as stored in the directory, which may be better qualified
    /// than the one the call log recorded.
    pub matched_number: String,
}

#[derive(Debug)]
pub enum DirectoryError {
    Database(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::Database(e) => write!(f, "Directory database error: {}", e),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Number → contact lookup with the directory's own fuzzy/suffix filter
/// semantics. Implementations decide how loose the filter is; the resolver
/// takes the first match and treats errors the same as "no match".
pub trait ContactDirectory: Send + Sync {
    fn lookup_by_number(&self, number: &str) -> Result<Option<ContactMatch>, DirectoryError>;
}
