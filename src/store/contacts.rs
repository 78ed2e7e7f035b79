//! SQLite contacts directory

use super::StoreError;
use crate::resolver_core::{ContactDirectory, ContactMatch, DirectoryError};
use crate::telephony;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// How many trailing digits the fuzzy filter matches on before candidates are
/// verified properly.
const FILTER_SUFFIX_LEN: usize = 7;

/// Contacts table with a precomputed normalized-number column for suffix
/// filtering. Shares its connection across threads the same way the call log
/// does.
#[derive(Debug)]
pub struct SqliteContactDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContactDirectory {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                number TEXT NOT NULL,
                normalized TEXT NOT NULL,
                number_type INTEGER NOT NULL DEFAULT 0,
                number_label TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_contacts_normalized ON contacts(normalized)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a contact, normalizing the number for later filtering. Returns
    /// the contact id.
    pub fn add_contact(
        &self,
        name: &str,
        number: &str,
        number_type: i64,
        number_label: Option<&str>,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO contacts (name, number, normalized, number_type, number_label)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                number,
                telephony::strip_separators(number),
                number_type,
                number_label,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn lookup(&self, number: &str) -> Result<Option<ContactMatch>, StoreError> {
        let query = telephony::strip_separators(number);
        if query.is_empty() {
            return Ok(None);
        }

        let conn = self.conn.lock().unwrap();

        // Cheap indexed pass on the trailing digits, then verify each
        // candidate with the real comparison rules. First row wins.
        let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
        let suffix = if digits.len() > FILTER_SUFFIX_LEN {
            &digits[digits.len() - FILTER_SUFFIX_LEN..]
        } else {
            digits.as_str()
        };
        if suffix.is_empty() {
            return Ok(None);
        }

        let pattern = format!("%{}%", suffix);
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, number, number_type, number_label
             FROM contacts
             WHERE normalized LIKE ?1
             ORDER BY id ASC",
        )?;

        let candidates = stmt.query_map(params![pattern], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        for candidate in candidates {
            let (id, name, stored_number, number_type, number_label) = candidate?;
            let verified = telephony::numbers_dial_same(&stored_number, number)
                || crate::history_core::matcher::sloppy_suffix_match(&stored_number, number);
            if verified {
                return Ok(Some(ContactMatch {
                    contact_id: id,
                    name: Some(name),
                    number_type,
                    number_label,
                    matched_number: stored_number,
                }));
            }
        }

        Ok(None)
    }
}

impl ContactDirectory for SqliteContactDirectory {
    fn lookup_by_number(&self, number: &str) -> Result<Option<ContactMatch>, DirectoryError> {
        self.lookup(number)
            .map_err(|e| DirectoryError::Database(e.to_string()))
    }
}

impl Clone for SqliteContactDirectory {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
