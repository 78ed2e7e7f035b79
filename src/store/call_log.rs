//! SQLite call log store

use super::{CallLogSource, DeleteFilter, StoreError};
use crate::history_core::matcher;
use crate::history_core::{CallRecord, CallType};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Call history table behind a shared connection.
///
/// Thread-safe through `Arc<Mutex<Connection>>`: the presentation side reads
/// and deletes, the resolution worker issues repair writes.
#[derive(Debug)]
pub struct SqliteCallLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCallLog {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_tuned_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number TEXT NOT NULL,
                date INTEGER NOT NULL,
                duration INTEGER NOT NULL,
                type INTEGER NOT NULL,
                new INTEGER NOT NULL DEFAULT 0,
                cached_name TEXT,
                cached_number_type INTEGER NOT NULL DEFAULT 0,
                cached_number_label TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_calls_date ON calls(date DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_calls_number ON calls(number)",
            [],
        )?;

        log::info!("✅ Call log database initialized with WAL mode");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append a call. The stored new-flag is set for missed calls so they can
    /// be acknowledged later. Returns the new row id.
    pub fn log_call(&self, record: &CallRecord) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO calls
                 (number, date, duration, type, new, cached_name, cached_number_type, cached_number_label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.number,
                record.timestamp_ms,
                record.duration_secs,
                record.call_type.code(),
                (record.call_type == CallType::Missed) as i64,
                record.cached_name,
                record.cached_number_type,
                record.cached_number_label,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Count of missed calls not yet acknowledged.
    pub fn new_missed_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM calls WHERE type = ?1 AND new = 1",
            params![CallType::Missed.code()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl CallLogSource for SqliteCallLog {
    fn recent_calls(&self) -> Result<Vec<CallRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, number, date, duration, type,
                    cached_name, cached_number_type, cached_number_label
             FROM calls
             ORDER BY date DESC, id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, number, date, duration, type_code, name, number_type, number_label) = row?;
            // Rows with an unrecognized type code are skipped, not fatal
            let Some(call_type) = CallType::from_code(type_code) else {
                log::warn!("Skipping call row {} with unknown type {}", id, type_code);
                continue;
            };
            records.push(CallRecord {
                id,
                number,
                timestamp_ms: date,
                duration_secs: duration,
                call_type,
                cached_name: name,
                cached_number_type: number_type,
                cached_number_label: number_label,
            });
        }

        Ok(records)
    }

    fn update_cached_identity(
        &self,
        number: &str,
        name: Option<&str>,
        number_type: i64,
        number_label: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}", number);
        let changed = conn.execute(
            "UPDATE calls
             SET cached_name = ?1, cached_number_type = ?2, cached_number_label = ?3
             WHERE number LIKE ?4",
            params![name, number_type, number_label, pattern],
        )?;
        log::debug!("Repaired cached identity on {} rows for {}", changed, number);
        Ok(())
    }

    fn delete_where(&self, filter: DeleteFilter) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let deleted = match filter {
            DeleteFilter::All => conn.execute("DELETE FROM calls", [])?,
            DeleteFilter::ByType(call_type) => conn.execute(
                "DELETE FROM calls WHERE type = ?1",
                params![call_type.code()],
            )?,
            DeleteFilter::ByCachedName(name) => {
                conn.execute("DELETE FROM calls WHERE cached_name = ?1", params![name])?
            }
            DeleteFilter::ByNumber(number) => {
                // Variants of the same caller may be stored with and without
                // prefixes ("91234567", "+6591234567"). Find the shortest
                // stored variant and delete by trailing match on it so every
                // spelling goes away together.
                let mut stmt = conn.prepare("SELECT DISTINCT number FROM calls")?;
                let stored: Vec<String> = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<_, _>>()?;

                let mut target = number.clone();
                for candidate in stored {
                    let same = matcher::equivalent(
                        &matcher::CallerRef {
                            number: &candidate,
                            contact_id: -1,
                        },
                        &matcher::CallerRef {
                            number: &number,
                            contact_id: -1,
                        },
                    );
                    if same && candidate.len() < target.len() {
                        target = candidate;
                    }
                }

                let pattern = format!("%{}", target);
                conn.execute("DELETE FROM calls WHERE number LIKE ?1", params![pattern])?
            }
        };
        log::debug!("Deleted {} call rows", deleted);
        Ok(deleted)
    }

    fn mark_missed_as_seen(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE calls SET new = 0 WHERE type = ?1 AND new = 1",
            params![CallType::Missed.code()],
        )?;
        Ok(changed)
    }
}

impl Clone for SqliteCallLog {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// WAL journal, relaxed sync, in-memory temp store. Applied once per
/// connection before any statements run.
fn apply_tuned_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    // These two report the applied value back, so they are queried
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.query_row("PRAGMA wal_autocheckpoint = 1000", [], |_| Ok(()))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}
