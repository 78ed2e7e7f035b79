//! Callflow Binary - Deduplicated Call History Dump
//!
//! Aggregates the call log, resolves caller identities against the contacts
//! directory, waits for the resolution queue to drain, and prints the result.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin callflow [-- --seed] [-- --json]
//! ```
//!
//! ## Environment Variables
//!
//! - CALLFLOW_DB_PATH - SQLite database path (default: data/callflow.db)
//! - CALLFLOW_VOICEMAIL_NUMBER - carrier voicemail number (optional)
//! - CALLFLOW_WORKER_START_DELAY_MS - worker start deferral (default: 1000)
//! - CALLFLOW_PHOTO_CACHE_CAPACITY - resident photo bound (default: 32)
//! - RUST_LOG - logging level (optional, default: info)

use callflow::config::RuntimeConfig;
use callflow::history_core::summary;
use callflow::history_core::{CallRecord, CallType};
use callflow::session::CallHistorySession;
use callflow::store::{CallLogSource, SqliteCallLog, SqliteContactDirectory};
use callflow::telephony::NumberClass;
use chrono::{Local, TimeZone};
use std::env;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = RuntimeConfig::from_env()?;
    let args: Vec<String> = env::args().collect();
    let as_json = args.contains(&"--json".to_string());
    let seed = args.contains(&"--seed".to_string());

    log::info!("🚀 Starting callflow");
    log::info!("   Database: {}", config.db_path.display());
    log::info!("   Worker start delay: {:?}", config.worker_start_delay);
    if let Some(vm) = &config.voicemail_number {
        log::info!("   Voicemail number: {}", vm);
    }

    let call_log = SqliteCallLog::new(&config.db_path)?;
    let directory = SqliteContactDirectory::new(&config.db_path)?;

    if seed {
        seed_demo_history(&call_log, &directory)?;
    }

    let mut session = CallHistorySession::new(
        Arc::new(call_log),
        Arc::new(directory),
        config.voicemail_number.clone(),
        config.worker_start_delay,
    );
    session.activate()?;
    log::info!("📋 {} aggregated entries", session.len());

    // Bind every row once so lookups get queued, then let the worker drain
    // and rebind with resolved identities
    let mut rows: Vec<_> = (0..session.len()).filter_map(|i| session.bind(i)).collect();
    if !rows.is_empty() {
        session.start_resolution_now();
        if session.wait_refresh(Duration::from_secs(5)) {
            rows = (0..session.len()).filter_map(|i| session.bind(i)).collect();
        } else {
            log::warn!("Resolution did not finish in time; showing degraded rows");
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let when = Local
                .timestamp_millis_opt(row.timestamp_ms)
                .single()
                .map(|t| t.format("%b %e, %H:%M").to_string())
                .unwrap_or_else(|| row.timestamp_ms.to_string());
            let who = match row.number_class {
                NumberClass::Regular | NumberClass::Voicemail => row
                    .name
                    .clone()
                    .unwrap_or_else(|| row.display_number.clone()),
                other => format!("{:?}", other),
            };
            let count = if row.occurrence_count > 1 {
                format!(" ({})", row.occurrence_count)
            } else {
                String::new()
            };
            println!("{:<8} {:<14} {}{}", row.call_type.as_str(), when, who, count);
        }
    }

    let totals = session.call_totals()?;
    log::info!(
        "📞 Incoming: {}",
        summary::format_minutes_seconds(totals.total_incoming_secs)
    );
    log::info!(
        "📞 Outgoing: {}",
        summary::format_minutes_seconds(totals.total_outgoing_secs)
    );

    session.deactivate();
    Ok(())
}

/// Populate an empty database with a small history worth looking at.
fn seed_demo_history(
    call_log: &SqliteCallLog,
    directory: &SqliteContactDirectory,
) -> Result<(), Box<dyn std::error::Error>> {
    if !call_log.recent_calls()?.is_empty() {
        log::info!("Database already has calls; skipping seed");
        return Ok(());
    }

    directory.add_contact("Alice Tan", "+6591234567", 2, Some("mobile"))?;
    directory.add_contact("Bob Lee", "5559876543", 1, Some("home"))?;

    let now = chrono::Utc::now().timestamp_millis();
    let calls = [
        ("91234567", now - 3_600_000, 240, CallType::Incoming),
        ("+6591234567", now - 7_200_000, 0, CallType::Missed),
        ("0891234567", now - 86_400_000, 95, CallType::Outgoing),
        ("5559876543", now - 90_000_000, 310, CallType::Incoming),
        ("-2", now - 100_000_000, 0, CallType::Missed),
    ];

    for (number, timestamp_ms, duration_secs, call_type) in calls {
        call_log.log_call(&CallRecord {
            id: 0,
            number: number.to_string(),
            timestamp_ms,
            duration_secs,
            call_type,
            cached_name: None,
            cached_number_type: 0,
            cached_number_label: None,
        })?;
    }

    log::info!("🌱 Seeded demo call history");
    Ok(())
}
