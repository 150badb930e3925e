use chrono::{DateTime, Utc};
use lims_core::entities::LogRecord;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::EntityArgs;
use crate::context::AppContext;
use crate::output::output;

/// One record without its pre-image.
#[derive(Debug, Serialize)]
struct LogEntry {
    timestamp: DateTime<Utc>,
    action: String,
    account: String,
    comment: Option<String>,
}

impl From<LogRecord> for LogEntry {
    fn from(record: LogRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            action: record.action,
            account: record.account,
            comment: record.comment,
        }
    }
}

#[derive(Debug, Serialize)]
struct LogResponse {
    log: Vec<LogEntry>,
}

/// Handle `lims log`.
pub async fn handle(args: &EntityArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let records = ctx
        .service
        .log_for(&ctx.actor, args.entity, &args.name)
        .await?;
    let log = records.into_iter().map(LogEntry::from).collect();
    output(&LogResponse { log }, flags.format)
}
