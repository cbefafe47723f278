//! JSON report of a run.
//!
//! Written only when `--report` is given. The file holds the run date, the
//! published posts, and every failure with the stage it happened in:
//!
//! ```text
//! {
//!   "generated_at": "2025-05-06T08:15:00Z",
//!   "total": 25,
//!   "published": [{"id": "...", "title": "...", "slug": "...", "category_id": "..."}],
//!   "failures": [{"headline": "...", "stage": "generation", "error": "..."}]
//! }
//! ```

use crate::pipeline::RunSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Serialize `summary` to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), Box<dyn Error>> {
    let report = Report {
        generated_at: Utc::now(),
        summary,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create report dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote run report");
    Ok(())
}
