//! Sync command - Run the startup sequence and push a full snapshot now
//!
//! The manual "sync now" path: unlike the debounced background push, its
//! failures are surfaced to the user.

use anyhow::Result;
use clap::Args;

use carelog_sync::engine::{PushOutcome, SkipReason};
use carelog_sync::gate::StartupOutcome;

use crate::commands::build_stack;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        match stack.bootstrap().run().await? {
            StartupOutcome::Offline => {
                formatter.error("Network unavailable. Check your connection and try again.");
                return Ok(());
            }
            StartupOutcome::MustRelogin => {
                formatter.error("Client was upgraded; run 'carelog login' again.");
                return Ok(());
            }
            StartupOutcome::SignedOut => {
                formatter.error("Not signed in. Run 'carelog login' first.");
                return Ok(());
            }
            StartupOutcome::Ready { account_id } => {
                match stack.engine.push_snapshot().await {
                    Ok(PushOutcome::Completed) => {
                        let synced_at = stack
                            .engine
                            .last_synced_at()
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_default();
                        formatter.success(&format!("Synced {}", account_id));
                        formatter.info(&format!("last synced at {synced_at}"));
                        formatter.print_json(&serde_json::json!({
                            "accountId": account_id,
                            "status": stack.engine.status(),
                            "lastSyncedAt": synced_at,
                        }));
                    }
                    Ok(PushOutcome::Skipped(SkipReason::PushInFlight)) => {
                        formatter.info("A sync is already running");
                    }
                    Ok(PushOutcome::Skipped(reason)) => {
                        formatter.error(&format!("Sync skipped: {reason:?}"));
                    }
                    Err(err) => formatter.error(&err.to_string()),
                }
            }
        }
        Ok(())
    }
}
