//! Logout command - Clear the session and local state
//!
//! Works offline: only local state is touched. Unsynced local edits are
//! lost; `carelog sync` first if they should survive.

use anyhow::Result;
use clap::Args;

use crate::commands::build_stack;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        match stack.sessions.restore_session()? {
            None => {
                formatter.info("Not signed in");
            }
            Some(session) => {
                stack.sessions.log_out()?;
                formatter.success(&format!("Signed out of {}", session.account_id()));
            }
        }
        Ok(())
    }
}
