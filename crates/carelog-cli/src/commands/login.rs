//! Login command - Authenticate and load the account's data

use anyhow::Result;
use clap::Args;

use crate::commands::build_stack;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account username
    pub username: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,
}

impl LoginCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        if !stack.probe_connectivity().await {
            formatter.error("Network unavailable. Check your connection and try again.");
            return Ok(());
        }

        match stack.sessions.log_in(&self.username, &self.password).await {
            Ok(session) => {
                formatter.success(&format!(
                    "Logged in as {} ({})",
                    self.username,
                    session.account_id()
                ));
                let store = stack
                    .store
                    .lock()
                    .map_err(|_| anyhow::anyhow!("local store lock poisoned"))?;
                formatter.info(&format!("{} member(s) loaded", store.members().len()));
                formatter.print_json(&serde_json::json!({
                    "accountId": session.account_id(),
                    "members": store.members().len(),
                }));
            }
            Err(err) => formatter.error(&err.to_string()),
        }
        Ok(())
    }
}
