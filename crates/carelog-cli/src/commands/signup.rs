//! Signup command - Create an account and seed its remote record

use anyhow::Result;
use clap::Args;

use crate::commands::build_stack;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SignupCommand {
    /// Account username
    pub username: String,

    /// Account password (at least 6 characters)
    #[arg(short, long)]
    pub password: String,

    /// Password confirmation
    #[arg(short, long)]
    pub confirm: String,
}

impl SignupCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        if !stack.probe_connectivity().await {
            formatter.error("Network unavailable. Check your connection and try again.");
            return Ok(());
        }

        match stack
            .sessions
            .sign_up(&self.username, &self.password, &self.confirm)
            .await
        {
            Ok(session) => {
                formatter.success(&format!(
                    "Account created for {} ({})",
                    self.username,
                    session.account_id()
                ));
                formatter.info("Default member seeded; start adding records");
                formatter.print_json(&serde_json::json!({
                    "accountId": session.account_id(),
                }));
            }
            Err(err) => formatter.error(&err.to_string()),
        }
        Ok(())
    }
}
