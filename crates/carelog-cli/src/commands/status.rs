//! Status command - Show session, device, and connectivity state

use anyhow::Result;
use clap::Args;

use carelog_core::ports::state_store::keys;
use carelog_core::ports::{ICredentialStore, ILocalStateStore, IRemoteStore};

use crate::commands::build_stack;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        let online = stack.probe_connectivity().await;
        let device_id = stack.state_store.get(keys::DEVICE_ID)?.unwrap_or_default();
        let last_seen = stack
            .state_store
            .get(keys::LAST_SEEN_VERSION)?
            .unwrap_or_else(|| "never".to_string());
        let session = stack.credentials.load()?;

        formatter.info(&format!("backend:   {}", stack.config.remote.base_url));
        formatter.info(&format!("online:    {online}"));
        formatter.info(&format!("device:    {device_id}"));
        formatter.info(&format!("last seen: {last_seen}"));

        let mut session_state = "signed out".to_string();
        let mut account_id = None;
        if let Some(session) = &session {
            account_id = Some(session.account_id().clone());
            session_state = if online {
                // Deferred validity check: ask the backend about this session
                match stack.remote.current_account(session).await {
                    Ok(_) => "valid".to_string(),
                    Err(err) if err.is_auth() => "expired".to_string(),
                    Err(err) => format!("unknown ({err})"),
                }
            } else {
                "stored (offline, not validated)".to_string()
            };
            formatter.info(&format!(
                "account:   {} (session {session_state})",
                session.account_id()
            ));
        } else {
            formatter.info("account:   signed out");
        }

        formatter.print_json(&serde_json::json!({
            "backend": stack.config.remote.base_url,
            "online": online,
            "deviceId": device_id,
            "lastSeenVersion": last_seen,
            "accountId": account_id,
            "session": session_state,
        }));
        Ok(())
    }
}
