//! Member command - Manage household members
//!
//! `member add` is the CLI's local-mutation path: it edits the store and
//! routes the change through the debounced auto-push pipeline, the same
//! way a long-lived UI host would. Dropping the notifier flushes the
//! pending change immediately, so a one-shot invocation does not sit out
//! the full quiet period.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};

use carelog_core::domain::member::Member;
use carelog_core::domain::status::SyncStatus;
use carelog_sync::scheduler::AutoSyncScheduler;

use crate::commands::{build_stack, AppStack};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct MemberCommand {
    #[command(subcommand)]
    action: MemberAction,
}

#[derive(Debug, Subcommand)]
pub enum MemberAction {
    /// Add a family member and sync
    Add {
        /// Display name
        name: String,
        /// Relation to the account holder
        #[arg(long, default_value = "family")]
        relation: String,
        /// UI accent color tag
        #[arg(long, default_value = "indigo")]
        color: String,
    },
    /// List members
    List,
}

impl MemberCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let stack = build_stack()?;

        match stack.bootstrap().run().await? {
            carelog_sync::gate::StartupOutcome::Ready { .. } => {}
            outcome => {
                formatter.error(&format!("Not ready to sync: {outcome:?}"));
                return Ok(());
            }
        }

        match &self.action {
            MemberAction::List => self.list(&stack, formatter.as_ref()),
            MemberAction::Add {
                name,
                relation,
                color,
            } => self.add(&stack, formatter.as_ref(), name, relation, color).await,
        }
    }

    fn list(&self, stack: &AppStack, formatter: &dyn OutputFormatter) -> Result<()> {
        let store = stack
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("local store lock poisoned"))?;
        let active = store.active_member().map(|m| m.id.clone());
        for member in store.members() {
            let marker = if Some(&member.id) == active.as_ref() {
                "*"
            } else {
                " "
            };
            formatter.info(&format!(
                "{marker} {}  ({}, {})",
                member.display_name, member.relation, member.color_tag
            ));
        }
        formatter.print_json(&serde_json::json!({
            "members": store.members(),
            "activeMemberId": active,
        }));
        Ok(())
    }

    async fn add(
        &self,
        stack: &AppStack,
        formatter: &dyn OutputFormatter,
        name: &str,
        relation: &str,
        color: &str,
    ) -> Result<()> {
        let member = Member::new(name, relation, color);
        let member_id = member.id.clone();
        {
            let mut store = stack
                .store
                .lock()
                .map_err(|_| anyhow::anyhow!("local store lock poisoned"))?;
            store.add_member(member);
        }

        // Route the mutation through the debounced auto-push pipeline.
        let (scheduler, notifier) = AutoSyncScheduler::new(
            stack.engine.clone(),
            Duration::from_secs(stack.config.sync.debounce_delay),
        );
        let handle = tokio::spawn(scheduler.run());
        notifier.notify();
        // Closing the channel flushes the pending change without waiting
        // out the quiet period.
        drop(notifier);
        handle.await?;

        match stack.engine.status() {
            SyncStatus::Synced => {
                formatter.success(&format!("Added {name} ({member_id})"));
                formatter.print_json(&serde_json::json!({
                    "memberId": member_id,
                    "status": stack.engine.status(),
                }));
            }
            status => {
                formatter.error(&format!(
                    "Member added locally, but sync ended in status '{status}'"
                ));
            }
        }
        Ok(())
    }
}
