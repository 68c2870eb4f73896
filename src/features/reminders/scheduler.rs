//! Periodic reminder reconciliation and delivery
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Prune against the live channel set, delete-then-send delivery, per-tick eviction
//! - 1.0.0: Poll and deliver due reminders

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

use super::delivery_text;
use crate::database::{Database, TIMESTAMP_FORMAT};
use crate::features::conversation::ConversationStore;
use crate::gateway::ChannelDirectory;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub unscheduled_removed: usize,
    pub pruned: usize,
    pub delivered: usize,
    /// Due reminders removed without a send (channel gone or unreadable due time)
    pub abandoned: usize,
    pub failed_sends: usize,
    pub evicted: usize,
    pub pruning_skipped: bool,
}

pub struct ReminderScheduler {
    database: Database,
    conversations: ConversationStore,
    period: Duration,
    tick_lock: Mutex<()>,
}

impl ReminderScheduler {
    pub fn new(database: Database, conversations: ConversationStore, period: Duration) -> Self {
        Self {
            database,
            conversations,
            period,
            tick_lock: Mutex::new(()),
        }
    }

    /// Tick forever. A failed or panicking tick is logged and the next one still runs.
    pub async fn run(self: Arc<Self>, directory: Arc<dyn ChannelDirectory>) {
        info!("⏰ Reminder scheduler started (every {}s)", self.period.as_secs());
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let scheduler = Arc::clone(&self);
            let directory = Arc::clone(&directory);
            let tick = tokio::spawn(async move { scheduler.run_tick(directory.as_ref(), Utc::now()).await });

            match tick.await {
                Ok(Ok(report)) => debug!("Reminder tick: {report:?}"),
                Ok(Err(e)) => error!("Reminder tick failed: {e:#}"),
                Err(e) => error!("Reminder tick panicked: {e}"),
            }
        }
    }

    /// One reconciliation pass as of `now`
    pub async fn run_tick(&self, directory: &dyn ChannelDirectory, now: DateTime<Utc>) -> Result<TickReport> {
        let _guard = self.tick_lock.lock().await;
        let mut report = TickReport {
            unscheduled_removed: self.database.delete_unscheduled_reminders().await?,
            ..TickReport::default()
        };

        let live = directory.live_channel_names();
        if live.is_empty() {
            // Cache not populated yet
            report.pruning_skipped = true;
        } else {
            report.pruned = self.database.prune_reminders_outside(&live).await?;
        }

        for reminder in self.database.scheduled_reminders().await? {
            let due_at = match parse_due_at(&reminder.due_at) {
                Some(due_at) => due_at,
                None => {
                    warn!("Reminder #{} has unreadable due time '{}', discarding", reminder.id, reminder.due_at);
                    if self.database.delete_reminder(reminder.id).await? {
                        report.abandoned += 1;
                    }
                    continue;
                }
            };
            if due_at > now {
                continue;
            }

            // Claim first; a concurrent clear wins and nothing is sent
            if !self.database.delete_reminder(reminder.id).await? {
                continue;
            }

            let Some(channel) = directory.resolve_channel(&reminder.channel_id) else {
                warn!(
                    "Channel {} (#{}) not found for reminder #{}, dropping it",
                    reminder.channel_id, reminder.channel_name, reminder.id
                );
                report.abandoned += 1;
                continue;
            };

            match directory.send_to_channel(&channel, &delivery_text(&reminder)).await {
                Ok(()) => {
                    info!("🔔 Delivered reminder #{} to {} in #{}", reminder.id, reminder.owner, channel.name);
                    report.delivered += 1;
                }
                Err(e) => {
                    error!("Failed to deliver reminder #{} to #{}: {e}", reminder.id, channel.name);
                    report.failed_sends += 1;
                }
            }
        }

        match self.conversations.evict_if_over_capacity().await {
            Ok(evicted) => report.evicted = evicted,
            Err(e) => error!("Conversation eviction failed: {e:#}"),
        }

        Ok(report)
    }
}

fn parse_due_at(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
