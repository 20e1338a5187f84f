//! The statistics engine: owns every group's aggregate, applies updates,
//! schedules flushes and answers report queries.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zapbot_core::{config::StatsConfig, error::ZapError, shellexpand};

use crate::extract::is_command;
use crate::model::GroupStats;
use crate::report;
use crate::store::SnapshotStore;

/// In-memory statistics for every group the bot has seen.
///
/// Cheap to clone; clones share the same state. Counter updates happen
/// synchronously under one lock and never await, so a message is folded
/// atomically. Persistence runs in spawned tasks outside the lock.
#[derive(Clone)]
pub struct StatsEngine {
    groups: Arc<Mutex<HashMap<String, GroupStats>>>,
    store: SnapshotStore,
    flush_every: u64,
}

impl StatsEngine {
    /// Empty engine writing to `store`. `flush_every == 0` disables the
    /// per-message flush (periodic and shutdown saves still run).
    pub fn new(store: SnapshotStore, flush_every: u64) -> Self {
        Self {
            groups: Arc::new(Mutex::new(HashMap::new())),
            store,
            flush_every,
        }
    }

    /// Open the engine on the configured data directory, loading every
    /// existing snapshot. The directory is created if absent.
    ///
    /// Storage failures are logged and the engine starts empty; later
    /// flushes retry the writes.
    pub async fn open(config: &StatsConfig) -> Self {
        let store = SnapshotStore::new(shellexpand(&config.data_dir));
        if let Err(e) = store.ensure_dir().await {
            error!(
                "stats: cannot create {}: {e}; continuing without stored data",
                store.dir().display()
            );
        }
        let groups = match store.load_all().await {
            Ok(groups) => groups,
            Err(e) => {
                error!(
                    "stats: cannot read {}: {e}; starting with empty statistics",
                    store.dir().display()
                );
                HashMap::new()
            }
        };

        let engine = Self::new(store, config.flush_every);
        *engine.lock() = groups;
        engine
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, GroupStats>> {
        self.groups.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a plain group message observed now.
    ///
    /// See [`StatsEngine::record_message_at`].
    pub fn record_message(
        &self,
        group_id: &str,
        user_id: &str,
        user_name: &str,
        text: &str,
        group_name: &str,
    ) -> Option<JoinHandle<()>> {
        self.record_message_at(group_id, user_id, user_name, text, group_name, Utc::now())
    }

    /// Fold one message into the group's statistics.
    ///
    /// Commands (`/…`, `!…`) are ignored without touching any state. Every
    /// `flush_every`-th message of a group schedules a background flush of
    /// that group; its handle is returned and may be dropped. Flush errors
    /// are logged inside the task.
    pub fn record_message_at(
        &self,
        group_id: &str,
        user_id: &str,
        user_name: &str,
        text: &str,
        group_name: &str,
        now: DateTime<Utc>,
    ) -> Option<JoinHandle<()>> {
        if is_command(text) {
            return None;
        }

        let snapshot = {
            let mut groups = self.lock();
            let stats = groups
                .entry(group_id.to_string())
                .or_insert_with(|| GroupStats::new(group_name, now));
            stats.fold(user_id, user_name, text, group_name, now);

            let due = self.flush_every > 0 && stats.total_messages % self.flush_every == 0;
            due.then(|| stats.clone())
        };

        snapshot.and_then(|stats| self.spawn_flush(group_id, stats))
    }

    fn spawn_flush(&self, group_id: &str, stats: GroupStats) -> Option<JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("stats: no async runtime, skipping flush of {group_id}");
            return None;
        };

        let store = self.store.clone();
        let group_id = group_id.to_string();
        Some(handle.spawn(async move {
            match store.save(&group_id, &stats).await {
                Ok(()) => debug!(
                    "stats: flushed {group_id} at {} messages",
                    stats.total_messages
                ),
                Err(e) => error!("stats: failed to flush {group_id}: {e}"),
            }
        }))
    }

    /// Write one group's current snapshot and wait for it.
    pub async fn save_group(&self, group_id: &str) -> Result<(), ZapError> {
        let snapshot = self.snapshot(group_id);
        match snapshot {
            Some(stats) => self.store.save(group_id, &stats).await,
            None => Ok(()),
        }
    }

    /// Flush every group concurrently and wait for all of them.
    ///
    /// A failing group is logged and does not stop the others. Returns the
    /// number of groups saved successfully.
    pub async fn save_all(&self) -> usize {
        let snapshots: Vec<(String, GroupStats)> = self
            .lock()
            .iter()
            .map(|(id, stats)| (id.clone(), stats.clone()))
            .collect();
        let total = snapshots.len();

        let results = join_all(snapshots.into_iter().map(|(group_id, stats)| {
            let store = self.store.clone();
            async move {
                let result = store.save(&group_id, &stats).await;
                if let Err(ref e) = result {
                    error!("stats: failed to save {group_id}: {e}");
                }
                result.is_ok()
            }
        }))
        .await;

        let saved = results.into_iter().filter(|ok| *ok).count();
        info!("stats: saved {saved}/{total} group(s)");
        saved
    }

    /// Copy of one group's statistics.
    pub fn snapshot(&self, group_id: &str) -> Option<GroupStats> {
        self.lock().get(group_id).cloned()
    }

    /// Ids of every known group, sorted.
    pub fn group_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn group_count(&self) -> usize {
        self.lock().len()
    }

    /// Overview: participants, totals, top users and words, peak hour.
    pub fn general_report(&self, group_id: &str) -> String {
        match self.lock().get(group_id) {
            Some(stats) => report::general(stats),
            None => report::NO_GROUP_DATA.to_string(),
        }
    }

    /// One user's rank and activity inside a group.
    pub fn user_report(&self, group_id: &str, user_id: &str) -> String {
        match self.lock().get(group_id) {
            Some(stats) => report::user(stats, user_id),
            None => report::NO_USER_DATA.to_string(),
        }
    }

    /// Top 10 users with their share of all messages.
    pub fn ranking_report(&self, group_id: &str) -> String {
        match self.lock().get(group_id) {
            Some(stats) => report::ranking(stats),
            None => report::NO_DATA.to_string(),
        }
    }

    /// Busiest hours, last seven days and favourite emojis.
    pub fn activity_report(&self, group_id: &str) -> String {
        match self.lock().get(group_id) {
            Some(stats) => report::activity(stats),
            None => report::NO_DATA.to_string(),
        }
    }

    /// Top 20 words and the distinct-word count.
    pub fn word_report(&self, group_id: &str) -> String {
        match self.lock().get(group_id) {
            Some(stats) => report::words(stats),
            None => report::NO_DATA.to_string(),
        }
    }
}
