//! Persisted visit history and its read-modify-write lifecycle
//!
//! The history maps canonical (fragment-stripped) URLs to the timestamp of
//! their last recorded visit. Entries appear lazily on first visit, are
//! overwritten on every later visit, and only ever disappear through an
//! explicit cleanup against the current whitelist.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::Matcher;
use crate::storage::{Storage, StorageError};

/// Sentinel timestamp: no confirmed prior visit existed at read time.
pub const NEVER: &str = "Never";

/// Source of visit timestamps.
///
/// A seam rather than a direct `Utc::now()` call so the history lifecycle
/// is testable with a controlled clock.
pub trait Clock {
    fn now(&self) -> String;
}

/// Wall-clock timestamps as RFC 3339 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// The URL -> last-visit-timestamp mapping, as stored under `visitHistory`.
///
/// Insertion-ordered: the stored object keeps keys in first-visit order
/// across round trips, the same way the host storage does, so a write-back
/// never reshuffles what another context reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitHistory {
    entries: IndexMap<String, String>,
}

impl VisitHistory {
    pub fn from_entries(entries: IndexMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    pub fn set(&mut self, url: impl Into<String>, timestamp: impl Into<String>) {
        self.entries.insert(url.into(), timestamp.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep exactly the entries whose URL the matcher accepts.
    fn retain_matching(&mut self, matcher: &Matcher) {
        self.entries.retain(|url, _| matcher.is_match(url));
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub kept: usize,
    pub removed: usize,
}

/// Sole mutator of the persisted visit history.
///
/// Every operation is a full read of the `visitHistory` value, a local
/// transform, and a full write-back; overlapping operations can interleave
/// (see the note on [`Storage`]).
pub struct HistoryStore<'a, S, C> {
    storage: &'a S,
    clock: &'a C,
}

impl<'a, S: Storage, C: Clock> HistoryStore<'a, S, C> {
    pub fn new(storage: &'a S, clock: &'a C) -> Self {
        Self { storage, clock }
    }

    /// Read the last-visit timestamp for `url`.
    ///
    /// An existing entry is returned unchanged, with no write. When absent,
    /// the caller gets [`NEVER`] while a fresh entry stamped with the
    /// current time is persisted in the same call: the caller-visible
    /// result and the stored state intentionally diverge on first visit.
    /// (Inherited behavior, kept as-is; see DESIGN.md.)
    pub async fn get_or_create(&self, url: &str) -> Result<String, StorageError> {
        let mut history = self.storage.load_history().await?.unwrap_or_default();

        if let Some(existing) = history.get(url) {
            return Ok(existing.to_string());
        }

        history.set(url, self.clock.now());
        self.storage.store_history(&history).await?;
        Ok(NEVER.to_string())
    }

    /// Overwrite the entry for `url` with the current time, creating it if
    /// needed. Returns the new timestamp. Does not consult the whitelist.
    pub async fn update(&self, url: &str) -> Result<String, StorageError> {
        let mut history = self.storage.load_history().await?.unwrap_or_default();
        let now = self.clock.now();
        history.set(url, now.clone());
        self.storage.store_history(&history).await?;
        Ok(now)
    }

    /// Prune every entry whose URL no longer matches the whitelist.
    ///
    /// An empty compiled set (no patterns, or none valid) deletes the whole
    /// history and reinitializes it empty. Otherwise the retained subset is
    /// written back as a full replacement.
    pub async fn cleanup(&self, filters: &[String]) -> Result<CleanupStats, StorageError> {
        let matcher = Matcher::compile(filters);

        if matcher.is_empty() {
            let removed = self
                .storage
                .load_history()
                .await?
                .map_or(0, |history| history.len());
            self.storage.remove_history().await?;
            self.storage.store_history(&VisitHistory::default()).await?;
            log::debug!("cleanup: empty whitelist, dropped {removed} entries");
            return Ok(CleanupStats { kept: 0, removed });
        }

        let mut history = self.storage.load_history().await?.unwrap_or_default();
        let before = history.len();
        history.retain_matching(&matcher);
        let stats = CleanupStats {
            kept: history.len(),
            removed: before - history.len(),
        };
        self.storage.store_history(&history).await?;
        log::debug!("cleanup: kept {} entries, removed {}", stats.kept, stats.removed);
        Ok(stats)
    }
}
