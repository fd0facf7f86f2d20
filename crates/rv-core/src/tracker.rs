//! Per-page orchestrator
//!
//! One tracker per page context. Navigation signals flow in, the whitelist
//! decides whether the page is tracked, the history store records the
//! visit, and the caller gets back the banner operation to apply.

use crate::banner::{BannerOp, BannerRenderer};
use crate::filter::Matcher;
use crate::history::{Clock, HistoryStore, SystemClock, VisitHistory};
use crate::message::{Ack, Command};
use crate::navigation::{canonical_url, NavigationTrigger, NavigationWatcher};
use crate::storage::{Storage, StorageError};

/// Result of routing one inbound command.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub ack: Ack,
    pub banner: BannerOp,
}

/// Ties watcher, whitelist, history, and banner together over one storage
/// backend.
pub struct Tracker<S, C = SystemClock> {
    storage: S,
    clock: C,
    watcher: NavigationWatcher,
    banner: BannerRenderer,
}

impl<S: Storage> Tracker<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> Tracker<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            watcher: NavigationWatcher::new(),
            banner: BannerRenderer::new(),
        }
    }

    fn history(&self) -> HistoryStore<'_, S, C> {
        HistoryStore::new(&self.storage, &self.clock)
    }

    /// Create the two persisted values on first use. Never clobbers
    /// existing data; safe to call before every operation.
    pub async fn ensure_initialized(&self) -> Result<(), StorageError> {
        if self.storage.load_history().await?.is_none() {
            self.storage.store_history(&VisitHistory::default()).await?;
        }
        if self.storage.load_filters().await?.is_none() {
            self.storage.store_filters(&[]).await?;
        }
        Ok(())
    }

    async fn load_whitelist(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.storage.load_filters().await?.unwrap_or_default())
    }

    /// Feed a raw navigation signal.
    ///
    /// Suppressed signals are a no-op. A confirmed navigation to a
    /// whitelisted URL shows the previous visit time (the history read
    /// happens before the visit is recorded, so the banner never shows the
    /// visit it is part of) and then records the new visit. Non-matching
    /// URLs get the banner removed.
    pub async fn handle_navigation(
        &mut self,
        trigger: NavigationTrigger,
        raw_url: &str,
    ) -> Result<BannerOp, StorageError> {
        let event = match self.watcher.observe(trigger, raw_url) {
            Some(event) => event,
            None => return Ok(BannerOp::Keep),
        };

        self.ensure_initialized().await?;
        let whitelist = self.load_whitelist().await?;
        let matcher = Matcher::compile(&whitelist);

        if matcher.is_match(&event.url) {
            let last_seen = self.history().get_or_create(&event.url).await?;
            let op = self.banner.render(true, &last_seen);
            self.history().update(&event.url).await?;
            Ok(op)
        } else {
            Ok(self.banner.render(false, ""))
        }
    }

    /// Recompute the banner for the current URL without recording a visit.
    pub async fn refresh_banner(&mut self, raw_url: &str) -> Result<BannerOp, StorageError> {
        let url = canonical_url(raw_url);
        let whitelist = self.load_whitelist().await?;
        let matcher = Matcher::compile(&whitelist);

        if matcher.is_match(url) {
            let last_seen = self.history().get_or_create(url).await?;
            Ok(self.banner.render(true, &last_seen))
        } else {
            Ok(self.banner.render(false, ""))
        }
    }

    /// Route one inbound command and produce its acknowledgement.
    ///
    /// `raw_url` is the page's current URL, needed for the banner refresh
    /// that follows both commands. Repeating a command with the same input
    /// reproduces the same end state.
    pub async fn dispatch(
        &mut self,
        command: Command,
        raw_url: &str,
    ) -> Result<DispatchOutcome, StorageError> {
        match command {
            Command::SaveWhitelist { filters } => {
                // Full replacement of the raw list; invalid patterns stay
                // visible in the editing UI and are only skipped at
                // compile time.
                self.storage.store_filters(&filters).await?;
                let banner = self.refresh_banner(raw_url).await?;
                Ok(DispatchOutcome {
                    ack: Ack::SaveWhitelistComplete {
                        message_text: "Whitelist saved.".to_string(),
                    },
                    banner,
                })
            }
            Command::CleanupVisitHistory => {
                self.ensure_initialized().await?;
                let whitelist = self.load_whitelist().await?;
                self.history().cleanup(&whitelist).await?;
                let banner = self.refresh_banner(raw_url).await?;
                Ok(DispatchOutcome {
                    ack: Ack::CleanHistoryComplete {
                        message_text: "History cleaned.".to_string(),
                    },
                    banner,
                })
            }
        }
    }
}
