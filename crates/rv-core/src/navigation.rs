//! Navigation detection
//!
//! Two raw signals come in from the page: a teardown event right before the
//! page is discarded, and DOM mutation batches that stand in for
//! single-page-app route changes. Both are normalized here into a single
//! "navigated" event carrying the canonical (fragment-stripped) URL.

/// Strip the fragment component. `https://a/p#x` -> `https://a/p`.
pub fn canonical_url(raw: &str) -> &str {
    match raw.find('#') {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

/// Which page signal produced a navigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
    /// The page is about to be discarded or navigated away from; fires once
    /// and captures the outgoing URL.
    PageTeardown,
    /// A subtree/childList mutation batch. A heuristic proxy for SPA route
    /// changes: URL changes without any DOM mutation are missed, which is a
    /// known limitation of the signal, not of this watcher.
    DomMutation,
}

/// A confirmed navigation to a new canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub url: String,
    pub trigger: NavigationTrigger,
}

/// Deduplicates raw signals against the previously observed URL.
///
/// One instance per page context; the previous URL is instance state,
/// initially unset.
#[derive(Debug, Default)]
pub struct NavigationWatcher {
    previous_url: String,
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw signal. Returns an event iff the canonical URL differs
    /// from the stored previous URL; mutation batches additionally require
    /// a non-empty previous URL, so page-load churn before any confirmed
    /// navigation stays silent. The stored URL is updated whenever an
    /// event is raised.
    pub fn observe(&mut self, trigger: NavigationTrigger, raw_url: &str) -> Option<NavigationEvent> {
        let url = canonical_url(raw_url);

        if url == self.previous_url {
            return None;
        }
        if trigger == NavigationTrigger::DomMutation && self.previous_url.is_empty() {
            return None;
        }

        self.previous_url = url.to_string();
        Some(NavigationEvent {
            url: url.to_string(),
            trigger,
        })
    }

    /// The last URL an event was raised for; empty before the first event.
    pub fn previous_url(&self) -> &str {
        &self.previous_url
    }
}
