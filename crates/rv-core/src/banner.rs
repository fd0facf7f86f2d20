//! Last-visited banner state machine
//!
//! The banner is a spacer div plus a centered text div prepended to the
//! document body. This module owns only the state transitions; the host
//! context applies the resulting [`BannerOp`] to its page surface.

/// DOM id of the text element holding the timestamp.
pub const BANNER_TEXT_ID: &str = "lastVisitedText";
/// DOM id of the spacer element above the page content.
pub const BANNER_SPACER_ID: &str = "paddingDiv";

/// Instruction for the host context's page surface.
///
/// Hosts locate the elements by the fixed ids above, so applying an op
/// twice reuses the same elements instead of duplicating them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerOp {
    /// Attach spacer + text elements showing `text`.
    Insert { text: String },
    /// Banner already attached; update only the text content.
    SetText { text: String },
    /// Detach both elements.
    Remove,
    /// Nothing to do.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BannerState {
    Absent,
    Present { text: String },
}

/// Two-state machine: banner absent, or present with a timestamp string.
#[derive(Debug)]
pub struct BannerRenderer {
    state: BannerState,
}

impl Default for BannerRenderer {
    fn default() -> Self {
        Self {
            state: BannerState::Absent,
        }
    }
}

impl BannerRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reflect the match result for the current URL.
    ///
    /// Matching pages get a banner showing `timestamp` (created or
    /// retexted as needed); non-matching pages get the banner removed.
    /// Idempotent in both directions.
    pub fn render(&mut self, matched: bool, timestamp: &str) -> BannerOp {
        match (&self.state, matched) {
            (BannerState::Absent, true) => {
                self.state = BannerState::Present {
                    text: timestamp.to_string(),
                };
                BannerOp::Insert {
                    text: timestamp.to_string(),
                }
            }
            (BannerState::Present { text }, true) => {
                if text == timestamp {
                    BannerOp::Keep
                } else {
                    self.state = BannerState::Present {
                        text: timestamp.to_string(),
                    };
                    BannerOp::SetText {
                        text: timestamp.to_string(),
                    }
                }
            }
            (BannerState::Present { .. }, false) => {
                self.state = BannerState::Absent;
                BannerOp::Remove
            }
            (BannerState::Absent, false) => BannerOp::Keep,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, BannerState::Present { .. })
    }
}
