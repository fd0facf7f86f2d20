//! Cross-context message protocol
//!
//! The settings UI and the page tracker live in different extension
//! contexts and talk through the runtime message transport. Payloads are
//! tagged on a `command` field; the enums here are the whole protocol, so
//! dispatch is an exhaustive match instead of string inspection.
//!
//! With the `ts` feature the types export TypeScript definitions for the
//! extension's JS glue (`rv-cli export-types`).

use serde::{Deserialize, Serialize};

/// Commands the settings UI sends to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "command")]
pub enum Command {
    /// Replace the persisted whitelist and refresh the banner.
    #[serde(rename = "saveWhitelist")]
    SaveWhitelist { filters: Vec<String> },

    /// Prune the visit history against the persisted whitelist and refresh
    /// the banner.
    #[serde(rename = "cleanupVisitHistory")]
    CleanupVisitHistory,
}

/// Completion acknowledgements the tracker sends back to the UI, which
/// shows the status text and re-enables its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "command")]
pub enum Ack {
    #[serde(rename = "saveWhitelistComplete")]
    SaveWhitelistComplete {
        #[serde(rename = "messageText")]
        message_text: String,
    },

    #[serde(rename = "cleanHistoryComplete")]
    CleanHistoryComplete {
        #[serde(rename = "messageText")]
        message_text: String,
    },
}

impl Ack {
    pub fn message_text(&self) -> &str {
        match self {
            Ack::SaveWhitelistComplete { message_text } => message_text,
            Ack::CleanHistoryComplete { message_text } => message_text,
        }
    }
}
