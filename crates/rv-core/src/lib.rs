//! Revisit Core Library
//!
//! This crate provides the core tracking engine for the Revisit extension:
//! a whitelist-filtered visit history that records when a matching page was
//! last seen and drives an on-page banner showing that timestamp.
//!
//! # Architecture
//!
//! The engine is pure logic over a small async [`storage::Storage`]
//! boundary. Host contexts (the wasm content script, the CLI) supply the
//! storage backend, feed navigation signals in, and apply the resulting
//! banner operations to their page surface.
//!
//! # Modules
//!
//! - `filter`: whitelist pattern validation and the combined URL matcher
//! - `history`: the persisted URL -> last-visit mapping and its lifecycle
//! - `navigation`: normalized navigation detection (teardown + SPA routes)
//! - `banner`: the two-state banner machine and its DOM operations
//! - `message`: the cross-context command/acknowledgement wire types
//! - `storage`: the persisted key-value store boundary
//! - `tracker`: per-page orchestrator tying the pieces together

pub mod banner;
pub mod filter;
pub mod history;
pub mod message;
pub mod navigation;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use banner::{BannerOp, BannerRenderer, BANNER_SPACER_ID, BANNER_TEXT_ID};
pub use filter::{Matcher, PatternValidation};
pub use history::{CleanupStats, Clock, HistoryStore, SystemClock, VisitHistory, NEVER};
pub use message::{Ack, Command};
pub use navigation::{NavigationEvent, NavigationTrigger, NavigationWatcher};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use tracker::{DispatchOutcome, Tracker};
