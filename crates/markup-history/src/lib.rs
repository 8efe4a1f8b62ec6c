#![warn(missing_docs)]
//! Markup History - Headless Undo/Redo Engine for Markup Text
//!
//! # Overview
//!
//! `markup-history` records every change a text widget reports and, on undo/redo, restores the
//! buffer to a meaningful prior state: the state before a whole word, a whole tag or a whole
//! element body was typed, instead of one keystroke at a time.
//!
//! It does not render or parse anything. The host provides a [`TextWidget`] (or uses the
//! bundled [`MarkupBuffer`]), and the engine only looks at raw characters near edit boundaries.
//!
//! # Core Features
//!
//! - **Batching**: rapid keystrokes of the same kind fold into one record
//! - **Boundary Reconciliation**: before an undo, history is rewritten so each step ends at a
//!   `<tag>` delimiter, whitespace or a newline
//! - **Linear History**: cursor-indexed log with a size bound and redo discard on new edits
//! - **Persistence**: save/restore through any key-value store, guarded by a content fingerprint
//! - **State Tracking**: version number and change notifications
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  HistoryManager (undo / redo / persistence) │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  BoundaryReconciler (find_boundary)         │  ← Step Shaping
//! ├─────────────────────────────────────────────┤
//! │  ChangeBatcher                              │  ← Keystroke Folding
//! ├─────────────────────────────────────────────┤
//! │  HistoryLog / EditRecord                    │  ← History Storage
//! ├─────────────────────────────────────────────┤
//! │  TextWidget (MarkupBuffer, Rope-based)      │  ← Text Ownership
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use markup_history::{HistoryConfig, HistoryManager, MarkupBuffer, MemoryStore, TextWidget};
//!
//! let mut manager = HistoryManager::with_config(
//!     MarkupBuffer::new("<p>aaaa</p>"),
//!     HistoryConfig::unbatched(),
//! );
//!
//! // Type a character inside the element
//! manager.edit(7, 7, "a").unwrap();
//! assert_eq!(manager.widget().text(), "<p>aaaaa</p>");
//!
//! // Save the history next to the document
//! let mut store = MemoryStore::new();
//! manager.store(&mut store, "doc");
//!
//! assert!(manager.undo());
//! assert_eq!(manager.widget().text(), "<p>aaaa</p>");
//! assert!(manager.redo());
//! assert_eq!(manager.widget().text(), "<p>aaaaa</p>");
//!
//! // The same buffer can pick its history back up
//! assert!(manager.restore(&store, "doc"));
//! assert!(manager.can_undo());
//! ```
//!
//! # Module Description
//!
//! - [`record`] - Edit records and their normalization
//! - [`log`] - Cursor-indexed history log
//! - [`batcher`] - Keystroke batching
//! - [`reconcile`] - Boundary-aware history reconciliation
//! - [`markup`] - Character classes and tag detection
//! - [`widget`] - Text widget boundary
//! - [`buffer`] - Rope-based reference widget
//! - [`persistence`] - Key-value save/restore
//! - [`state`] - State queries and change notifications
//! - [`engine`] - The undo/redo engine
//!
//! # Offsets
//!
//! All offsets and lengths are character offsets (Unicode scalar values).

pub mod batcher;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod log;
pub mod markup;
pub mod persistence;
pub mod reconcile;
pub mod record;
pub mod state;
mod text;
pub mod widget;

pub use batcher::{BatchOutcome, ChangeBatcher, Clock, system_clock};
pub use buffer::MarkupBuffer;
pub use config::{ConfigError, DEFAULT_BATCH_WINDOW_MS, HistoryConfig};
pub use engine::HistoryManager;
pub use log::HistoryLog;
pub use markup::{CharacterClass, has_markup_tags};
pub use persistence::{
    KeyValueStore, MemoryStore, RestoreError, RestoreOutcome, StoreValue, fingerprint,
    restore_history, store_history,
};
pub use reconcile::{BoundaryReconciler, ReconcileReport, find_boundary};
pub use record::{EditKind, EditRecord};
pub use state::{HistoryChange, HistoryChangeCallback, HistoryChangeKind, HistoryState};
pub use widget::{ApplyError, ChangeListener, TextWidget};
