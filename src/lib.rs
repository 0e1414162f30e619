// src/lib.rs

//! Editing engine for fighting-game command notation.
//!
//! Keys held on a keyboard are sampled at a fixed tick rate and decoded into
//! notation tokens (`d df f 1`), which land in an editable buffer with a
//! caret, range selection, clipboard and undo history. [`CommandSession`]
//! ties the pieces together behind a message interface a UI host can drive.

pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod keys;
pub mod notation;
pub mod sampler;
pub mod session;
pub mod trace;

pub use buffer::{CommandBuffer, Selection};
pub use clipboard::{ClipboardCodec, TextCodec};
pub use config::Config;
pub use history::{HistoryManager, SaveTrigger};
pub use notation::Token;
pub use session::{CommandSession, SessionAction, SessionInput};
