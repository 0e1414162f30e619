// src/session/action.rs

//! Inputs and outputs of a composing session.
//!
//! ```text
//! Host key / timer / clipboard events
//!       ↓
//! [SessionInput]
//!       ↓
//! CommandSession::process()
//!       ↓
//! [SessionAction, ...] (output)
//!       ↓
//! Host (write clipboard, read clipboard)
//! ```
//!
//! # Contract Model
//!
//! The session never touches the system clipboard or a clock on its own.
//! Everything time or platform dependent arrives as an input, and every
//! effect it needs from the outside world leaves as an action.

use std::time::Instant;

use crate::keys::{KeyCode, KeyEvent};

// --- Session Inputs ---

/// Everything a host feeds into [`super::CommandSession::process`].
#[derive(Debug)]
pub enum SessionInput {
    /// A key went down.
    ///
    /// # Contract
    ///
    /// **Session**:
    /// - Adds `code` to the held-key set (always, even in text-entry mode)
    /// - Runs the discrete router for editing shortcuts and notation marks,
    ///   unless text entry is active or the key belongs to the key mapping
    ///
    /// **Postcondition**: the held set contains the key; the buffer may have
    /// changed; copy/cut/paste shortcuts yield actions.
    KeyDown(KeyEvent),

    /// A key went up. Only the held-key set changes.
    KeyUp(KeyCode),

    /// A frame timer fired.
    ///
    /// # Contract
    ///
    /// **Precondition**: the host calls this at (roughly) the configured
    /// tick rate. Calls arriving sooner than one tick interval after the
    /// last accepted tick are ignored.
    ///
    /// **Session**: decodes the held keys into at most one direction, one
    /// button set and one special, then commits them at the caret.
    Tick(Instant),

    /// The host finished reading the clipboard after a
    /// [`SessionAction::RequestClipboardContent`].
    ///
    /// # Contract
    ///
    /// **Session**:
    /// - On `Ok`, parses the text and inserts it at the caret or selection as
    ///   they are *now*, not as they were when the read was requested
    /// - On `Err`, logs a warning and leaves the buffer alone
    PasteText(anyhow::Result<String>),
}

// --- Session Actions ---

/// Effects the host must carry out for the session.
///
/// # Contract
///
/// **Host** must execute actions in the order returned and report clipboard
/// reads back through [`SessionInput::PasteText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Put the serialized selection on the system clipboard.
    CopyToClipboard(String),

    /// Read the system clipboard and answer with `SessionInput::PasteText`.
    RequestClipboardContent,
}
