// src/session/text_entry.rs

//! Free-text annotations.
//!
//! While a draft is open the router and the sampler stand down and the host
//! owns the keyboard. Closing the draft commits it as a single `Text` token.

use super::CommandSession;
use crate::history::SaveTrigger;
use crate::notation::Token;
use log::debug;

/// An open text draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEntry {
    draft: String,
    /// Index of the `Text` token being edited, if this is not a new one.
    target: Option<usize>,
}

impl TextEntry {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }
}

impl CommandSession {
    pub fn is_text_mode(&self) -> bool {
        self.text_entry.is_some()
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text_entry.as_ref()
    }

    /// Opens an empty draft for a new text token. An already open draft is
    /// kept.
    pub fn enter_text_mode(&mut self) {
        if self.text_entry.is_none() {
            debug!("Entering text mode");
            self.text_entry = Some(TextEntry::default());
        }
    }

    /// Opens a draft seeded with the text token at `index`. Returns false if
    /// there is no text token there.
    pub fn edit_text_at(&mut self, index: usize) -> bool {
        let Some(Token::Text(text)) = self.buffer.get(index) else {
            return false;
        };
        debug!("Editing text token at {}", index);
        self.text_entry = Some(TextEntry {
            draft: text.clone(),
            target: Some(index),
        });
        true
    }

    /// Replaces the draft. Ignored outside text mode.
    pub fn update_text_draft(&mut self, draft: &str) {
        if let Some(entry) = self.text_entry.as_mut() {
            entry.draft.clear();
            entry.draft.push_str(draft);
        }
    }

    /// Closes the draft and writes it to the buffer. A blank draft leaves
    /// the buffer untouched, including the token being edited. Returns
    /// whether the buffer changed.
    pub fn commit_text(&mut self) -> bool {
        let Some(entry) = self.text_entry.take() else {
            return false;
        };
        let text = entry.draft.trim();
        if text.is_empty() {
            debug!("Blank text draft discarded");
            return false;
        }

        let token = Token::Text(text.to_string());
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        match entry.target {
            Some(index) if matches!(self.buffer.get(index), Some(Token::Text(_))) => {
                self.buffer.replace_at(index, token);
            }
            _ => self.buffer.insert_at_cursor_or_selection(token),
        }
        true
    }

    /// The mode toggle: leaving text mode commits the draft.
    pub fn exit_text_mode(&mut self) -> bool {
        self.commit_text()
    }

    /// Leaves text mode without touching the buffer.
    pub fn cancel_text_mode(&mut self) {
        if self.text_entry.take().is_some() {
            debug!("Text draft cancelled");
        }
    }
}
