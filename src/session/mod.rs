// src/session/mod.rs

//! One composing session: the command buffer plus everything that edits it.
//!
//! `CommandSession` owns the buffer, its undo history, the sampler's
//! cross-tick memory and the set of held keys. Hosts drive it either through
//! [`CommandSession::process`] (key, tick and clipboard messages) or through
//! the direct UI methods below, which are what the router itself calls.
//!
//! Every mutating method goes through the history first. Cursor and
//! selection changes call `mark_navigation`; content edits save with
//! [`SaveTrigger::ContentEdit`]; sampled tokens and notation marks save with
//! [`SaveTrigger::SampledInsert`].

use std::time::Instant;

use log::{debug, trace, warn};

use crate::buffer::{CommandBuffer, Selection, TokenLayout, VerticalMove};
use crate::clipboard::{ClipboardCodec, TextCodec};
use crate::config::Config;
use crate::history::{HistoryManager, SaveTrigger};
use crate::keys::HeldKeys;
use crate::notation::{Mark, Token};
use crate::sampler::{self, CommitOutcome, SamplerState};

mod action;
mod router;
mod text_entry;

pub use action::{SessionAction, SessionInput};
pub use text_entry::TextEntry;

pub struct CommandSession {
    buffer: CommandBuffer,
    history: HistoryManager,
    sampler: SamplerState,
    held: HeldKeys,
    config: Config,
    codec: Box<dyn ClipboardCodec>,
    layout: Option<TokenLayout>,
    text_entry: Option<TextEntry>,
}

impl CommandSession {
    /// Creates an empty session using the default text codec.
    pub fn new(config: Config) -> Self {
        Self::with_codec(config, Box::new(TextCodec))
    }

    pub fn with_codec(config: Config, codec: Box<dyn ClipboardCodec>) -> Self {
        debug!(
            "New session: history capacity {}, tick rate {} Hz",
            config.history.capacity, config.sampler.tick_rate_hz
        );
        Self {
            buffer: CommandBuffer::new(),
            history: HistoryManager::new(config.history.capacity),
            sampler: SamplerState::new(),
            held: HeldKeys::new(),
            config,
            codec,
            layout: None,
            text_entry: None,
        }
    }

    /// Applies one host message and returns the effects the host must run.
    pub fn process(&mut self, input: SessionInput) -> Vec<SessionAction> {
        match input {
            SessionInput::KeyDown(event) => {
                // Ctrl+A arrives as `KeyA`; the sampler must not read it as back.
                if !router::is_shortcut(&event) {
                    self.held.press(event.code.clone());
                }
                router::route_key(self, &event).into_iter().collect()
            }
            SessionInput::KeyUp(code) => {
                self.held.release(&code);
                Vec::new()
            }
            SessionInput::Tick(now) => {
                self.tick(now);
                Vec::new()
            }
            SessionInput::PasteText(result) => {
                self.paste_resolved(result);
                Vec::new()
            }
        }
    }

    // --- Read-only state ---

    pub fn tokens(&self) -> &[Token] {
        self.buffer.tokens()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.buffer.selection()
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn sampler_state(&self) -> &SamplerState {
        &self.sampler
    }

    pub fn held_keys(&self) -> &HeldKeys {
        &self.held
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &dyn ClipboardCodec {
        self.codec.as_ref()
    }

    /// The buffer in clipboard text form.
    pub fn serialize(&self) -> String {
        self.codec.serialize(self.buffer.tokens())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Sampling ---

    /// Runs one sampler tick against the held keys.
    ///
    /// In text-entry mode the tick only advances the gate; nothing is
    /// decoded, so keys typed into the draft never reach the buffer.
    pub fn tick(&mut self, now: Instant) -> CommitOutcome {
        if self.text_entry.is_some() {
            self.sampler
                .gate
                .accept(now, self.config.sampler.tick_interval());
            trace!("Text entry active, tick not decoded");
            return CommitOutcome::default();
        }

        let (next, frame) = sampler::sample(
            &self.sampler,
            &self.held,
            &self.config.keymap,
            &self.config.sampler,
            now,
        );
        self.sampler = next;

        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            return CommitOutcome::default();
        };

        self.history.try_save(SaveTrigger::SampledInsert, &self.buffer);
        sampler::commit(
            &frame,
            &mut self.sampler,
            &mut self.buffer,
            &self.config.sampler,
            now,
        )
    }

    // --- Cursor and selection ---

    /// Moves the caret (clamped). The selection is left as it is; callers
    /// that want it gone clear it themselves.
    pub fn set_cursor(&mut self, index: usize) {
        self.buffer.set_cursor(index);
        self.history.mark_navigation();
    }

    /// Replaces the selection (clamped). The caret does not move.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.buffer.set_selection(selection);
        self.history.mark_navigation();
    }

    /// A click between tokens: drops the selection and places the caret.
    pub fn click_at(&mut self, index: usize) {
        self.buffer.clear_selection();
        self.set_cursor(index);
    }

    pub fn clear_selection(&mut self) {
        self.buffer.clear_selection();
        self.history.mark_navigation();
    }

    pub fn select_all(&mut self) {
        self.buffer.select_all();
        self.history.mark_navigation();
    }

    pub fn move_horizontal(&mut self, delta: isize, extend: bool) {
        self.buffer.move_horizontal(delta, extend);
        self.history.mark_navigation();
    }

    pub fn move_vertical(&mut self, movement: VerticalMove, extend: bool) {
        self.buffer.move_vertical(
            movement,
            self.layout.as_ref(),
            &self.config.layout,
            extend,
        );
        self.history.mark_navigation();
    }

    /// Jumps the caret to `target`, as Home and End do.
    pub fn move_to(&mut self, target: usize, extend: bool) {
        self.buffer.move_to(target, extend);
        self.history.mark_navigation();
    }

    /// Supplies the on-screen token rectangles used for Up/Down. `None`
    /// falls back to a fixed number of tokens per row.
    pub fn set_layout(&mut self, layout: Option<TokenLayout>) {
        self.layout = layout;
    }

    // --- Editing ---

    /// Inserts a token at the caret, replacing the selection if there is one.
    ///
    /// Text and line breaks count as content edits; every other token is
    /// saved like a sampled insert.
    pub fn insert_at_cursor_or_selection(&mut self, token: Token) {
        let trigger = match token {
            Token::Text(_) | Token::Notation(Mark::LineBreak) => SaveTrigger::ContentEdit,
            _ => SaveTrigger::SampledInsert,
        };
        self.history.try_save(trigger, &self.buffer);
        self.buffer.insert_at_cursor_or_selection(token);
    }

    pub fn insert_mark(&mut self, mark: Mark) {
        self.insert_at_cursor_or_selection(Token::Notation(mark));
    }

    pub fn insert_line_break(&mut self) {
        self.insert_mark(Mark::LineBreak);
    }

    /// Backspace. Saves history only when something is actually removed.
    pub fn delete_backward(&mut self) -> bool {
        if !self.buffer.can_delete_backward() {
            return false;
        }
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        self.buffer.delete_backward()
    }

    /// Forward delete. Saves history only when something is actually removed.
    pub fn delete_forward(&mut self) -> bool {
        if !self.buffer.can_delete_forward() {
            return false;
        }
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        self.buffer.delete_forward()
    }

    /// Empties the buffer as one undoable edit.
    pub fn clear(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        self.buffer.clear();
    }

    /// Starts a new composition: empty buffer, empty history, no draft.
    pub fn reset(&mut self) {
        self.buffer = CommandBuffer::new();
        self.history.reset();
        self.text_entry = None;
        self.sampler.last_heat_at = None;
        debug!("Session reset");
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.buffer)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.buffer)
    }

    // --- Clipboard ---

    /// The selection in clipboard form, or `None` without a selection.
    pub fn copy(&self) -> Option<String> {
        self.buffer
            .selection()
            .map(|_| self.codec.serialize(self.buffer.selected_tokens()))
    }

    /// Copies the selection and deletes it as one undoable edit.
    pub fn cut(&mut self) -> Option<String> {
        let text = self.copy()?;
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        self.buffer.delete_selection();
        Some(text)
    }

    /// Applies a finished clipboard read at the current caret or selection.
    pub fn paste_resolved(&mut self, result: anyhow::Result<String>) {
        let text = match result {
            Ok(text) => text,
            Err(err) => {
                warn!("Clipboard read failed, ignoring paste: {:#}", err);
                return;
            }
        };
        let tokens = self.codec.parse(&text);
        if tokens.is_empty() {
            debug!("Paste produced no tokens, ignoring");
            return;
        }
        debug!("Pasting {} tokens at {}", tokens.len(), self.buffer.cursor());
        self.history.try_save(SaveTrigger::ContentEdit, &self.buffer);
        self.buffer.insert_tokens_at_cursor_or_selection(tokens);
    }
}

#[cfg(test)]
mod tests;
