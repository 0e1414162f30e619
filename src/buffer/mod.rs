// src/buffer/mod.rs

//! The editable token sequence.
//!
//! `CommandBuffer` is a flat list of tokens with a caret (`cursor`, a gap
//! index in `0..=len`) and an optional half-open selection. All index
//! arguments are clamped rather than rejected, so callers never have to
//! pre-validate positions coming from the UI.

use crate::notation::Token;
use log::trace;
use std::cmp::{max, min};

mod navigation;

pub use navigation::{TokenLayout, TokenRect, VerticalMove};

/// A half-open token range `[start, end)`. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Builds a normalized range from two caret positions, in either order.
    /// Returns `None` when they coincide.
    pub fn between(a: usize, b: usize) -> Option<Self> {
        (a != b).then(|| Selection {
            start: min(a, b),
            end: max(a, b),
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    /// Clamps both ends to `len`; collapses to `None` if nothing remains.
    pub fn clamped(self, len: usize) -> Option<Self> {
        let start = min(self.start, len);
        let end = min(self.end, len);
        (start < end).then_some(Selection { start, end })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    tokens: Vec<Token>,
    cursor: usize,
    selection: Option<Selection>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a buffer from its parts, clamping cursor and selection.
    pub fn from_parts(tokens: Vec<Token>, cursor: usize, selection: Option<Selection>) -> Self {
        let mut buffer = Self {
            tokens,
            cursor,
            selection,
        };
        buffer.truncate_to_bounds();
        buffer
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The token immediately left of the caret.
    pub fn token_before_cursor(&self) -> Option<&Token> {
        self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// The selected tokens, or an empty slice without a selection.
    pub fn selected_tokens(&self) -> &[Token] {
        match self.selection {
            Some(sel) => &self.tokens[sel.start..sel.end],
            None => &[],
        }
    }

    // --- Cursor and selection ---

    /// Moves the caret. Does not touch the selection; arrow handlers manage
    /// it explicitly.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = min(index, self.tokens.len());
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection.and_then(|s| s.clamped(self.tokens.len()));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Selects every token and parks the caret at the end.
    pub fn select_all(&mut self) {
        self.selection = Selection::between(0, self.tokens.len());
        self.cursor = self.tokens.len();
    }

    /// Arrow-key movement by `delta` tokens.
    ///
    /// With `extend`, the range is rebuilt between an anchor and the moved
    /// caret. The anchor is whichever end of the current range the caret is
    /// not sitting on; if the caret is on neither end, it is the end
    /// opposite the direction of travel. Without `extend`, a selection
    /// collapses onto its edge in the direction of travel.
    pub fn move_horizontal(&mut self, delta: isize, extend: bool) {
        let target = offset_clamped(self.cursor, delta, self.tokens.len());
        if extend {
            let anchor = self.selection_anchor(delta < 0);
            self.cursor = target;
            self.selection = Selection::between(anchor, target);
        } else {
            match self.selection.take() {
                Some(sel) if delta < 0 => self.cursor = sel.start,
                Some(sel) => self.cursor = sel.end,
                None => self.cursor = target,
            }
        }
        trace!(
            "move_horizontal({}, extend={}) -> cursor {} selection {:?}",
            delta,
            extend,
            self.cursor,
            self.selection
        );
    }

    /// Jumps the caret to `target`, extending the selection when asked.
    pub fn move_to(&mut self, target: usize, extend: bool) {
        let target = min(target, self.tokens.len());
        if extend {
            let anchor = self.selection_anchor(target < self.cursor);
            self.selection = Selection::between(anchor, target);
        } else {
            self.selection = None;
        }
        self.cursor = target;
    }

    fn selection_anchor(&self, moving_left: bool) -> usize {
        match self.selection {
            None => self.cursor,
            Some(sel) if self.cursor == sel.end => sel.start,
            Some(sel) if self.cursor == sel.start => sel.end,
            Some(sel) if moving_left => sel.end,
            Some(sel) => sel.start,
        }
    }

    // --- Insertion ---

    /// Inserts at `position` (clamped). The caret lands after the token.
    pub fn insert_at(&mut self, position: usize, token: Token) {
        let position = min(position, self.tokens.len());
        self.tokens.insert(position, token);
        self.cursor = position + 1;
        self.shift_selection_for_insert(position, 1);
    }

    /// Replaces the selection with `token`, or inserts at the caret.
    pub fn insert_at_cursor_or_selection(&mut self, token: Token) {
        self.insert_tokens_at_cursor_or_selection(vec![token]);
    }

    /// Multi-token form of [`Self::insert_at_cursor_or_selection`]. The
    /// caret ends up just past the last inserted token.
    pub fn insert_tokens_at_cursor_or_selection(&mut self, tokens: Vec<Token>) {
        match self.selection {
            Some(sel) => self.replace_range(sel.start, sel.end, tokens),
            None => self.replace_range(self.cursor, self.cursor, tokens),
        }
    }

    /// Splices `tokens` in place of `[start, end)`. Bounds are clamped and
    /// reordered if needed; the selection is cleared and the caret moves to
    /// the end of the spliced run.
    pub fn replace_range(&mut self, start: usize, end: usize, tokens: Vec<Token>) {
        let len = self.tokens.len();
        let (start, end) = (min(start, len), min(end, len));
        let (start, end) = (min(start, end), max(start, end));
        let inserted = tokens.len();
        self.tokens.splice(start..end, tokens);
        self.selection = None;
        self.cursor = start + inserted;
    }

    /// Overwrites the token at `index` in place. Returns false if the index
    /// is out of range. Caret and selection are left alone.
    pub fn replace_at(&mut self, index: usize, token: Token) -> bool {
        match self.tokens.get_mut(index) {
            Some(slot) => {
                *slot = token;
                true
            }
            None => false,
        }
    }

    // --- Deletion ---

    /// True if a backward delete would change the buffer.
    pub fn can_delete_backward(&self) -> bool {
        self.selection.is_some() || self.cursor > 0
    }

    /// True if a forward delete would change the buffer.
    pub fn can_delete_forward(&self) -> bool {
        self.selection.is_some() || self.cursor < self.tokens.len()
    }

    /// Backspace. Returns whether anything was removed.
    pub fn delete_backward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.tokens.remove(self.cursor);
        true
    }

    /// Delete key. Returns whether anything was removed.
    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        if self.cursor >= self.tokens.len() {
            return false;
        }
        self.tokens.remove(self.cursor);
        true
    }

    /// Removes the selected range, leaving the caret at its start.
    pub fn delete_selection(&mut self) -> bool {
        match self.selection.take() {
            Some(sel) => {
                self.tokens.drain(sel.start..sel.end);
                self.cursor = sel.start;
                true
            }
            None => false,
        }
    }

    /// Empties the buffer.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.cursor = 0;
        self.selection = None;
    }

    /// Clamps caret and selection after the token list shrank.
    pub fn truncate_to_bounds(&mut self) {
        let len = self.tokens.len();
        self.cursor = min(self.cursor, len);
        self.selection = self.selection.and_then(|s| s.clamped(len));
    }

    fn shift_selection_for_insert(&mut self, position: usize, count: usize) {
        if let Some(sel) = self.selection.as_mut() {
            if position <= sel.start {
                sel.start += count;
                sel.end += count;
            } else if position < sel.end {
                sel.end += count;
            }
        }
    }
}

fn offset_clamped(index: usize, delta: isize, len: usize) -> usize {
    let moved = if delta < 0 {
        index.saturating_sub(delta.unsigned_abs())
    } else {
        index.saturating_add(delta as usize)
    };
    min(moved, len)
}
