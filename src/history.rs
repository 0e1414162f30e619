// src/history.rs

//! Undo/redo history.
//!
//! This is not a plain undo stack. Saves are deferred for sampled inserts
//! that follow other edits, and immediate for destructive edits, so the
//! live buffer is usually *not* stored in the log while it is being edited.
//! Three counters track where the live state sits relative to the log:
//!
//! - `idx`: index of the most recently saved snapshot, i.e. the state the
//!   next undo restores.
//! - `scene`: 1-based position of the live state. At the tip (live state
//!   newer than everything saved) `scene == log.len() + 1`; after an undo or
//!   redo the live state equals `log[scene - 1]`.
//! - `flag`: the last action only moved the cursor or selection. A sampled
//!   insert after such an action must save, because the saved cursor
//!   position would otherwise be lost.
//!
//! Invariants: `scene > idx`, and `scene == idx + 1` exactly in the fully
//! undone position (`idx == 0`, `scene == 1`), where the live state is a
//! copy of `log[0]`. The converse is positional: elsewhere the live tokens
//! may still equal `log[idx]` when two saves captured the same content.

use crate::buffer::{CommandBuffer, Selection};
use crate::notation::Token;
use log::{debug, trace};

/// Owned copy of the buffer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub tokens: Vec<Token>,
    pub cursor: usize,
    pub selection: Option<Selection>,
}

impl Snapshot {
    pub fn capture(buffer: &CommandBuffer) -> Self {
        Self {
            tokens: buffer.tokens().to_vec(),
            cursor: buffer.cursor(),
            selection: buffer.selection(),
        }
    }

    /// Rebuilds a live buffer. The snapshot keeps its own tokens.
    pub fn restore(&self) -> CommandBuffer {
        CommandBuffer::from_parts(self.tokens.clone(), self.cursor, self.selection)
    }
}

/// What kind of edit is about to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Text commit, delete, cut, paste, clear, line break. Always saves.
    ContentEdit,
    /// Frame-sampled tokens and bracket/paren/tilde/next marks. Saves only
    /// after a cursor/selection-only action.
    SampledInsert,
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    log: Vec<Snapshot>,
    idx: usize,
    scene: usize,
    flag: bool,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: vec![Snapshot::default()],
            idx: 0,
            scene: 1,
            flag: false,
            capacity: capacity.max(1),
        }
    }

    /// Back to the initial state: one empty snapshot, nothing to undo.
    pub fn reset(&mut self) {
        self.log.clear();
        self.log.push(Snapshot::default());
        self.idx = 0;
        self.scene = 1;
        self.flag = false;
        debug!("History reset");
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn scene(&self) -> usize {
        self.scene
    }

    pub fn flag(&self) -> bool {
        self.flag
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.log
    }

    pub fn can_undo(&self) -> bool {
        self.idx + 1 < self.scene
    }

    pub fn can_redo(&self) -> bool {
        (self.idx + 1 < self.scene && self.idx + 2 < self.log.len())
            || (self.idx + 1 == self.scene && self.idx + 1 < self.log.len())
    }

    /// Records that the last action changed only cursor or selection.
    pub fn mark_navigation(&mut self) {
        self.flag = true;
    }

    /// Called before an edit is applied to `live`.
    pub fn try_save(&mut self, trigger: SaveTrigger, live: &CommandBuffer) {
        match trigger {
            SaveTrigger::ContentEdit => self.push(live, true),
            SaveTrigger::SampledInsert if self.flag => self.push(live, true),
            SaveTrigger::SampledInsert => {
                self.scene = self.log.len() + 1;
                trace!("Deferred save, scene now {}", self.scene);
            }
        }
        self.flag = false;
    }

    /// Appends a snapshot of `live`, optionally discarding the redo branch.
    pub fn push(&mut self, live: &CommandBuffer, truncate_redo: bool) {
        if self.idx == 0 && self.scene == 1 {
            // Live state is log[0]; storing it again would duplicate it.
            if truncate_redo {
                self.log.truncate(1);
            }
            self.scene = 2;
            trace!("First edit from log[0], scene now 2");
            return;
        }

        if truncate_redo {
            self.log.truncate(self.idx + 1);
        }
        self.log.push(Snapshot::capture(live));
        self.idx = self.log.len() - 1;
        if self.log.len() > self.capacity {
            self.log.remove(0);
            self.idx -= 1;
            trace!("History over capacity, evicted oldest entry");
        }
        self.flag = false;
        self.scene = self.log.len() + 1;
        trace!(
            "Pushed snapshot: idx {} scene {} len {}",
            self.idx,
            self.scene,
            self.log.len()
        );
    }

    /// Steps back one state. Returns false at the boundary.
    pub fn undo(&mut self, live: &mut CommandBuffer) -> bool {
        if !self.can_undo() {
            return false;
        }
        if self.idx + 1 == self.log.len() {
            // Leaving the tip: keep the live state reachable by redo.
            self.log.push(Snapshot::capture(live));
        }
        *live = self.log[self.idx].restore();
        self.scene = self.idx + 1;
        if self.idx > 0 {
            self.idx -= 1;
        }
        self.flag = true;
        debug!("Undo: idx {} scene {} len {}", self.idx, self.scene, self.log.len());
        true
    }

    /// Steps forward one state. Returns false at the boundary.
    ///
    /// The second branch only fires from the fully undone position; in any
    /// other position `log[idx + 1]` is the live state itself.
    pub fn redo(&mut self, live: &mut CommandBuffer) -> bool {
        if self.idx + 1 < self.scene && self.idx + 2 < self.log.len() {
            *live = self.log[self.idx + 2].restore();
            self.scene = self.idx + 3;
            self.idx += 1;
        } else if self.idx + 1 == self.scene && self.idx + 1 < self.log.len() {
            *live = self.log[self.idx + 1].restore();
            self.scene = self.idx + 2;
        } else {
            return false;
        }
        self.flag = true;
        debug!("Redo: idx {} scene {} len {}", self.idx, self.scene, self.log.len());
        true
    }
}
