// src/sampler/commit.rs

//! Placing a sampled frame into the buffer.
//!
//! Frames normally insert at the caret (or replace the selection). Two
//! narrow rules replace the token immediately before the caret instead:
//!
//! - hold-collapse: a frame holding nothing but `F` right after a tapped
//!   `f` turns that `f` into `F`;
//! - heat smash: a second heat within the double-press window, right after
//!   the first heat token, turns that token into `heatSmash`.
//!
//! Both look at exactly one preceding token and nothing else.

use std::time::Instant;

use log::debug;

use super::{Frame, SamplerState};
use crate::buffer::CommandBuffer;
use crate::config::SamplerConfig;
use crate::notation::{Direction, Special, Token};

/// What a commit did to the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Tokens added.
    pub inserted: usize,
    /// Preceding tokens overwritten in place.
    pub replaced: usize,
}

impl CommitOutcome {
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced > 0
    }
}

/// Commits `frame` at the caret. The selection, if any, is consumed and the
/// caret ends just past the placed tokens.
pub fn commit(
    frame: &Frame,
    state: &mut SamplerState,
    buffer: &mut CommandBuffer,
    config: &SamplerConfig,
    now: Instant,
) -> CommitOutcome {
    if frame.is_empty() {
        return CommitOutcome::default();
    }

    if buffer.selection().is_some() {
        if frame.special == Some(Special::Heat) {
            state.last_heat_at = Some(now);
        }
        let tokens = frame.tokens();
        let inserted = tokens.len();
        buffer.insert_tokens_at_cursor_or_selection(tokens);
        return CommitOutcome { inserted, replaced: 0 };
    }

    if frame.is_lone_hold() {
        if let Some(hold) = frame.direction {
            let tap = Token::Direction(Direction::tap(hold.dir));
            if buffer.token_before_cursor() == Some(&tap) {
                buffer.replace_at(buffer.cursor() - 1, Token::Direction(hold));
                debug!("Collapsed tap into hold {}", hold.canonical());
                return CommitOutcome { inserted: 0, replaced: 1 };
            }
        }
    }

    let mut outcome = CommitOutcome::default();
    let mut run: Vec<Token> = Vec::with_capacity(2);
    run.extend(frame.direction.map(Token::Direction));
    run.extend(frame.button.map(Token::Button));
    if !run.is_empty() {
        outcome.inserted += run.len();
        buffer.insert_tokens_at_cursor_or_selection(run);
    }

    match frame.special {
        Some(Special::Heat) if heat_merges(state, buffer, config, now) => {
            buffer.replace_at(buffer.cursor() - 1, Token::Special(Special::HeatSmash));
            state.last_heat_at = None;
            outcome.replaced += 1;
            debug!("Merged double heat press into heatSmash");
        }
        Some(Special::Heat) => {
            state.last_heat_at = Some(now);
            buffer.insert_at_cursor_or_selection(Token::Special(Special::Heat));
            outcome.inserted += 1;
        }
        Some(special) => {
            buffer.insert_at_cursor_or_selection(Token::Special(special));
            outcome.inserted += 1;
        }
        None => {}
    }
    outcome
}

fn heat_merges(state: &SamplerState, buffer: &CommandBuffer, config: &SamplerConfig, now: Instant) -> bool {
    let recent = state
        .last_heat_at
        .is_some_and(|at| now.saturating_duration_since(at) <= config.double_press_window());
    recent && buffer.token_before_cursor() == Some(&Token::Special(Special::Heat))
}
