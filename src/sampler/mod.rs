// src/sampler/mod.rs

//! Fixed-rate key sampler.
//!
//! Once per tick the sampler looks at the set of held physical keys and
//! decodes at most one direction, one button combination and one special,
//! the way a game reads its input buffer. Emission is edge-triggered: a
//! value is produced only on the tick where it changes.
//!
//! All memory carried between ticks lives in [`SamplerState`]. [`sample`]
//! takes the previous state and returns the next one, so the decoder can be
//! driven tick by tick from tests with synthetic instants.
//!
//! ```text
//! held keys ──► sample() ──► Frame ──► commit() ──► CommandBuffer
//!                  ▲   │                  │
//!                  └───┴── SamplerState ◄─┘ (heat double-press timer)
//! ```

use std::time::{Duration, Instant};

use log::trace;

use crate::config::{KeyMapping, SamplerConfig};
use crate::keys::HeldKeys;
use crate::notation::{Buttons, Dir, Direction, Special, Token};

mod commit;

pub use commit::{commit, CommitOutcome};

// --- Tick gate ---

/// Rate limiter for incoming ticks. Early ticks are dropped, not queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickGate {
    last: Option<Instant>,
}

impl TickGate {
    /// Returns true and records `now` if at least `interval` has passed
    /// since the last accepted tick. The first tick is always accepted.
    pub fn accept(&mut self, now: Instant, interval: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

// --- Sampler state ---

/// Everything the sampler remembers between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerState {
    pub(crate) gate: TickGate,
    /// Direction decoded on the previous tick. Starts at neutral.
    pub(crate) last_direction: Dir,
    /// Consecutive ticks `last_direction` has been held (0 for neutral).
    pub(crate) hold_ticks: u32,
    pub(crate) last_buttons: Option<Buttons>,
    pub(crate) heat_held: bool,
    pub(crate) rage_held: bool,
    /// A rage press that rose on the same tick as heat; emitted next tick.
    pub(crate) rage_pending: bool,
    /// When the last unmerged heat token was placed. Wall clock, independent
    /// of the tick count.
    pub(crate) last_heat_at: Option<Instant>,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            gate: TickGate::default(),
            last_direction: Dir::N,
            hold_ticks: 0,
            last_buttons: None,
            heat_held: false,
            rage_held: false,
            rage_pending: false,
            last_heat_at: None,
        }
    }
}

impl SamplerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_direction(&self) -> Dir {
        self.last_direction
    }

    pub fn hold_ticks(&self) -> u32 {
        self.hold_ticks
    }

    pub fn last_heat_at(&self) -> Option<Instant> {
        self.last_heat_at
    }
}

// --- Frame ---

/// The tokens decided in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub direction: Option<Direction>,
    pub button: Option<Buttons>,
    pub special: Option<Special>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.direction.is_none() && self.button.is_none() && self.special.is_none()
    }

    /// Tokens in commit order: direction, button, special.
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(3);
        tokens.extend(self.direction.map(Token::Direction));
        tokens.extend(self.button.map(Token::Button));
        tokens.extend(self.special.map(Token::Special));
        tokens
    }

    /// True if the only token is a held direction.
    pub fn is_lone_hold(&self) -> bool {
        self.button.is_none() && self.special.is_none() && self.direction.is_some_and(|d| d.hold)
    }
}

// --- Decoding ---

/// Runs one tick. Returns the next state and, if the gate accepted the
/// tick, the decoded frame (possibly empty).
pub fn sample(
    state: &SamplerState,
    held: &HeldKeys,
    mapping: &KeyMapping,
    config: &SamplerConfig,
    now: Instant,
) -> (SamplerState, Option<Frame>) {
    let mut next = state.clone();
    if !next.gate.accept(now, config.tick_interval()) {
        return (next, None);
    }
    let frame = decode(&mut next, held, mapping, config);
    if !frame.is_empty() {
        trace!("Sampled frame {:?}", frame);
    }
    (next, Some(frame))
}

/// Decodes held keys against `state`, updating its edge memory.
pub fn decode(
    state: &mut SamplerState,
    held: &HeldKeys,
    mapping: &KeyMapping,
    config: &SamplerConfig,
) -> Frame {
    Frame {
        direction: decode_direction(state, held, mapping, config),
        button: decode_buttons(state, held, mapping),
        special: decode_special(state, held, mapping),
    }
}

/// The direction the held keys spell out, ignoring edge tracking.
pub fn current_direction(held: &HeldKeys, mapping: &KeyMapping) -> Dir {
    let orthogonal_held = |dir: Dir| {
        mapping
            .orthogonal(dir)
            .is_some_and(|binding| held.all_held(binding.codes()))
    };

    for diagonal in Dir::DIAGONALS {
        let held_diagonal = match mapping.diagonal(diagonal) {
            Some(binding) => held.all_held(binding.codes()),
            None => diagonal
                .components()
                .is_some_and(|(a, b)| orthogonal_held(a) && orthogonal_held(b)),
        };
        if held_diagonal {
            return diagonal;
        }
    }
    Dir::ORTHOGONALS
        .into_iter()
        .find(|dir| orthogonal_held(*dir))
        .unwrap_or(Dir::N)
}

fn decode_direction(
    state: &mut SamplerState,
    held: &HeldKeys,
    mapping: &KeyMapping,
    config: &SamplerConfig,
) -> Option<Direction> {
    let threshold = config.hold_threshold_ticks.max(2);
    let dir = current_direction(held, mapping);

    if dir != state.last_direction {
        state.last_direction = dir;
        if dir == Dir::N {
            state.hold_ticks = 0;
            return config.emit_neutral.then_some(Direction::tap(Dir::N));
        }
        state.hold_ticks = 1;
        return Some(Direction::tap(dir));
    }

    if dir == Dir::N {
        return None;
    }
    state.hold_ticks = state.hold_ticks.saturating_add(1);
    (state.hold_ticks == threshold).then_some(Direction::hold(dir))
}

/// The button set the held keys press, ignoring edge tracking.
pub fn current_buttons(held: &HeldKeys, mapping: &KeyMapping) -> Option<Buttons> {
    let mut bits = 0u8;
    for number in 1..=4u8 {
        if mapping
            .button(number)
            .is_some_and(|binding| held.all_held(binding.codes()))
        {
            bits |= 1 << (number - 1);
        }
    }
    for (buttons, binding) in mapping.combo_bindings() {
        if held.all_held(binding.codes()) {
            bits |= buttons.bits();
        }
    }
    Buttons::from_bits(bits)
}

fn decode_buttons(state: &mut SamplerState, held: &HeldKeys, mapping: &KeyMapping) -> Option<Buttons> {
    let buttons = current_buttons(held, mapping);
    if buttons == state.last_buttons {
        return None;
    }
    state.last_buttons = buttons;
    buttons
}

fn decode_special(state: &mut SamplerState, held: &HeldKeys, mapping: &KeyMapping) -> Option<Special> {
    let heat = held.all_held(mapping.heat.codes());
    let rage = held.all_held(mapping.rage.codes());
    let heat_rose = heat && !state.heat_held;
    let rage_rose = (rage && !state.rage_held) || state.rage_pending;
    state.heat_held = heat;
    state.rage_held = rage;
    state.rage_pending = false;

    // One special per frame. Heat goes first and a simultaneous rage waits.
    if heat_rose {
        state.rage_pending = rage_rose;
        Some(Special::Heat)
    } else if rage_rose {
        Some(Special::Rage)
    } else {
        None
    }
}
