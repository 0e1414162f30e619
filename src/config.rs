// src/config.rs

//! Defines the configuration structures for the command composer.
//!
//! The key mapping is the only piece of state that outlives a session, so
//! the whole configuration round-trips through JSON. Every section carries
//! `#[serde(default)]` so a partial file (for example one that only remaps a
//! couple of buttons) fills the rest from the defaults below.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::keys::KeyCode;
use crate::notation::{Buttons, Dir};

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration for a composing session.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Physical key bindings for directions, buttons and specials.
    pub keymap: KeyMapping,
    /// Frame sampler tunables.
    pub sampler: SamplerConfig,
    /// Undo history settings.
    pub history: HistoryConfig,
    /// Vertical navigation settings.
    pub layout: LayoutConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }
}

// --- Key Mapping ---

/// A chord of physical keys that must all be held at once.
///
/// Usually a single key. An empty binding is unbound and never matches.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Binding(pub Vec<KeyCode>);

impl Binding {
    pub fn key(code: &str) -> Self {
        Binding(vec![KeyCode::from(code)])
    }

    pub fn chord(codes: &[&str]) -> Self {
        Binding(codes.iter().map(|c| KeyCode::from(*c)).collect())
    }

    pub fn unbound() -> Self {
        Binding(Vec::new())
    }

    pub fn is_bound(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn codes(&self) -> &[KeyCode] {
        &self.0
    }

    pub fn uses(&self, code: &KeyCode) -> bool {
        self.0.contains(code)
    }
}

/// Maps logical inputs to physical keys.
///
/// Diagonals are optional: when a dedicated diagonal binding is absent the
/// sampler derives the diagonal from the two orthogonal bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyMapping {
    pub up: Binding,
    pub down: Binding,
    pub forward: Binding,
    pub back: Binding,
    pub up_back: Option<Binding>,
    pub up_forward: Option<Binding>,
    pub down_back: Option<Binding>,
    pub down_forward: Option<Binding>,
    pub button1: Binding,
    pub button2: Binding,
    pub button3: Binding,
    pub button4: Binding,
    /// Single keys standing in for a button co-press, keyed by the
    /// canonical combination (`"1+2"`). Entries with an unparsable key are
    /// ignored.
    pub combos: BTreeMap<String, Binding>,
    pub heat: Binding,
    pub rage: Binding,
}

impl Default for KeyMapping {
    fn default() -> Self {
        KeyMapping {
            up: Binding::key("KeyW"),
            down: Binding::key("KeyS"),
            forward: Binding::key("KeyD"),
            back: Binding::key("KeyA"),
            up_back: None,
            up_forward: None,
            down_back: None,
            down_forward: None,
            button1: Binding::key("KeyU"),
            button2: Binding::key("KeyI"),
            button3: Binding::key("KeyJ"),
            button4: Binding::key("KeyK"),
            combos: BTreeMap::new(),
            heat: Binding::key("KeyO"),
            rage: Binding::key("KeyL"),
        }
    }
}

impl KeyMapping {
    /// The orthogonal binding for `dir`. Diagonals and neutral have none.
    pub fn orthogonal(&self, dir: Dir) -> Option<&Binding> {
        match dir {
            Dir::U => Some(&self.up),
            Dir::D => Some(&self.down),
            Dir::F => Some(&self.forward),
            Dir::B => Some(&self.back),
            _ => None,
        }
    }

    /// The dedicated binding for a diagonal, if one is configured and bound.
    pub fn diagonal(&self, dir: Dir) -> Option<&Binding> {
        let binding = match dir {
            Dir::UB => self.up_back.as_ref(),
            Dir::UF => self.up_forward.as_ref(),
            Dir::DB => self.down_back.as_ref(),
            Dir::DF => self.down_forward.as_ref(),
            _ => None,
        };
        binding.filter(|b| b.is_bound())
    }

    /// Binding for button 1..=4.
    pub fn button(&self, number: u8) -> Option<&Binding> {
        match number {
            1 => Some(&self.button1),
            2 => Some(&self.button2),
            3 => Some(&self.button3),
            4 => Some(&self.button4),
            _ => None,
        }
    }

    /// Combination bindings with their parsed button sets.
    pub fn combo_bindings(&self) -> impl Iterator<Item = (Buttons, &Binding)> {
        self.combos
            .iter()
            .filter_map(|(name, binding)| Buttons::parse(name).map(|b| (b, binding)))
    }

    /// True if `code` participates in any binding. The discrete router
    /// leaves such keys to the sampler.
    pub fn is_bound(&self, code: &KeyCode) -> bool {
        let fixed = [
            &self.up,
            &self.down,
            &self.forward,
            &self.back,
            &self.button1,
            &self.button2,
            &self.button3,
            &self.button4,
            &self.heat,
            &self.rage,
        ];
        fixed.iter().any(|b| b.uses(code))
            || [
                &self.up_back,
                &self.up_forward,
                &self.down_back,
                &self.down_forward,
            ]
            .iter()
            .any(|b| b.as_ref().is_some_and(|b| b.uses(code)))
            || self.combos.values().any(|b| b.uses(code))
    }
}

// --- Sampler Configuration ---

/// Tunables for the fixed-rate key sampler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Nominal tick rate. Ticks arriving faster are skipped.
    pub tick_rate_hz: u32,
    /// Consecutive ticks a direction must be held to emit its hold variant.
    pub hold_threshold_ticks: u32,
    /// Wall-clock window in which a second heat press becomes a heat smash.
    pub double_press_window_ms: u64,
    /// Emit an `n` token when the stick returns to neutral.
    pub emit_neutral: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            tick_rate_hz: 60,
            hold_threshold_ticks: 10,
            double_press_window_ms: 400,
            emit_neutral: false,
        }
    }
}

impl SamplerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }

    pub fn double_press_window(&self) -> Duration {
        Duration::from_millis(self.double_press_window_ms)
    }
}

// --- History Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of saved snapshots. Oldest entries are evicted first.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig { capacity: 100 }
    }
}

// --- Layout Configuration ---

/// Settings for row-wise cursor movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Tokens whose top edges differ by at most this many pixels share a row.
    pub row_tolerance_px: f32,
    /// Tokens per row assumed when the host has not supplied a layout.
    pub fallback_row_stride: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            row_tolerance_px: 4.0,
            fallback_row_stride: 16,
        }
    }
}
