// src/session/router.rs

//! Discrete key handling: editing shortcuts and typed notation marks.
//!
//! The frame sampler owns every key that appears in the key mapping, so a
//! plain press of such a key is not routed here. Shortcuts held with Control
//! (or Super) are always routed and kept out of the held-key set, since the
//! default WASD map would otherwise read Ctrl+A as a held back.

use super::{CommandSession, SessionAction};
use crate::buffer::VerticalMove;
use crate::keys::{KeyEvent, KeySymbol, Modifiers};
use crate::notation::Mark;
use log::{debug, trace};

pub(super) fn route_key(session: &mut CommandSession, event: &KeyEvent) -> Option<SessionAction> {
    if session.text_entry.is_some() {
        trace!("Text entry active, not routing {:?}", event.symbol);
        return None;
    }
    if event.symbol.is_modifier() {
        return None;
    }

    if is_shortcut(event) {
        return route_shortcut(session, event);
    }
    if session.config.keymap.is_bound(&event.code) {
        trace!("{} is bound to the sampler, not routing", event.code);
        return None;
    }

    let extend = event.modifiers.contains(Modifiers::SHIFT);
    match event.symbol {
        KeySymbol::Char('"') => session.enter_text_mode(),
        KeySymbol::Char(c) => {
            if let Some(mark) = mark_for_char(c) {
                session.insert_mark(mark);
            }
        }
        KeySymbol::Enter => session.insert_line_break(),
        KeySymbol::Backspace => {
            session.delete_backward();
        }
        KeySymbol::Delete => {
            session.delete_forward();
        }
        KeySymbol::Left => session.move_horizontal(-1, extend),
        KeySymbol::Right => session.move_horizontal(1, extend),
        KeySymbol::Up => session.move_vertical(VerticalMove::Up, extend),
        KeySymbol::Down => session.move_vertical(VerticalMove::Down, extend),
        KeySymbol::Home => session.move_to(0, extend),
        KeySymbol::End => {
            let end = session.buffer.len();
            session.move_to(end, extend);
        }
        KeySymbol::Escape => session.clear_selection(),
        _ => {}
    }
    None
}

/// A non-modifier key pressed with Control or Super. Such presses belong to
/// the router only and never enter the held-key set.
pub(super) fn is_shortcut(event: &KeyEvent) -> bool {
    !event.symbol.is_modifier() && event.modifiers.intersects(Modifiers::CONTROL | Modifiers::SUPER)
}

fn route_shortcut(session: &mut CommandSession, event: &KeyEvent) -> Option<SessionAction> {
    let KeySymbol::Char(c) = event.symbol else {
        return None;
    };
    let shift = event.modifiers.contains(Modifiers::SHIFT);
    match c.to_ascii_lowercase() {
        'a' => session.select_all(),
        'z' if shift => {
            session.redo();
        }
        'z' => {
            session.undo();
        }
        'y' => {
            session.redo();
        }
        'c' => return session.copy().map(SessionAction::CopyToClipboard),
        'x' => return session.cut().map(SessionAction::CopyToClipboard),
        'v' => {
            debug!("Requesting clipboard content for paste");
            return Some(SessionAction::RequestClipboardContent);
        }
        _ => {}
    }
    None
}

/// Characters that insert a notation mark directly.
fn mark_for_char(c: char) -> Option<Mark> {
    match c {
        '[' => Some(Mark::BracketOpen),
        ']' => Some(Mark::BracketClose),
        '(' => Some(Mark::ParenOpen),
        ')' => Some(Mark::ParenClose),
        '~' => Some(Mark::Tilde),
        '>' => Some(Mark::Next),
        _ => None,
    }
}
