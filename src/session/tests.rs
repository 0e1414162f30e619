// src/session/tests.rs

use super::*;
use crate::keys::{KeyCode, KeyEvent, KeySymbol, Modifiers};
use crate::notation::{Dir, Special};
use std::time::Duration;
use test_log::test;

// --- Test Helpers ---

struct Harness {
    session: CommandSession,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        Self {
            session: CommandSession::new(Config::default()),
            now: Instant::now(),
        }
    }

    /// Physical key down, as the sampler sees it.
    fn press(&mut self, code: &str) -> Vec<SessionAction> {
        self.session.process(SessionInput::KeyDown(KeyEvent::new(
            code,
            KeySymbol::Unknown,
            Modifiers::empty(),
        )))
    }

    fn release(&mut self, code: &str) {
        self.session.process(SessionInput::KeyUp(KeyCode::from(code)));
    }

    /// Press and release of a logical key.
    fn key(&mut self, symbol: KeySymbol, modifiers: Modifiers) -> Vec<SessionAction> {
        let event = KeyEvent::symbol(symbol, modifiers);
        let code = event.code.clone();
        let actions = self.session.process(SessionInput::KeyDown(event));
        self.session.process(SessionInput::KeyUp(code));
        actions
    }

    fn char_key(&mut self, c: char) -> Vec<SessionAction> {
        self.key(KeySymbol::Char(c), Modifiers::empty())
    }

    fn ctrl(&mut self, c: char) -> Vec<SessionAction> {
        self.key(KeySymbol::Char(c), Modifiers::CONTROL)
    }

    fn ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.now += Duration::from_millis(17);
            self.session.process(SessionInput::Tick(self.now));
        }
    }

    fn paste(&mut self, text: &str) {
        self.session
            .process(SessionInput::PasteText(Ok(text.to_string())));
    }

    fn text(&self) -> String {
        self.session.serialize()
    }
}

// --- Sampling through the session ---

#[test]
fn test_held_keys_become_tokens_on_ticks() {
    let mut h = Harness::new();
    h.press("KeyS");
    h.ticks(2);
    h.press("KeyD");
    h.ticks(2);
    h.release("KeyS");
    h.press("KeyU");
    h.ticks(2);
    h.release("KeyD");
    h.release("KeyU");
    h.ticks(2);
    assert_eq!(h.text(), "d df f 1");
    assert!(h.session.held_keys().is_empty());
}

#[test]
fn test_ticks_faster_than_rate_are_ignored() {
    let mut h = Harness::new();
    h.press("KeyD");
    let now = h.now;
    h.session.process(SessionInput::Tick(now));
    h.release("KeyD");
    h.press("KeyA");
    h.session.process(SessionInput::Tick(now + Duration::from_millis(3)));
    assert_eq!(h.text(), "f");
}

#[test]
fn test_heat_double_press_is_one_undo_step() {
    let mut h = Harness::new();
    h.press("KeyO");
    h.ticks(1);
    h.release("KeyO");
    h.ticks(1);
    h.press("KeyO");
    h.ticks(1);
    assert_eq!(h.session.tokens(), &[Token::Special(Special::HeatSmash)]);

    assert!(h.session.undo());
    assert!(h.session.tokens().is_empty());
    assert!(h.session.redo());
    assert_eq!(h.text(), "heatSmash");
}

#[test]
fn test_navigation_then_sampled_insert_saves_cursor() {
    let mut h = Harness::new();
    h.paste("u d b");
    h.key(KeySymbol::Left, Modifiers::SHIFT);
    h.key(KeySymbol::Left, Modifiers::SHIFT);
    assert_eq!(h.session.selection(), Some(Selection { start: 1, end: 3 }));

    let saved = h.session.history().len();
    h.press("KeyD");
    h.press("KeyU");
    h.ticks(1);
    assert_eq!(h.text(), "u f 1");
    assert_eq!(h.session.history().len(), saved + 1);

    assert!(h.session.undo());
    assert_eq!(h.text(), "u d b");
    assert_eq!(h.session.selection(), Some(Selection { start: 1, end: 3 }));
}

// --- Router ---

#[test]
fn test_typed_marks_and_line_break() {
    let mut h = Harness::new();
    for c in ['[', '>', '~', ']', '(', ')'] {
        h.char_key(c);
    }
    h.key(KeySymbol::Enter, Modifiers::empty());
    assert_eq!(h.text(), "[ next ~ ] ( )\n");
    assert_eq!(h.session.cursor(), 7);
}

#[test]
fn test_bound_keys_are_left_to_the_sampler() {
    let mut session = CommandSession::new(Config::default());
    let bound = KeyEvent::new("KeyU", KeySymbol::Char('['), Modifiers::empty());
    session.process(SessionInput::KeyDown(bound));
    assert!(session.tokens().is_empty(), "KeyU is button 1, not a mark");

    let unbound = KeyEvent::new("BracketLeft", KeySymbol::Char('['), Modifiers::empty());
    session.process(SessionInput::KeyDown(unbound));
    assert_eq!(session.serialize(), "[");
}

#[test]
fn test_select_all_copy_cut() {
    let mut h = Harness::new();
    h.paste("f 1 2");
    assert!(h.ctrl('c').is_empty(), "nothing selected");

    let select_all = KeyEvent::new("KeyA", KeySymbol::Char('a'), Modifiers::CONTROL);
    h.session.process(SessionInput::KeyDown(select_all));
    h.release("KeyA");
    assert_eq!(h.session.selection(), Some(Selection { start: 0, end: 3 }));

    assert_eq!(
        h.ctrl('c'),
        vec![SessionAction::CopyToClipboard("f 1 2".to_string())]
    );
    assert_eq!(h.session.tokens().len(), 3);
    assert_eq!(
        h.ctrl('x'),
        vec![SessionAction::CopyToClipboard("f 1 2".to_string())]
    );
    assert!(h.session.tokens().is_empty());
    assert!(h.session.undo());
    assert_eq!(h.text(), "f 1 2");
}

#[test]
fn test_physical_ctrl_a_never_reaches_the_sampler() {
    let mut h = Harness::new();
    h.paste("d df f 1");

    // `KeyA` is back in the default map; with Control it is select-all only.
    let select_all = KeyEvent::new("KeyA", KeySymbol::Char('a'), Modifiers::CONTROL);
    h.session.process(SessionInput::KeyDown(select_all));
    assert_eq!(h.session.selection(), Some(Selection { start: 0, end: 4 }));
    assert!(!h.session.held_keys().is_held(&KeyCode::from("KeyA")));

    h.ticks(1);
    h.release("KeyA");
    h.ticks(1);
    assert_eq!(h.text(), "d df f 1");
    assert_eq!(h.session.selection(), Some(Selection { start: 0, end: 4 }));
}

#[test]
fn test_undo_redo_shortcuts() {
    let mut h = Harness::new();
    h.paste("f");
    h.paste("b");
    assert_eq!(h.text(), "f b");
    h.ctrl('z');
    assert_eq!(h.text(), "f");
    h.ctrl('z');
    assert_eq!(h.text(), "");
    h.ctrl('y');
    assert_eq!(h.text(), "f");
    h.key(KeySymbol::Char('Z'), Modifiers::CONTROL | Modifiers::SHIFT);
    assert_eq!(h.text(), "f b");
}

#[test]
fn test_delete_keys_save_only_when_they_delete() {
    let mut h = Harness::new();
    h.key(KeySymbol::Backspace, Modifiers::empty());
    h.key(KeySymbol::Delete, Modifiers::empty());
    assert!(!h.session.can_undo());

    h.paste("u d f");
    h.key(KeySymbol::Home, Modifiers::empty());
    h.key(KeySymbol::Backspace, Modifiers::empty());
    assert_eq!(h.text(), "u d f");
    h.key(KeySymbol::Delete, Modifiers::empty());
    assert_eq!(h.text(), "d f");
    h.key(KeySymbol::End, Modifiers::empty());
    h.key(KeySymbol::Backspace, Modifiers::empty());
    assert_eq!(h.text(), "d");

    assert!(h.session.undo());
    assert_eq!(h.text(), "d f");
    assert!(h.session.undo());
    assert_eq!(h.text(), "u d f");
}

#[test]
fn test_escape_clears_selection() {
    let mut h = Harness::new();
    h.paste("u d");
    h.key(KeySymbol::Home, Modifiers::SHIFT);
    assert_eq!(h.session.selection(), Some(Selection { start: 0, end: 2 }));
    h.key(KeySymbol::Escape, Modifiers::empty());
    assert_eq!(h.session.selection(), None);
    assert_eq!(h.session.cursor(), 0);
}

#[test]
fn test_set_cursor_keeps_selection() {
    let mut h = Harness::new();
    h.paste("u d f b");
    h.session.set_selection(Some(Selection { start: 1, end: 3 }));
    assert_eq!(h.session.cursor(), 4, "selecting does not move the caret");

    h.session.set_cursor(0);
    assert_eq!(h.session.cursor(), 0);
    assert_eq!(h.session.selection(), Some(Selection { start: 1, end: 3 }));

    h.session.set_cursor(99);
    assert_eq!(h.session.cursor(), 4);
    assert_eq!(h.session.selection(), Some(Selection { start: 1, end: 3 }));
}

#[test]
fn test_click_at_drops_selection() {
    let mut h = Harness::new();
    h.paste("u d f b");
    h.session.set_selection(Some(Selection { start: 1, end: 3 }));
    h.session.click_at(2);
    assert_eq!(h.session.selection(), None);
    assert_eq!(h.session.cursor(), 2);

    // Navigation only: the next insert saves the clicked caret.
    h.char_key('~');
    assert_eq!(h.text(), "u d ~ f b");
    assert!(h.session.undo());
    assert_eq!(h.text(), "u d f b");
    assert_eq!(h.session.cursor(), 2);
}

#[test]
fn test_vertical_keys_use_fallback_stride() {
    let mut config = Config::default();
    config.layout.fallback_row_stride = 2;
    let mut session = CommandSession::new(config);
    session.paste_resolved(Ok("u d f b ub".to_string()));
    session.set_cursor(3);
    session.process(SessionInput::KeyDown(KeyEvent::symbol(
        KeySymbol::Up,
        Modifiers::empty(),
    )));
    assert_eq!(session.cursor(), 1);
}

// --- Clipboard ---

#[test]
fn test_paste_request_then_resolve_at_current_cursor() {
    let mut h = Harness::new();
    h.paste("f 1 2");
    assert_eq!(h.ctrl('v'), vec![SessionAction::RequestClipboardContent]);

    // The caret moves while the read is in flight.
    h.key(KeySymbol::Home, Modifiers::empty());
    h.paste("b");
    assert_eq!(h.text(), "b f 1 2");
    assert_eq!(h.session.cursor(), 1);

    assert!(h.session.undo());
    assert_eq!(h.text(), "f 1 2");
    assert_eq!(h.session.cursor(), 0);
}

#[test]
fn test_paste_replaces_selection() {
    let mut h = Harness::new();
    h.paste("u d f b");
    h.session.set_selection(Some(Selection { start: 1, end: 3 }));
    h.paste("heat \"x\"");
    assert_eq!(h.text(), "u heat \"x\" b");
    assert_eq!(h.session.cursor(), 3);
}

#[test]
fn test_failed_or_empty_paste_is_ignored() {
    let mut h = Harness::new();
    h.paste("f");
    let scene = h.session.history().scene();
    h.session
        .process(SessionInput::PasteText(Err(anyhow::anyhow!("no clipboard"))));
    h.paste("   garbage ");
    assert_eq!(h.text(), "f");
    assert_eq!(h.session.history().scene(), scene);
}

// --- Text entry ---

#[test]
fn test_text_mode_blocks_router_and_sampler() {
    let mut h = Harness::new();
    h.char_key('"');
    assert!(h.session.is_text_mode());

    h.char_key('[');
    h.press("KeyD");
    h.ticks(3);
    h.release("KeyD");
    assert!(h.session.tokens().is_empty());

    h.session.update_text_draft("  wall splat ");
    assert_eq!(h.session.text_entry().map(|e| e.draft()), Some("  wall splat "));
    assert!(h.session.exit_text_mode());
    assert!(!h.session.is_text_mode());
    assert_eq!(h.session.tokens(), &[Token::Text("wall splat".into())]);

    assert!(h.session.undo());
    assert!(h.session.tokens().is_empty());
}

#[test]
fn test_edit_existing_text_token() {
    let mut h = Harness::new();
    h.paste("f \"combo\" 1");
    assert!(!h.session.edit_text_at(0), "not a text token");
    assert!(h.session.edit_text_at(1));
    assert_eq!(h.session.text_entry().map(|e| e.draft()), Some("combo"));
    h.session.update_text_draft("juggle");
    assert!(h.session.commit_text());
    assert_eq!(h.text(), "f \"juggle\" 1");

    assert!(h.session.edit_text_at(1));
    h.session.update_text_draft("   ");
    assert!(!h.session.commit_text());
    assert_eq!(h.text(), "f \"juggle\" 1", "blank draft keeps the old text");
}

#[test]
fn test_cancel_text_mode_discards_draft() {
    let mut h = Harness::new();
    h.session.enter_text_mode();
    h.session.update_text_draft("never");
    h.session.cancel_text_mode();
    assert!(!h.session.is_text_mode());
    assert!(h.session.tokens().is_empty());
    assert!(!h.session.can_undo());
}

// --- Clear and reset ---

#[test]
fn test_clear_is_undoable_reset_is_not() {
    let mut h = Harness::new();
    h.paste("f b");
    h.session.clear();
    assert!(h.session.tokens().is_empty());
    assert!(h.session.undo());
    assert_eq!(h.text(), "f b");

    h.session.reset();
    assert!(h.session.tokens().is_empty());
    assert!(!h.session.can_undo());
    assert!(!h.session.can_redo());
    assert_eq!(h.session.history().len(), 1);
}

#[test]
fn test_direct_insert_uses_selection() {
    let mut h = Harness::new();
    h.session.insert_at_cursor_or_selection(Token::tap(Dir::D));
    h.session.insert_at_cursor_or_selection(Token::tap(Dir::F));
    h.session.select_all();
    h.session.insert_at_cursor_or_selection(Token::hold(Dir::B));
    assert_eq!(h.text(), "B");
    assert_eq!(h.session.cursor(), 1);
}
