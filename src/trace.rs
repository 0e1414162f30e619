// src/trace.rs

//! Line-based input traces.
//!
//! A trace scripts a session without a UI, one command per line:
//!
//! ```text
//! # quarter circle forward + 1
//! down KeyS
//! tick 17
//! down KeyD
//! tick 17
//! up KeyS
//! down KeyU
//! tick 17 3
//! up KeyD
//! up KeyU
//! key ctrl+a
//! key ctrl+c
//! key End
//! key ctrl+v
//! text "wall splat"
//! paste "d df f 2"
//! dump
//! ```
//!
//! `tick <ms> [count]` advances a virtual clock before each tick, so replays
//! are deterministic. `key` presses and releases a logical key with optional
//! `ctrl+`/`shift+`/`alt+`/`super+` prefixes. Clipboard actions are served by
//! an in-memory clipboard. Blank lines and `#` comments are ignored.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, trace};

use crate::keys::{KeyCode, KeyEvent, KeySymbol, Modifiers};
use crate::session::{CommandSession, SessionAction, SessionInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceCommand {
    /// A physical key goes down.
    Down(KeyCode),
    /// A physical key goes up.
    Up(KeyCode),
    /// Advance the clock by `step` and tick, `count` times.
    Tick { step: Duration, count: u32 },
    /// A logical key press and release.
    Key(KeyEvent),
    /// A clipboard read resolving with this text.
    Paste(String),
    /// Type a text annotation and commit it.
    Text(String),
    /// Record the serialized buffer.
    Dump,
}

/// Parses a whole trace. Errors carry the offending line number.
pub fn parse(input: &str) -> Result<Vec<TraceCommand>> {
    let mut commands = Vec::new();
    for (number, line) in input.lines().enumerate() {
        if let Some(command) =
            parse_line(line).with_context(|| format!("Trace line {}: {:?}", number + 1, line))?
        {
            commands.push(command);
        }
    }
    Ok(commands)
}

/// Parses one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<TraceCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "down" => TraceCommand::Down(KeyCode::new(required(verb, rest)?)),
        "up" => TraceCommand::Up(KeyCode::new(required(verb, rest)?)),
        "tick" => parse_tick(rest)?,
        "key" => TraceCommand::Key(parse_key(required(verb, rest)?)?),
        "paste" => TraceCommand::Paste(parse_quoted(rest)?),
        "text" => TraceCommand::Text(parse_quoted(rest)?),
        "dump" => TraceCommand::Dump,
        other => bail!("Unknown trace command {:?}", other),
    };
    Ok(Some(command))
}

fn required<'a>(verb: &str, rest: &'a str) -> Result<&'a str> {
    if rest.is_empty() {
        bail!("`{}` needs an argument", verb);
    }
    Ok(rest)
}

fn parse_tick(rest: &str) -> Result<TraceCommand> {
    let mut parts = rest.split_whitespace();
    let ms: u64 = parts
        .next()
        .ok_or_else(|| anyhow!("`tick` needs a step in milliseconds"))?
        .parse()
        .context("Invalid tick step")?;
    let count: u32 = match parts.next() {
        Some(count) => count.parse().context("Invalid tick count")?,
        None => 1,
    };
    if parts.next().is_some() {
        bail!("`tick` takes at most two arguments");
    }
    Ok(TraceCommand::Tick {
        step: Duration::from_millis(ms),
        count,
    })
}

/// Parses `ctrl+shift+z`, `left`, `[`, `ctrl++` and the like.
pub fn parse_key(name: &str) -> Result<KeyEvent> {
    let mut modifiers = Modifiers::empty();
    let mut rest = name;
    while let Some((head, tail)) = rest.split_once('+') {
        // A trailing '+' is the key itself.
        if tail.is_empty() {
            break;
        }
        modifiers |= match head.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Modifiers::CONTROL,
            "shift" => Modifiers::SHIFT,
            "alt" => Modifiers::ALT,
            "super" | "cmd" => Modifiers::SUPER,
            _ => bail!("Unknown modifier {:?} in {:?}", head, name),
        };
        rest = tail;
    }
    let symbol =
        KeySymbol::from_name(rest).ok_or_else(|| anyhow!("Unknown key name {:?}", rest))?;
    Ok(KeyEvent::symbol(symbol, modifiers))
}

/// A double-quoted argument with `\"`, `\\` and `\n` escapes.
fn parse_quoted(rest: &str) -> Result<String> {
    let inner = rest
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| anyhow!("Expected a double-quoted argument"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => bail!("Dangling escape at end of quoted argument"),
        }
    }
    Ok(out)
}

// --- Replay ---

/// Feeds trace commands into a session against a virtual clock.
pub struct Replayer {
    session: CommandSession,
    now: Instant,
    clipboard: Option<String>,
    dumps: Vec<String>,
}

impl Replayer {
    pub fn new(session: CommandSession) -> Self {
        Self {
            session,
            now: Instant::now(),
            clipboard: None,
            dumps: Vec::new(),
        }
    }

    pub fn session(&self) -> &CommandSession {
        &self.session
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Buffer snapshots recorded by `dump`, in order.
    pub fn dumps(&self) -> &[String] {
        &self.dumps
    }

    pub fn run(&mut self, commands: &[TraceCommand]) {
        for command in commands {
            self.apply(command);
        }
    }

    pub fn apply(&mut self, command: &TraceCommand) {
        trace!("Replaying {:?}", command);
        match command {
            TraceCommand::Down(code) => {
                let event = KeyEvent::new(code.as_str(), KeySymbol::Unknown, Modifiers::empty());
                let actions = self.session.process(SessionInput::KeyDown(event));
                self.perform(actions);
            }
            TraceCommand::Up(code) => {
                self.session.process(SessionInput::KeyUp(code.clone()));
            }
            TraceCommand::Tick { step, count } => {
                for _ in 0..*count {
                    self.now += *step;
                    self.session.process(SessionInput::Tick(self.now));
                }
            }
            TraceCommand::Key(event) => {
                let code = event.code.clone();
                let actions = self.session.process(SessionInput::KeyDown(event.clone()));
                self.session.process(SessionInput::KeyUp(code));
                self.perform(actions);
            }
            TraceCommand::Paste(text) => {
                self.session
                    .process(SessionInput::PasteText(Ok(text.clone())));
            }
            TraceCommand::Text(text) => {
                self.session.enter_text_mode();
                self.session.update_text_draft(text);
                self.session.commit_text();
            }
            TraceCommand::Dump => self.dumps.push(self.session.serialize()),
        }
    }

    fn perform(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::CopyToClipboard(text) => {
                    debug!("Clipboard <- {:?}", text);
                    self.clipboard = Some(text);
                }
                SessionAction::RequestClipboardContent => {
                    let result = self
                        .clipboard
                        .clone()
                        .ok_or_else(|| anyhow!("Clipboard is empty"));
                    self.session.process(SessionInput::PasteText(result));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_parse_commands() {
        let trace = "# comment\n\ndown KeyD\ntick 17 3\nup KeyD\nkey ctrl+shift+z\npaste \"f \\\"x\\\"\"\ndump\n";
        let commands = parse(trace).unwrap();
        assert_eq!(
            commands,
            vec![
                TraceCommand::Down(KeyCode::from("KeyD")),
                TraceCommand::Tick {
                    step: Duration::from_millis(17),
                    count: 3
                },
                TraceCommand::Up(KeyCode::from("KeyD")),
                TraceCommand::Key(KeyEvent::symbol(
                    KeySymbol::Char('z'),
                    Modifiers::CONTROL | Modifiers::SHIFT
                )),
                TraceCommand::Paste("f \"x\"".to_string()),
                TraceCommand::Dump,
            ]
        );
    }

    #[test]
    fn test_parse_key_specs() {
        assert_eq!(
            parse_key("ctrl++").unwrap(),
            KeyEvent::symbol(KeySymbol::Char('+'), Modifiers::CONTROL)
        );
        assert_eq!(
            parse_key("Shift+Left").unwrap(),
            KeyEvent::symbol(KeySymbol::Left, Modifiers::SHIFT)
        );
        assert!(parse_key("hyper+a").is_err());
        assert!(parse_key("ctrl+nonsense").is_err());
    }

    #[test]
    fn test_errors_name_the_line() {
        let err = parse("dump\ntick soon\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Trace line 2"));
        assert!(parse("wiggle").is_err());
        assert!(parse("paste unquoted").is_err());
        assert!(parse("down").is_err());
    }

    #[test]
    fn test_replay_with_in_memory_clipboard() {
        let trace = "\
down KeyS
tick 17
down KeyD
tick 17
up KeyS
down KeyU
tick 17
up KeyD
up KeyU
tick 17
key ctrl+a
key ctrl+c
key End
key ctrl+v
text \"wall splat\"
dump
";
        let mut replayer = Replayer::new(CommandSession::new(Config::default()));
        replayer.run(&parse(trace).unwrap());
        assert_eq!(replayer.clipboard(), Some("d df f 1"));
        assert_eq!(
            replayer.dumps(),
            &["d df f 1 d df f 1 \"wall splat\"".to_string()]
        );
    }

    #[test]
    fn test_paste_with_empty_clipboard_is_ignored() {
        let mut replayer = Replayer::new(CommandSession::new(Config::default()));
        replayer.run(&parse("key ctrl+v\ndump").unwrap());
        assert_eq!(replayer.dumps(), &[String::new()]);
    }
}
