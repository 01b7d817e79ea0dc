//! Themed progress messages on stderr.
//!
//! Colour is applied only when stderr is a terminal. `quiet` suppresses
//! everything except errors.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Kind of message, which decides its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Header,
    Info,
    Success,
    Warn,
    Error,
}

/// Writes operator messages to a sink, stderr by default.
pub struct Output {
    quiet: bool,
    color: bool,
    sink: Box<dyn Write + Send>,
}

impl Output {
    /// Output to stderr, coloured when stderr is a terminal.
    pub fn stderr(quiet: bool) -> Self {
        Self {
            quiet,
            color: io::stderr().is_terminal(),
            sink: Box::new(io::stderr()),
        }
    }

    /// Output to an arbitrary sink without colour.
    pub fn to_writer(quiet: bool, sink: Box<dyn Write + Send>) -> Self {
        Self {
            quiet,
            color: false,
            sink,
        }
    }

    pub fn header(&mut self, msg: impl AsRef<str>) {
        self.emit(MessageKind::Header, msg.as_ref());
    }

    pub fn info(&mut self, msg: impl AsRef<str>) {
        self.emit(MessageKind::Info, msg.as_ref());
    }

    pub fn success(&mut self, msg: impl AsRef<str>) {
        self.emit(MessageKind::Success, msg.as_ref());
    }

    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.emit(MessageKind::Warn, msg.as_ref());
    }

    pub fn error(&mut self, msg: impl AsRef<str>) {
        self.emit(MessageKind::Error, msg.as_ref());
    }

    fn emit(&mut self, kind: MessageKind, msg: &str) {
        if self.quiet && kind != MessageKind::Error {
            return;
        }
        let line = if self.color {
            match kind {
                MessageKind::Header => msg.bold().cyan().to_string(),
                MessageKind::Info => msg.to_string(),
                MessageKind::Success => msg.green().to_string(),
                MessageKind::Warn => msg.yellow().to_string(),
                MessageKind::Error => msg.red().bold().to_string(),
            }
        } else {
            msg.to_string()
        };
        let _ = writeln!(self.sink, "{}", line);
    }
}
