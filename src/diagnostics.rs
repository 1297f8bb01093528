use std::fmt::Display;

use log::warn;

/// Recoverable conditions raised while drawing. The offending write is
/// skipped and the buffer is left as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    TileOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    BlockOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::TileOutOfRange {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Attempt to draw tile in out-of-range position {}, {}: the image buffer is only {} x {} pixels",
                x, y, width, height
            ),
            Diagnostic::BlockOutOfRange {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Block coordinates {}, {} out of range for {} x {} image buffer",
                x, y, width, height
            ),
        }
    }
}

impl std::error::Error for Diagnostic {}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        warn!("{}", diagnostic);
    }
}

impl<F: FnMut(&Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}
