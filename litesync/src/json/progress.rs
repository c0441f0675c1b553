//! Progress notifications for long imports and exports.

use std::fmt;

/// Which engine is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// JSON into a database.
    Import,
    /// Database into JSON.
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// Receives progress messages, synchronously, at per-table checkpoints.
///
/// Closures taking `(Direction, &str)` implement this trait.
///
/// # Examples
///
/// ```
/// use litesync::{Direction, ProgressSink};
/// use std::cell::RefCell;
///
/// let seen = RefCell::new(Vec::new());
/// let sink = |direction: Direction, message: &str| {
///     seen.borrow_mut().push(format!("{direction}: {message}"));
/// };
/// sink.report(Direction::Export, "table users exported");
/// assert_eq!(seen.borrow()[0], "export: table users exported");
/// ```
pub trait ProgressSink {
    /// Called once per checkpoint.
    fn report(&self, direction: Direction, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(Direction, &str),
{
    fn report(&self, direction: Direction, message: &str) {
        self(direction, message);
    }
}

/// A sink that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _direction: Direction, _message: &str) {}
}
