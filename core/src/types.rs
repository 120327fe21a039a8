//! Shared primitive types used across the entire game core.

/// Game time in seconds since the session clock started.
pub type Seconds = f64;

/// A position in the session lineup (0 = first customer through the door).
pub type LineupIndex = usize;

/// A lane on a chase course, 0 = leftmost.
pub type Lane = usize;

/// The canonical session identifier.
pub type SessionId = String;
