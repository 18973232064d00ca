//! Error recovery bookkeeping for the parser.
//!
//! Syntax errors are fatal to the statement being parsed; recovery skips
//! to a resynchronization point (the next statement boundary) so one run
//! can surface multiple independent syntax errors.

/// Tracks how much recovery has been attempted during one parse.
#[derive(Debug, Clone)]
pub struct RecoveryManager {
    attempts: usize,
    max_attempts: usize,
}

impl RecoveryManager {
    /// Default cap on recovery attempts before the parse gives up.
    pub const DEFAULT_MAX_ATTEMPTS: usize = 25;

    pub fn new() -> Self {
        RecoveryManager {
            attempts: 0,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_limit(max_attempts: usize) -> Self {
        RecoveryManager {
            attempts: 0,
            max_attempts,
        }
    }

    /// Record one recovery attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Whether the recovery budget has been exhausted.
    pub fn limit_reached(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Number of recovery attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl Default for RecoveryManager {
    fn default() -> Self {
        Self::new()
    }
}
