//! Process-level error type.
//!
//! Every fatal condition carries the exit code the binary reports:
//!
//! - `2` configuration (unknown zone/kind, bad flags, missing API key)
//! - `3` filesystem (arrays, column docs, skip logs, summaries)
//! - `4` provider setup
//! - `5` internal consistency (year array shape mismatch)
//!
//! Upstream data-availability problems never become an `AppError`; the
//! fetcher degrades them to "no data" instead.

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_IO: u8 = 3;
pub const EXIT_PROVIDER: u8 = 4;
pub const EXIT_SHAPE: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(EXIT_PROVIDER, message)
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(EXIT_SHAPE, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
