//! Terminal capability detection and utilities

use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled on stderr
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stderr).is_some()
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as error (red)
    fn error(&self) -> String;
    /// Color as success (green)
    fn success(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn error(&self) -> String {
        if supports_color() {
            self.fg::<css::Red>().bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn error(&self) -> String {
        self.as_str().error()
    }

    fn success(&self) -> String {
        self.as_str().success()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
