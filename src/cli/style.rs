//! Terminal styling helpers
//!
//! Thin wrappers over owo-colors so commands read as intent
//! (`.muted()`, `.emphasis()`) rather than color names. Output goes through
//! anstream, which strips styling when not writing to a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;

/// Intent-named styling on anything displayable
pub trait Stylize {
    /// Secondary/informational text
    fn muted(&self) -> String;
    /// The headline of a message
    fn emphasis(&self) -> String;
    /// Identifiers: PR numbers, branch names, issue numbers
    fn accent(&self) -> String;
    /// Something went right
    fn success(&self) -> String;
    /// Something needs attention
    fn warn(&self) -> String;
    /// Something is blocking
    fn alert(&self) -> String;
}

impl<T: std::fmt::Display + OwoColorize> Stylize for T {
    fn muted(&self) -> String {
        format!("{}", self.dimmed())
    }

    fn emphasis(&self) -> String {
        format!("{}", self.bold())
    }

    fn accent(&self) -> String {
        format!("{}", self.cyan())
    }

    fn success(&self) -> String {
        format!("{}", self.green())
    }

    fn warn(&self) -> String {
        format!("{}", self.yellow())
    }

    fn alert(&self) -> String {
        format!("{}", self.red())
    }
}

/// Green check glyph
pub fn check() -> String {
    "✓".green().to_string()
}

/// Muted arrow glyph
pub fn arrow() -> String {
    "→".dimmed().to_string()
}

/// Spinner template shared by all progress bars
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
