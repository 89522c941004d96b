//! Coloured terminal output

use std::fmt::Display;

use owo_colors::{OwoColorize, colors::css};
use tracelink::Warning;

/// Whether stdout accepts colours.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Extension trait for colorizing output
pub trait Colorize: Display {
    /// Colour as success (green)
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    /// Colour as warning (amber)
    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    /// Colour as error (red)
    fn error(&self) -> String {
        paint(self, |s| s.fg::<css::Red>().to_string())
    }

    /// Colour as info (blue)
    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    /// Dim the text
    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

impl<T: Display + ?Sized> Colorize for T {}

fn paint<T: Display + ?Sized>(value: &T, style: impl FnOnce(&str) -> String) -> String {
    let plain = value.to_string();
    if supports_color() { style(&plain) } else { plain }
}

/// Prints a section of warnings, if there are any.
pub fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("{}", format!("{} warning(s):", warnings.len()).warning());
    for warning in warnings {
        println!("  {} {warning}", "!".warning());
    }
}
