//! # Terminal Output
//!
//! Styling for the reports pasta prints to stdout: the dry-run report and
//! the run summary. Log lines go through `log` and are not styled here.
//!
//! Color is decided once per run from `--color` and the environment:
//!
//! - `NO_COLOR` (any value) disables color, see <https://no-color.org/>
//! - `CLICOLOR=0` disables color
//! - `CLICOLOR_FORCE=1` forces color even when stdout is not a terminal
//! - `TERM=dumb` disables color

use std::env;
use std::fmt::Display;

use clap::ValueEnum;
use console::Style;

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// How reports are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    pub fn new(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => detect_color_support(),
        };
        Self { use_color }
    }

    /// Plain output, used by tests and when writing to files.
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Marks a successful item.
    pub fn success<D: Display>(&self, text: D) -> String {
        self.paint(Style::new().green(), text)
    }

    /// Marks a failed item.
    pub fn failure<D: Display>(&self, text: D) -> String {
        self.paint(Style::new().red().bold(), text)
    }

    /// De-emphasizes secondary detail such as provenance.
    pub fn dim<D: Display>(&self, text: D) -> String {
        self.paint(Style::new().dim(), text)
    }

    pub fn heading<D: Display>(&self, text: D) -> String {
        self.paint(Style::new().bold(), text)
    }

    fn paint<D: Display>(&self, style: Style, text: D) -> String {
        if self.use_color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn detect_color_support() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}
