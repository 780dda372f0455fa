//! Terminal output.
//!
//! A CI runner is non-interactive by nature: there are no prompts, only
//! messages. [`Output`] routes them to stdout/stderr with the theme
//! applied, honoring `--quiet`.

pub mod theme;

pub use theme::CairnTheme;

/// Message sink for commands.
#[derive(Debug)]
pub struct Output {
    theme: CairnTheme,
    quiet: bool,
}

impl Output {
    /// Create an output sink. `color: false` selects the plain theme.
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            theme: if color {
                CairnTheme::new()
            } else {
                CairnTheme::plain()
            },
            quiet,
        }
    }

    pub fn theme(&self) -> &CairnTheme {
        &self.theme
    }

    /// Informational message; suppressed by `--quiet`.
    pub fn message(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Payload output (reports, JSON); never suppressed.
    pub fn raw(&self, msg: &str) {
        println!("{}", msg);
    }

    /// Error message to stderr; never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_output_still_exposes_theme() {
        let out = Output::new(false, true);
        assert_eq!(out.theme().format_success("x"), "✓ x");
    }
}
