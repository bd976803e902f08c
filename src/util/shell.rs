//! Shell output for the CLI.
//!
//! Status lines go to stderr as `{status:>12} {message}`. Long external steps
//! get an `indicatif` spinner when stderr is a terminal; verbose mode
//! replaces spinners with plain status lines so command logs stay readable.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: no status lines or progress
    Quiet,
    /// Default: status messages + spinners
    #[default]
    Normal,
    /// --verbose: status lines only, no spinners
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Configuring,
    Building,
    Installing,
    Exported,
    Removed,
    Finished,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Installing => "Installing",
            Status::Exported => "Exported",
            Status::Removed => "Removed",
            Status::Finished => "Finished",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Exported | Status::Removed | Status::Finished => "\x1b[1;32m",
            Status::Configuring | Status::Building | Status::Installing => "\x1b[1;36m",
        }
    }
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
    interactive: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let interactive = io::stderr().is_terminal();
        let use_color = match color {
            ColorChoice::Auto => interactive,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            verbosity,
            use_color,
            interactive,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, no_color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        let color = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Shell::new(verbosity, color)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status line unless quiet.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), status.as_str())
        } else {
            format!("{:>12}", status.as_str())
        }
    }

    /// Start a step that blocks on an external tool.
    pub fn step(&self, status: Status, msg: impl Display) -> Step<'_> {
        let message = msg.to_string();
        let spinner = if self.verbosity == Verbosity::Normal && self.interactive {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:>10} {msg} {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_prefix(status.as_str());
            bar.set_message(message.clone());
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        } else {
            self.status(status, &message);
            None
        };

        Step {
            shell: self,
            status,
            message,
            spinner,
            start: Instant::now(),
        }
    }
}

/// A running step; clears its spinner when finished or dropped.
pub struct Step<'a> {
    shell: &'a Shell,
    status: Status,
    message: String,
    spinner: Option<ProgressBar>,
    start: Instant,
}

impl Step<'_> {
    /// Replace the spinner with a status line carrying the elapsed time.
    pub fn finish(mut self) {
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
            self.shell.status(
                self.status,
                format!("{} ({:.1}s)", self.message, self.start.elapsed().as_secs_f64()),
            );
        }
    }
}

impl Drop for Step<'_> {
    fn drop(&mut self) {
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbose() {
        let shell = Shell::from_flags(true, true, true);
        assert!(shell.is_quiet());
        assert!(!shell.use_color());
    }

    #[test]
    fn test_status_alignment_without_color() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        assert_eq!(shell.format_status(Status::Building), "    Building");
        assert_eq!(shell.format_status(Status::Finished), "    Finished");
    }
}
