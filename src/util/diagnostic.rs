//! User-friendly diagnostic messages.
//!
//! Every error printed by the CLI carries its root cause, the chain of
//! context that led to it, and a suggested fix where one is known.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;

use crate::builder::cmake::BuildError;
use crate::core::component::ComponentGraphError;
use crate::core::manifest::ManifestParseError;
use crate::core::options::InvalidOptionError;
use crate::util::context::ManifestNotFound;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "run pkgrecipe inside the library's source tree";

    /// Suggestion when an option is rejected.
    pub const LIST_OPTIONS: &str = "run `pkgrecipe inspect` to list the recognized options";

    /// Suggestion when the external build fails.
    pub const BUILD_FAILED: &str = "run `pkgrecipe package --verbose` for the full command lines";
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Stable error code, if the error has one
    pub code: Option<String>,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            code: None,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Build from an error chain.
    ///
    /// The outermost message becomes the headline; the inner causes become
    /// context lines. Code and help text come from the first recipe error in
    /// the chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let mut diag = Diagnostic::error(err.to_string());
        for cause in err.chain().skip(1) {
            diag = diag.with_context(cause.to_string());
        }

        if let Some(inner) = recipe_diagnostic(err) {
            diag.code = inner.code().map(|c| c.to_string());
            if let Some(help) = inner.help() {
                diag = diag.with_suggestion(help.to_string());
            }
        }

        if let Some(extra) = follow_up(err) {
            diag = diag.with_suggestion(extra);
        }

        diag
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let label = if color {
            "\x1b[1;31merror\x1b[0m"
        } else {
            "error"
        };

        match self.code {
            Some(ref code) => {
                output.push_str(&format!("{}[{}]: {}\n", label, code, self.message))
            }
            None => output.push_str(&format!("{}: {}\n", label, self.message)),
        }

        for ctx in &self.context {
            output.push_str(&format!("  caused by: {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            for suggestion in &self.suggestions {
                output.push_str(&format!("{}: {}\n", help_prefix, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// First error in the chain that carries a stable code.
fn recipe_diagnostic(err: &anyhow::Error) -> Option<&dyn MietteDiagnostic> {
    err.chain().find_map(as_recipe_diagnostic)
}

fn as_recipe_diagnostic<'a>(
    cause: &'a (dyn std::error::Error + 'static),
) -> Option<&'a dyn MietteDiagnostic> {
    if let Some(e) = cause.downcast_ref::<ManifestParseError>() {
        Some(e)
    } else if let Some(e) = cause.downcast_ref::<InvalidOptionError>() {
        Some(e)
    } else if let Some(e) = cause.downcast_ref::<BuildError>() {
        Some(e)
    } else if let Some(e) = cause.downcast_ref::<ComponentGraphError>() {
        Some(e)
    } else if let Some(e) = cause.downcast_ref::<ManifestNotFound>() {
        Some(e)
    } else {
        None
    }
}

/// Extra pointers for errors where the next step is another command.
fn follow_up(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if cause.is::<InvalidOptionError>() {
            Some(suggestions::LIST_OPTIONS)
        } else if matches!(
            cause.downcast_ref::<BuildError>(),
            Some(BuildError::BuildFailure { .. } | BuildError::InstallFailure { .. })
        ) {
            Some(suggestions::BUILD_FAILED)
        } else if cause.is::<ManifestNotFound>() {
            Some(suggestions::NO_MANIFEST)
        } else {
            None
        }
    })
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
