//! Project identity from a `CMakeLists.txt` project declaration.
//!
//! The upstream library describes itself with a single CMake call:
//!
//! ```cmake
//! project(dice-copperr VERSION 0.3.0
//!         LANGUAGES CXX
//!         DESCRIPTION "A persistent memory allocator")
//! ```
//!
//! Only the `project(...)` call is understood. It is located with a small
//! scanner that skips `#` comments and quoted strings and tracks balanced
//! parentheses, so line breaks and unrelated clauses inside the call are fine.
//! Escaped quotes inside the description are not supported.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use miette::Diagnostic;
use regex::Regex;
use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// Project names are letters and hyphens only.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\-]+$").expect("valid name pattern"));

/// Exactly three dot-separated numeric components, no leading zeros.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)$").expect("valid version pattern")
});

/// Error while recovering identity from manifest text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ManifestParseError {
    #[error("no `project(...)` declaration found")]
    #[diagnostic(
        code(pkgrecipe::manifest::no_project),
        help("add `project(<name> VERSION <x.y.z> DESCRIPTION \"...\")` to CMakeLists.txt")
    )]
    MissingDeclaration,

    #[error("`project(` declaration is never closed")]
    #[diagnostic(code(pkgrecipe::manifest::unterminated))]
    Unterminated,

    #[error("`project(...)` declaration has no project name")]
    #[diagnostic(code(pkgrecipe::manifest::no_name))]
    MissingName,

    #[error("invalid project name `{0}`")]
    #[diagnostic(
        code(pkgrecipe::manifest::invalid_name),
        help("project names may only contain letters and hyphens")
    )]
    InvalidName(String),

    #[error("`project(...)` declaration has no VERSION clause")]
    #[diagnostic(code(pkgrecipe::manifest::no_version))]
    MissingVersion,

    #[error("invalid project version `{0}`")]
    #[diagnostic(
        code(pkgrecipe::manifest::invalid_version),
        help("the version must be MAJOR.MINOR.PATCH, e.g. `1.4.0`")
    )]
    InvalidVersion(String),

    #[error("`project(...)` declaration has no DESCRIPTION clause")]
    #[diagnostic(code(pkgrecipe::manifest::no_description))]
    MissingDescription,

    #[error("DESCRIPTION `{0}` must be a quoted string")]
    #[diagnostic(code(pkgrecipe::manifest::unquoted_description))]
    UnquotedDescription(String),
}

/// Project identity recovered from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub name: String,
    pub version: Version,
    pub description: String,
}

impl Manifest {
    /// Parse all three identity fields from manifest text.
    pub fn extract(text: &str) -> Result<Self, ManifestParseError> {
        let args = project_arguments(text)?;
        Ok(Manifest {
            name: name_from(&args)?,
            version: version_from(&args)?,
            description: description_from(&args)?,
        })
    }
}

/// Resolution state of a single identity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Unset,
    Resolved,
    Failed,
}

/// One lazily resolved field. `None` means the lookup has not run yet.
#[derive(Debug, Clone)]
struct Memo<T>(Option<Result<T, ManifestParseError>>);

impl<T> Memo<T> {
    fn new() -> Self {
        Memo(None)
    }

    fn get_or_resolve(
        &mut self,
        resolve: impl FnOnce() -> Result<T, ManifestParseError>,
    ) -> Result<&T, ManifestParseError> {
        self.0.get_or_insert_with(resolve).as_ref().map_err(Clone::clone)
    }

    fn state(&self) -> LookupState {
        match self.0 {
            None => LookupState::Unset,
            Some(Ok(_)) => LookupState::Resolved,
            Some(Err(_)) => LookupState::Failed,
        }
    }
}

/// Lazily parsed identity of the project being packaged.
///
/// Name, version and description are looked up independently: a manifest
/// without a DESCRIPTION still yields a name and version. Each lookup runs at
/// most once; its outcome (value or error) is kept for the lifetime of the
/// identity.
#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    text: String,
    name: Memo<String>,
    version: Memo<Version>,
    description: Memo<String>,
}

impl ProjectIdentity {
    /// Wrap manifest text. Nothing is parsed until a field is requested.
    pub fn new(text: impl Into<String>) -> Self {
        ProjectIdentity {
            text: text.into(),
            name: Memo::new(),
            version: Memo::new(),
            description: Memo::new(),
        }
    }

    /// Read a manifest file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn name(&mut self) -> Result<&str, ManifestParseError> {
        let text = &self.text;
        self.name
            .get_or_resolve(|| name_from(&project_arguments(text)?))
            .map(String::as_str)
    }

    pub fn version(&mut self) -> Result<&Version, ManifestParseError> {
        let text = &self.text;
        self.version
            .get_or_resolve(|| version_from(&project_arguments(text)?))
    }

    pub fn description(&mut self) -> Result<&str, ManifestParseError> {
        let text = &self.text;
        self.description
            .get_or_resolve(|| description_from(&project_arguments(text)?))
            .map(String::as_str)
    }

    /// Resolve every field and assemble a [`Manifest`].
    pub fn manifest(&mut self) -> Result<Manifest, ManifestParseError> {
        Ok(Manifest {
            name: self.name()?.to_string(),
            version: self.version()?.clone(),
            description: self.description()?.to_string(),
        })
    }

    /// Lookup states as `(name, version, description)`.
    pub fn states(&self) -> (LookupState, LookupState, LookupState) {
        (
            self.name.state(),
            self.version.state(),
            self.description.state(),
        )
    }
}

/// A single argument of a CMake command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Argument<'a> {
    Unquoted(&'a str),
    Quoted(&'a str),
}

impl<'a> Argument<'a> {
    fn text(&self) -> &'a str {
        match *self {
            Argument::Unquoted(s) | Argument::Quoted(s) => s,
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(*self, Argument::Unquoted(s) if s == keyword)
    }
}

fn name_from(args: &[Argument<'_>]) -> Result<String, ManifestParseError> {
    match args.first() {
        Some(Argument::Unquoted(name)) if NAME_PATTERN.is_match(name) => Ok(name.to_string()),
        Some(other) => Err(ManifestParseError::InvalidName(other.text().to_string())),
        None => Err(ManifestParseError::MissingName),
    }
}

fn version_from(args: &[Argument<'_>]) -> Result<Version, ManifestParseError> {
    let raw = keyword_value(args, "VERSION").ok_or(ManifestParseError::MissingVersion)?;
    let raw = raw.text();
    if !VERSION_PATTERN.is_match(raw) {
        return Err(ManifestParseError::InvalidVersion(raw.to_string()));
    }
    Version::parse(raw).map_err(|_| ManifestParseError::InvalidVersion(raw.to_string()))
}

fn description_from(args: &[Argument<'_>]) -> Result<String, ManifestParseError> {
    match keyword_value(args, "DESCRIPTION") {
        Some(Argument::Quoted("")) | None => Err(ManifestParseError::MissingDescription),
        Some(Argument::Quoted(text)) => Ok(text.to_string()),
        Some(Argument::Unquoted(text)) => {
            Err(ManifestParseError::UnquotedDescription(text.to_string()))
        }
    }
}

/// The argument following `keyword`, skipping the project name.
fn keyword_value<'a>(args: &[Argument<'a>], keyword: &str) -> Option<Argument<'a>> {
    let at = args.iter().skip(1).position(|a| a.is_keyword(keyword))? + 1;
    args.get(at + 1).copied()
}

/// Whether `text` contains a top-level `project(` call.
pub fn declares_project(text: &str) -> bool {
    find_project_call(text).is_some()
}

/// Locate the first `project(` call and split its arguments.
fn project_arguments(text: &str) -> Result<Vec<Argument<'_>>, ManifestParseError> {
    let open = find_project_call(text).ok_or(ManifestParseError::MissingDeclaration)?;
    split_arguments(text, open)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte offset just past the `(` of the first top-level `project` command.
fn find_project_call(text: &str) -> Option<usize> {
    const COMMAND: &[u8] = b"project";
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => i = skip_comment(bytes, i),
            b'"' => i = closing_quote(bytes, i).map_or(bytes.len(), |end| end + 1),
            _ if bytes[i..].len() >= COMMAND.len()
                && bytes[i..i + COMMAND.len()].eq_ignore_ascii_case(COMMAND)
                && (i == 0 || !is_ident_byte(bytes[i - 1])) =>
            {
                let mut j = i + COMMAND.len();
                while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
                    j += 1;
                }
                if bytes.get(j) == Some(&b'(') {
                    return Some(j + 1);
                }
                i = j.max(i + 1);
            }
            _ => i += 1,
        }
    }

    None
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |n| start + n + 1)
}

/// Index of the quote closing the string that opens at `open`.
fn closing_quote(bytes: &[u8], open: usize) -> Option<usize> {
    bytes[open + 1..]
        .iter()
        .position(|&b| b == b'"')
        .map(|n| open + 1 + n)
}

/// Split the argument list starting at `start` up to its balancing `)`.
///
/// Nested unquoted parentheses only affect depth; they do not produce
/// arguments of their own.
fn split_arguments(text: &str, start: usize) -> Result<Vec<Argument<'_>>, ManifestParseError> {
    let bytes = text.as_bytes();
    let mut args = Vec::new();
    let mut depth = 1usize;
    let mut i = start;

    loop {
        let Some(&b) = bytes.get(i) else {
            return Err(ManifestParseError::Unterminated);
        };

        match b {
            b'#' => i = skip_comment(bytes, i),
            b'"' => {
                let end = closing_quote(bytes, i).ok_or(ManifestParseError::Unterminated)?;
                args.push(Argument::Quoted(&text[i + 1..end]));
                i = end + 1;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(args);
                }
                i += 1;
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let end = bytes[i..]
                    .iter()
                    .position(|&c| c.is_ascii_whitespace() || matches!(c, b'(' | b')' | b'"' | b'#'))
                    .map_or(bytes.len(), |n| i + n);
                args.push(Argument::Unquoted(&text[i..end]));
                i = end;
            }
        }
    }
}
