//! Recipe options and their resolution.
//!
//! Options are plain booleans. Overrides arrive either from the config file
//! (`[options]` table) or from the command line (`-o build_ffi=true`) and are
//! layered over the declared defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// A recognized option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    Shared,
    Fpic,
    WithTestDeps,
    BuildFfi,
    WithDefaultLogger,
}

impl OptionKey {
    pub const ALL: [OptionKey; 5] = [
        OptionKey::Shared,
        OptionKey::Fpic,
        OptionKey::WithTestDeps,
        OptionKey::BuildFfi,
        OptionKey::WithDefaultLogger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::Shared => "shared",
            OptionKey::Fpic => "fPIC",
            OptionKey::WithTestDeps => "with_test_deps",
            OptionKey::BuildFfi => "build_ffi",
            OptionKey::WithDefaultLogger => "with_default_logger",
        }
    }

    /// One-line description shown by `pkgrecipe inspect`.
    pub fn help(&self) -> &'static str {
        match self {
            OptionKey::Shared => "build shared instead of static libraries",
            OptionKey::Fpic => "compile position-independent code",
            OptionKey::WithTestDeps => "require the test framework",
            OptionKey::BuildFfi => "build the C bindings (`ffi` component)",
            OptionKey::WithDefaultLogger => "build the default logger (`default-logger` component)",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = InvalidOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| InvalidOptionError::UnknownKey {
                key: s.to_string(),
                suggestion: closest_key(s),
            })
    }
}

/// Error for an override that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum InvalidOptionError {
    #[error("unknown option `{key}`")]
    #[diagnostic(code(pkgrecipe::options::unknown))]
    UnknownKey {
        key: String,
        #[help]
        suggestion: Option<String>,
    },

    #[error("option `{key}` expects a boolean, found `{found}`")]
    #[diagnostic(
        code(pkgrecipe::options::not_boolean),
        help("use `true` or `false`")
    )]
    NotBoolean { key: String, found: String },

    #[error("malformed option override `{0}`")]
    #[diagnostic(
        code(pkgrecipe::options::malformed),
        help("overrides are written as `key=value`, e.g. `build_ffi=true`")
    )]
    Malformed(String),
}

/// Shortest fragment worth matching inside a longer key.
const MIN_FRAGMENT_LEN: usize = 3;

fn closest_key(input: &str) -> Option<String> {
    let lowered = input.to_ascii_lowercase();
    let fragment_of =
        |short: &str, long: &str| short.len() >= MIN_FRAGMENT_LEN && long.contains(short);
    OptionKey::ALL
        .into_iter()
        .find(|key| key.as_str().eq_ignore_ascii_case(input))
        .or_else(|| {
            OptionKey::ALL.into_iter().find(|key| {
                let candidate = key.as_str().to_ascii_lowercase();
                fragment_of(&lowered, &candidate) || fragment_of(&candidate, &lowered)
            })
        })
        .map(|key| format!("did you mean `{}`?", key))
}

/// An override value before type checking.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    /// Text from the command line; accepted if it spells a boolean.
    Text(String),
    /// Any other typed value (e.g. a TOML integer), always rejected.
    Other(String),
}

impl OptionValue {
    fn as_bool(&self, key: &str) -> Result<bool, InvalidOptionError> {
        let not_boolean = |found: &str| InvalidOptionError::NotBoolean {
            key: key.to_string(),
            found: found.to_string(),
        };
        match self {
            OptionValue::Bool(b) => Ok(*b),
            OptionValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Ok(true),
                "false" | "0" | "off" => Ok(false),
                _ => Err(not_boolean(s)),
            },
            OptionValue::Other(s) => Err(not_boolean(s)),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&toml::Value> for OptionValue {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::Boolean(b) => OptionValue::Bool(*b),
            other => OptionValue::Other(other.to_string()),
        }
    }
}

/// Partial mapping of option overrides, keyed by option name.
pub type OptionOverrides = BTreeMap<String, OptionValue>;

/// Parse a `key=value` override from the command line.
pub fn parse_override(raw: &str) -> Result<(String, OptionValue), InvalidOptionError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| InvalidOptionError::Malformed(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(InvalidOptionError::Malformed(raw.to_string()));
    }
    Ok((key.to_string(), OptionValue::Text(value.trim().to_string())))
}

/// Fully resolved option set. Every key has a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OptionSet {
    pub shared: bool,
    #[serde(rename = "fPIC")]
    pub fpic: bool,
    pub with_test_deps: bool,
    pub build_ffi: bool,
    pub with_default_logger: bool,
}

impl Default for OptionSet {
    fn default() -> Self {
        OptionSet {
            shared: false,
            fpic: true,
            with_test_deps: false,
            build_ffi: false,
            with_default_logger: true,
        }
    }
}

impl OptionSet {
    pub fn get(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Shared => self.shared,
            OptionKey::Fpic => self.fpic,
            OptionKey::WithTestDeps => self.with_test_deps,
            OptionKey::BuildFfi => self.build_ffi,
            OptionKey::WithDefaultLogger => self.with_default_logger,
        }
    }

    pub fn set(&mut self, key: OptionKey, value: bool) {
        match key {
            OptionKey::Shared => self.shared = value,
            OptionKey::Fpic => self.fpic = value,
            OptionKey::WithTestDeps => self.with_test_deps = value,
            OptionKey::BuildFfi => self.build_ffi = value,
            OptionKey::WithDefaultLogger => self.with_default_logger = value,
        }
    }

    /// All options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, bool)> + '_ {
        OptionKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// Layer `overrides` over `defaults`.
    ///
    /// Fails on the first unknown key or non-boolean value; no partial result
    /// is returned.
    pub fn resolve(
        defaults: OptionSet,
        overrides: &OptionOverrides,
    ) -> Result<OptionSet, InvalidOptionError> {
        let mut resolved = defaults;
        for (key, value) in overrides {
            let option: OptionKey = key.parse()?;
            resolved.set(option, value.as_bool(key)?);
        }
        tracing::debug!(?resolved, "resolved options");
        Ok(resolved)
    }
}
