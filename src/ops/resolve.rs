//! Option resolution shared by every command.
//!
//! Layers, lowest to highest: recipe defaults, `[options]` from the merged
//! config, then `-o key=value` flags in the order given.

use anyhow::{Context, Result};

use crate::core::manifest::ProjectIdentity;
use crate::core::options::{parse_override, OptionOverrides, OptionSet};
use crate::util::{Config, GlobalContext};

/// Merge config `[options]` and raw CLI overrides into one override map.
pub fn collect_overrides(config: &Config, cli: &[String]) -> Result<OptionOverrides> {
    let mut overrides = config.option_overrides();
    for raw in cli {
        let (key, value) =
            parse_override(raw).with_context(|| format!("invalid option override `{}`", raw))?;
        overrides.insert(key, value);
    }
    Ok(overrides)
}

/// Resolve the option set for this recipe.
pub fn resolve_options(config: &Config, cli: &[String]) -> Result<OptionSet> {
    let overrides = collect_overrides(config, cli)?;
    OptionSet::resolve(OptionSet::default(), &overrides).context("failed to resolve options")
}

/// Open the recipe's `CMakeLists.txt` without parsing it yet.
pub fn load_identity(ctx: &GlobalContext) -> Result<ProjectIdentity> {
    ProjectIdentity::from_path(&ctx.manifest_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{InvalidOptionError, OptionValue};

    fn cli(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_overrides_win_over_config() {
        let mut config = Config::default();
        config
            .options
            .insert("build_ffi".into(), toml::Value::Boolean(true));
        config
            .options
            .insert("shared".into(), toml::Value::Boolean(true));

        let overrides = collect_overrides(&config, &cli(&["shared=false"])).unwrap();
        assert_eq!(overrides["build_ffi"], OptionValue::Bool(true));
        assert_eq!(overrides["shared"], OptionValue::Text("false".into()));

        let options = resolve_options(&config, &cli(&["shared=false"])).unwrap();
        assert!(options.build_ffi);
        assert!(!options.shared);
        assert!(options.with_default_logger);
    }

    #[test]
    fn test_last_cli_override_wins() {
        let options =
            resolve_options(&Config::default(), &cli(&["build_ffi=on", "build_ffi=off"])).unwrap();
        assert!(!options.build_ffi);
    }

    #[test]
    fn test_bad_config_value_is_reported() {
        let mut config = Config::default();
        config
            .options
            .insert("fPIC".into(), toml::Value::Integer(3));

        let err = resolve_options(&config, &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InvalidOptionError>(),
            Some(InvalidOptionError::NotBoolean { .. })
        ));
    }

    #[test]
    fn test_malformed_cli_override() {
        let err = resolve_options(&Config::default(), &cli(&["shared"])).unwrap_err();
        assert!(err.downcast_ref::<InvalidOptionError>().is_some());
    }
}
