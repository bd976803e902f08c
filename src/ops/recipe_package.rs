//! Implementation of `pkgrecipe package`.
//!
//! Resolve options, run configure/build/install through the build tool,
//! shape the installed tree and record what was produced in
//! `package-info.json`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Serialize;

use crate::builder::cmake::{BuildOrchestrator, BuildSettings, BuildTool, BuildType, CMakeTool};
use crate::builder::layout::{finalize, LayoutReport};
use crate::core::component::PackageDescriptor;
use crate::core::options::OptionSet;
use crate::core::recipe::{requirements, PackageRequirement};
use crate::ops::resolve::{load_identity, resolve_options};
use crate::util::fs::{relative_path, remove_dir_all_if_exists, write_string};
use crate::util::shell::{Shell, Status};
use crate::util::GlobalContext;

/// File written into the package root after a successful run.
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

/// Options for the package command. Unset fields fall back to config.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Raw `key=value` option overrides
    pub overrides: Vec<String>,

    pub build_type: Option<BuildType>,

    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Absolute package folder; defaults to the context's package dir
    pub package_dir: Option<PathBuf>,
}

/// Contents of `package-info.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: Version,
    pub description: String,
    pub build_type: BuildType,
    pub options: OptionSet,
    pub requirements: Vec<PackageRequirement>,
    pub package: PackageDescriptor,
    pub layout: LayoutReport,
}

/// Result of a package run.
#[derive(Debug)]
pub struct PackageResult {
    pub package_dir: PathBuf,
    pub info_path: PathBuf,
    pub info: PackageInfo,
}

/// Package with the `cmake` found via config or `PATH`.
pub fn package(ctx: &GlobalContext, opts: &PackageOptions, shell: &Shell) -> Result<PackageResult> {
    let tool = CMakeTool::locate(ctx.config().build.cmake.clone())?;
    package_with(ctx, opts, tool, shell)
}

/// Package with an explicit build tool.
pub fn package_with<T: BuildTool>(
    ctx: &GlobalContext,
    opts: &PackageOptions,
    tool: T,
    shell: &Shell,
) -> Result<PackageResult> {
    let config = ctx.config();
    let options = resolve_options(config, &opts.overrides)?;

    let manifest_path = ctx.manifest_path();
    let manifest = load_identity(ctx)?.manifest().with_context(|| {
        format!(
            "failed to read project identity from {}",
            manifest_path.display()
        )
    })?;

    // Fail on a bad graph before spending time in the build tool
    let descriptor = PackageDescriptor::build(&manifest.name, &options)?;

    let build_type = opts
        .build_type
        .or(config.build.build_type)
        .unwrap_or_default();
    let package_dir = opts
        .package_dir
        .clone()
        .unwrap_or_else(|| ctx.package_dir());

    // A rerun starts from an empty package folder so nothing from an
    // earlier run survives a failure
    if ctx.root().starts_with(&package_dir) {
        bail!(
            "package directory {} contains the recipe root; refusing to clear it",
            package_dir.display()
        );
    }
    if remove_dir_all_if_exists(&package_dir)? {
        tracing::info!("cleared previous package in {}", package_dir.display());
    }

    let settings = BuildSettings::new(
        ctx.root().to_path_buf(),
        ctx.build_dir(),
        package_dir.clone(),
    )
    .with_build_type(build_type)
    .with_generator(config.build.generator.clone())
    .with_jobs(opts.jobs.or(config.build.jobs));

    let mut orchestrator = BuildOrchestrator::new(tool, settings, &options);
    let label = format!("{} v{}", manifest.name, manifest.version);

    let step = shell.step(Status::Configuring, &label);
    orchestrator
        .configure()
        .with_context(|| format!("failed to configure `{}`", manifest.name))?;
    step.finish();

    let step = shell.step(Status::Building, format!("{} [{}]", label, build_type));
    orchestrator
        .build()
        .with_context(|| format!("failed to build `{}`", manifest.name))?;
    step.finish();

    let step = shell.step(Status::Installing, package_dir.display());
    orchestrator
        .install()
        .with_context(|| format!("failed to install `{}`", manifest.name))?;
    step.finish();

    let layout = finalize(&package_dir, ctx.root())
        .with_context(|| format!("failed to finalize package in {}", package_dir.display()))?;
    for removed in &layout.removed {
        shell.status(
            Status::Removed,
            relative_path(&package_dir, removed).display(),
        );
    }

    let info = PackageInfo {
        requirements: requirements(&options),
        name: manifest.name,
        version: manifest.version,
        description: manifest.description,
        build_type,
        options,
        package: descriptor,
        layout,
    };

    let info_path = package_dir.join(PACKAGE_INFO_FILE);
    let json = serde_json::to_string_pretty(&info).context("failed to serialize package info")?;
    write_string(&info_path, &json)?;

    shell.status(
        Status::Finished,
        format!("{} v{} ({})", info.name, info.version, package_dir.display()),
    );

    Ok(PackageResult {
        package_dir,
        info_path,
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::cmake::{BuildError, BuildHandle, BuildPhase, BuildVariables};
    use crate::core::component::ComponentId;
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    /// Pretends to be CMake: `install` lays out a tree like the real one.
    #[derive(Default)]
    struct FakeInstall {
        fail: Option<BuildPhase>,
    }

    impl FakeInstall {
        fn check(&self, phase: BuildPhase) -> Result<(), BuildError> {
            match self.fail {
                Some(failing) if failing == phase => {
                    Err(BuildError::for_phase(phase, "exit status: 2".to_string()))
                }
                _ => Ok(()),
            }
        }
    }

    impl BuildTool for FakeInstall {
        fn configure(
            &mut self,
            settings: &BuildSettings,
            _variables: &BuildVariables,
        ) -> Result<BuildHandle, BuildError> {
            self.check(BuildPhase::Configure)?;
            Ok(BuildHandle {
                build_dir: settings.build_dir.clone(),
                install_prefix: settings.install_prefix.clone(),
                build_type: settings.build_type,
                jobs: settings.jobs,
            })
        }

        fn build(&mut self, _handle: &BuildHandle) -> Result<(), BuildError> {
            self.check(BuildPhase::Build)
        }

        fn install(&mut self, handle: &BuildHandle) -> Result<(), BuildError> {
            self.check(BuildPhase::Install)?;
            let prefix = &handle.install_prefix;
            for dir in ["include/dice-copperr/dice-copperr", "cmake", "share/doc"] {
                fs::create_dir_all(prefix.join(dir)).unwrap();
            }
            fs::write(prefix.join("cmake/dice-copperr-config.cmake"), "").unwrap();
            Ok(())
        }
    }

    fn recipe() -> (TempDir, GlobalContext) {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("CMakeLists.txt"),
            "project(dice-copperr VERSION 0.7.1 DESCRIPTION \"Persistent allocator\")\n",
        )
        .unwrap();
        fs::write(tmp.path().join("LICENSE"), "MIT").unwrap();
        let ctx = GlobalContext::with_root(tmp.path().to_path_buf());
        (tmp, ctx)
    }

    fn quiet() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    #[test]
    fn test_package_runs_full_pipeline() {
        let (tmp, ctx) = recipe();
        let opts = PackageOptions {
            overrides: vec!["build_ffi=true".into()],
            build_type: Some(BuildType::Debug),
            ..Default::default()
        };

        let result = package_with(&ctx, &opts, FakeInstall::default(), &quiet()).unwrap();

        let package_dir = tmp.path().join("package");
        assert_eq!(result.package_dir, package_dir);
        assert!(!package_dir.join("cmake").exists());
        assert!(!package_dir.join("share").exists());
        assert!(package_dir.join("include/dice-copperr/dice-copperr").is_dir());
        assert_eq!(
            fs::read_to_string(package_dir.join("licenses/LICENSE")).unwrap(),
            "MIT"
        );
        assert_eq!(result.info.build_type, BuildType::Debug);
        assert!(result.info.package.contains(ComponentId::Ffi));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&result.info_path).unwrap()).unwrap();
        assert_eq!(json["name"], "dice-copperr");
        assert_eq!(json["version"], "0.7.1");
        assert_eq!(json["options"]["build_ffi"], true);
        assert_eq!(
            json["package"]["components"]["ffi"]["libs"],
            serde_json::json!(["dice-copperr-ffi"])
        );
    }

    #[test]
    fn test_package_dir_override() {
        let (tmp, ctx) = recipe();
        let out = tmp.path().join("out/pkg");
        let opts = PackageOptions {
            package_dir: Some(out.clone()),
            ..Default::default()
        };

        let result = package_with(&ctx, &opts, FakeInstall::default(), &quiet()).unwrap();
        assert_eq!(result.info_path, out.join(PACKAGE_INFO_FILE));
        assert!(result.info_path.is_file());
    }

    #[test]
    fn test_build_failure_writes_no_package_info() {
        let (tmp, ctx) = recipe();
        let tool = FakeInstall {
            fail: Some(BuildPhase::Build),
        };

        let err = package_with(&ctx, &PackageOptions::default(), tool, &quiet()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::BuildFailure { .. })
        ));
        assert!(!tmp.path().join("package").join(PACKAGE_INFO_FILE).exists());
    }

    #[test]
    fn test_install_failure_is_install_failure() {
        let (_tmp, ctx) = recipe();
        let tool = FakeInstall {
            fail: Some(BuildPhase::Install),
        };

        let err = package_with(&ctx, &PackageOptions::default(), tool, &quiet()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InstallFailure { .. })
        ));
    }

    #[test]
    fn test_invalid_option_stops_before_build() {
        let (tmp, ctx) = recipe();
        let opts = PackageOptions {
            overrides: vec!["shared=maybe".into()],
            ..Default::default()
        };

        assert!(package_with(&ctx, &opts, FakeInstall::default(), &quiet()).is_err());
        assert!(!tmp.path().join("package").exists());
    }

    #[test]
    fn test_failed_rerun_leaves_no_stale_package() {
        let (tmp, ctx) = recipe();
        let package_dir = tmp.path().join("package");
        let opts = PackageOptions {
            overrides: vec!["build_ffi=true".into()],
            ..Default::default()
        };
        package_with(&ctx, &opts, FakeInstall::default(), &quiet()).unwrap();
        assert!(package_dir.join(PACKAGE_INFO_FILE).is_file());

        let opts = PackageOptions {
            overrides: vec!["build_ffi=false".into()],
            ..Default::default()
        };
        let tool = FakeInstall {
            fail: Some(BuildPhase::Build),
        };
        assert!(package_with(&ctx, &opts, tool, &quiet()).is_err());

        assert!(!package_dir.join(PACKAGE_INFO_FILE).exists());
        assert!(!package_dir.join("licenses").exists());
        assert!(!package_dir.join("include").exists());
    }

    #[test]
    fn test_successful_rerun_replaces_package() {
        let (tmp, ctx) = recipe();
        let package_dir = tmp.path().join("package");
        package_with(&ctx, &PackageOptions::default(), FakeInstall::default(), &quiet()).unwrap();
        fs::write(package_dir.join("leftover.txt"), "old").unwrap();

        let opts = PackageOptions {
            overrides: vec!["build_ffi=true".into()],
            ..Default::default()
        };
        let result = package_with(&ctx, &opts, FakeInstall::default(), &quiet()).unwrap();

        assert!(!package_dir.join("leftover.txt").exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&result.info_path).unwrap()).unwrap();
        assert_eq!(json["options"]["build_ffi"], true);
    }

    #[test]
    fn test_package_dir_containing_root_is_refused() {
        let (tmp, ctx) = recipe();
        let opts = PackageOptions {
            package_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };

        let err = package_with(&ctx, &opts, FakeInstall::default(), &quiet()).unwrap_err();
        assert!(err.to_string().contains("refusing to clear it"));
        assert!(tmp.path().join("CMakeLists.txt").is_file());
    }
}
