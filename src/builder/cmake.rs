//! Driving the external build tool.
//!
//! The recipe never compiles anything itself. It hands a small variable
//! mapping to CMake, then asks it to build and install. [`BuildOrchestrator`]
//! sequences those calls and configures at most once per evaluation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::options::OptionSet;
use crate::util::process::{find_cmake, output_tail, ProcessBuilder};

/// Lines of tool output kept in failure messages.
const FAILURE_TAIL_LINES: usize = 20;

/// CMake build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(format!(
                "invalid build type '{}'; expected Debug, Release, RelWithDebInfo or MinSizeRel",
                s
            )),
        }
    }
}

/// Phase of the external build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Configure,
    Build,
    Install,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildPhase::Configure => write!(f, "configure"),
            BuildPhase::Build => write!(f, "build"),
            BuildPhase::Install => write!(f, "install"),
        }
    }
}

/// Failure of the external build tool. Never retried.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("{tool} not found")]
    #[diagnostic(code(pkgrecipe::build::tool_not_found))]
    ToolNotFound {
        tool: String,
        #[help]
        hint: String,
    },

    #[error("{phase} step failed: {message}")]
    #[diagnostic(
        code(pkgrecipe::build::failed),
        help("run with --verbose to see the full command line")
    )]
    BuildFailure { phase: BuildPhase, message: String },

    #[error("install step failed: {message}")]
    #[diagnostic(code(pkgrecipe::build::install_failed))]
    InstallFailure { message: String },
}

impl BuildError {
    pub fn for_phase(phase: BuildPhase, message: String) -> Self {
        match phase {
            BuildPhase::Install => BuildError::InstallFailure { message },
            phase => BuildError::BuildFailure { phase, message },
        }
    }
}

/// Variables handed to the upstream `CMakeLists.txt`.
///
/// This is the complete mapping: the upstream build must not look for
/// dependencies through its own package-manager integration, and two
/// options toggle optional sub-libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildVariables {
    pub build_ffi: bool,
    pub with_default_logger: bool,
}

impl BuildVariables {
    pub const USE_CONAN: bool = false;

    pub fn from_options(options: &OptionSet) -> Self {
        BuildVariables {
            build_ffi: options.build_ffi,
            with_default_logger: options.with_default_logger,
        }
    }

    pub fn definitions(&self) -> [(&'static str, bool); 3] {
        [
            ("USE_CONAN", Self::USE_CONAN),
            ("BUILD_FFI", self.build_ffi),
            ("WITH_DEFAULT_LOGGER", self.with_default_logger),
        ]
    }
}

/// Toolchain-level settings: directories, build type, linkage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub build_type: BuildType,
    pub shared: bool,
    pub fpic: bool,
    pub generator: Option<String>,
    pub jobs: Option<usize>,
}

impl BuildSettings {
    pub fn new(source_dir: PathBuf, build_dir: PathBuf, install_prefix: PathBuf) -> Self {
        let defaults = OptionSet::default();
        BuildSettings {
            source_dir,
            build_dir,
            install_prefix,
            build_type: BuildType::default(),
            shared: defaults.shared,
            fpic: defaults.fpic,
            generator: None,
            jobs: None,
        }
    }

    /// Take linkage settings from the resolved options.
    pub fn with_options(mut self, options: &OptionSet) -> Self {
        self.shared = options.shared;
        self.fpic = options.fpic;
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }
}

/// A configured build tree, ready to build and install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildHandle {
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub build_type: BuildType,
    pub jobs: Option<usize>,
}

/// The external build tool.
pub trait BuildTool {
    /// Generate a build tree. Blocks until the tool exits.
    fn configure(
        &mut self,
        settings: &BuildSettings,
        variables: &BuildVariables,
    ) -> Result<BuildHandle, BuildError>;

    fn build(&mut self, handle: &BuildHandle) -> Result<(), BuildError>;

    fn install(&mut self, handle: &BuildHandle) -> Result<(), BuildError>;
}

fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

/// [`BuildTool`] backed by the `cmake` executable.
#[derive(Debug, Clone)]
pub struct CMakeTool {
    program: PathBuf,
}

impl CMakeTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CMakeTool {
            program: program.into(),
        }
    }

    /// Use `explicit` if given, otherwise search PATH.
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self, BuildError> {
        explicit
            .or_else(find_cmake)
            .map(Self::new)
            .ok_or_else(|| BuildError::ToolNotFound {
                tool: "cmake".to_string(),
                hint: "install CMake and make sure it is on PATH, \
                       or set `build.cmake` in .pkgrecipe/config.toml"
                    .to_string(),
            })
    }

    pub fn configure_args(settings: &BuildSettings, variables: &BuildVariables) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            settings.source_dir.display().to_string(),
            "-B".to_string(),
            settings.build_dir.display().to_string(),
        ];

        if let Some(ref generator) = settings.generator {
            args.push("-G".to_string());
            args.push(generator.clone());
        }

        args.push(format!("-DCMAKE_BUILD_TYPE={}", settings.build_type));
        args.push(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            settings.install_prefix.display()
        ));
        args.push(format!("-DBUILD_SHARED_LIBS={}", on_off(settings.shared)));
        args.push(format!(
            "-DCMAKE_POSITION_INDEPENDENT_CODE={}",
            on_off(settings.fpic)
        ));

        for (name, value) in variables.definitions() {
            args.push(format!("-D{}={}", name, on_off(value)));
        }

        args
    }

    pub fn build_args(handle: &BuildHandle) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            handle.build_dir.display().to_string(),
            "--config".to_string(),
            handle.build_type.to_string(),
        ];
        if let Some(jobs) = handle.jobs {
            args.push("--parallel".to_string());
            args.push(jobs.to_string());
        }
        args
    }

    pub fn install_args(handle: &BuildHandle) -> Vec<String> {
        vec![
            "--install".to_string(),
            handle.build_dir.display().to_string(),
            "--config".to_string(),
            handle.build_type.to_string(),
            "--prefix".to_string(),
            handle.install_prefix.display().to_string(),
        ]
    }

    fn run(&self, phase: BuildPhase, args: Vec<String>) -> Result<(), BuildError> {
        let cmd = ProcessBuilder::new(&self.program).args(args);
        let output = cmd
            .exec()
            .map_err(|e| BuildError::for_phase(phase, format!("{:#}", e)))?;

        if !output.status.success() {
            let message = format!(
                "`{}` exited with {:?}\n{}",
                cmd.display_command(),
                output.status.code(),
                output_tail(&output, FAILURE_TAIL_LINES)
            );
            return Err(BuildError::for_phase(phase, message));
        }

        Ok(())
    }
}

impl BuildTool for CMakeTool {
    fn configure(
        &mut self,
        settings: &BuildSettings,
        variables: &BuildVariables,
    ) -> Result<BuildHandle, BuildError> {
        std::fs::create_dir_all(&settings.build_dir).map_err(|e| {
            BuildError::for_phase(
                BuildPhase::Configure,
                format!(
                    "failed to create build directory {}: {}",
                    settings.build_dir.display(),
                    e
                ),
            )
        })?;

        self.run(
            BuildPhase::Configure,
            Self::configure_args(settings, variables),
        )?;

        Ok(BuildHandle {
            build_dir: settings.build_dir.clone(),
            install_prefix: settings.install_prefix.clone(),
            build_type: settings.build_type,
            jobs: settings.jobs,
        })
    }

    fn build(&mut self, handle: &BuildHandle) -> Result<(), BuildError> {
        self.run(BuildPhase::Build, Self::build_args(handle))
    }

    fn install(&mut self, handle: &BuildHandle) -> Result<(), BuildError> {
        self.run(BuildPhase::Install, Self::install_args(handle))
    }
}

/// Sequences configure, build and install over a [`BuildTool`].
///
/// The configured handle is created on first use and reused until
/// [`teardown`](Self::teardown).
pub struct BuildOrchestrator<T: BuildTool> {
    tool: T,
    settings: BuildSettings,
    variables: BuildVariables,
    handle: Option<BuildHandle>,
}

impl<T: BuildTool> BuildOrchestrator<T> {
    pub fn new(tool: T, settings: BuildSettings, options: &OptionSet) -> Self {
        BuildOrchestrator {
            tool,
            settings: settings.with_options(options),
            variables: BuildVariables::from_options(options),
            handle: None,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn is_configured(&self) -> bool {
        self.handle.is_some()
    }

    /// Configure once; later calls return the same handle.
    pub fn configure(&mut self) -> Result<&BuildHandle, BuildError> {
        let handle = match self.handle.take() {
            Some(handle) => {
                tracing::debug!("reusing configured build tree {}", handle.build_dir.display());
                handle
            }
            None => {
                tracing::info!("Configuring {}", self.settings.source_dir.display());
                self.tool.configure(&self.settings, &self.variables)?
            }
        };
        let handle: &BuildHandle = self.handle.insert(handle);
        Ok(handle)
    }

    pub fn build(&mut self) -> Result<(), BuildError> {
        let handle = self.configure()?.clone();
        tracing::info!("Building ({})", handle.build_type);
        self.tool.build(&handle)
    }

    pub fn install(&mut self) -> Result<(), BuildError> {
        let handle = self.configure()?.clone();
        tracing::info!("Installing into {}", handle.install_prefix.display());
        self.tool.install(&handle)
    }

    /// Forget the configured handle; the next call configures again.
    pub fn teardown(&mut self) {
        self.handle = None;
    }
}
