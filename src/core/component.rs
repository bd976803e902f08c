//! Package components and the descriptor handed to the dependency manager.
//!
//! A component is an independently consumable slice of the installed package:
//! its headers, libraries and the other components or external targets it
//! needs. Component ids are a closed enum, so a `requires` edge can only name
//! a component this recipe knows how to emit.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::core::options::OptionSet;

/// Header-only Boost, always required by the public headers.
pub const BOOST_HEADERS: &str = "boost::headers";

/// Properties consumed by the CMake config generator downstream.
pub const CMAKE_FIND_MODE: &str = "cmake_find_mode";
pub const CMAKE_FILE_NAME: &str = "cmake_file_name";
pub const CMAKE_TARGET_NAME: &str = "cmake_target_name";

/// Identifier of a component emitted by this recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentId {
    Global,
    Ffi,
    DefaultLogger,
}

impl ComponentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentId::Global => "global",
            ComponentId::Ffi => "ffi",
            ComponentId::DefaultLogger => "default-logger",
        }
    }

    /// Name of the CMake target exported for this component.
    pub fn cmake_target(&self, package_name: &str) -> String {
        match self {
            ComponentId::Global => format!("{package_name}::{package_name}"),
            other => format!("{package_name}::{}", other.as_str()),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ComponentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One edge of a component's `requires` set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    /// Another component of this package.
    Component(ComponentId),
    /// A target provided by a third-party package, e.g. `boost::headers`.
    External(String),
}

impl Requirement {
    pub fn external(target: impl Into<String>) -> Self {
        Requirement::External(target.into())
    }
}

impl From<ComponentId> for Requirement {
    fn from(id: ComponentId) -> Self {
        Requirement::Component(id)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Component(id) => write!(f, "{}", id),
            Requirement::External(target) => f.write_str(target),
        }
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error building or validating a component graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ComponentGraphError {
    #[error("package name must not be empty")]
    #[diagnostic(
        code(pkgrecipe::components::empty_name),
        help("check the project name in CMakeLists.txt")
    )]
    EmptyPackageName,

    #[error("component `{component}` requires `{missing}`, which is not part of the package")]
    #[diagnostic(code(pkgrecipe::components::dangling))]
    DanglingRequirement {
        component: ComponentId,
        missing: ComponentId,
    },

    #[error("components form a cycle through `{0}`")]
    #[diagnostic(code(pkgrecipe::components::cycle))]
    Cycle(ComponentId),
}

/// Filesystem and dependency properties of one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Component {
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub bin_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub requires: BTreeSet<Requirement>,
    pub properties: BTreeMap<String, String>,
}

impl Component {
    fn with_cmake_properties(package_name: &str, id: ComponentId) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(CMAKE_FIND_MODE.to_string(), "both".to_string());
        properties.insert(CMAKE_FILE_NAME.to_string(), package_name.to_string());
        properties.insert(CMAKE_TARGET_NAME.to_string(), id.cmake_target(package_name));
        Component {
            properties,
            ..Component::default()
        }
    }

    /// Component ids this component depends on, skipping external targets.
    pub fn component_requires(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.requires.iter().filter_map(|req| match req {
            Requirement::Component(id) => Some(*id),
            Requirement::External(_) => None,
        })
    }
}

/// The full component graph plus package-level properties.
///
/// Rebuilt from scratch for each option set; nothing mutates a descriptor
/// after [`PackageDescriptor::build`] returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub package_name: String,
    pub properties: BTreeMap<String, String>,
    pub components: BTreeMap<ComponentId, Component>,
}

impl PackageDescriptor {
    /// Build the component graph for `package_name` under `options`.
    pub fn build(package_name: &str, options: &OptionSet) -> Result<Self, ComponentGraphError> {
        if package_name.is_empty() {
            return Err(ComponentGraphError::EmptyPackageName);
        }
        let name = package_name;

        let mut components = BTreeMap::new();

        let mut global = Component::with_cmake_properties(name, ComponentId::Global);
        global.include_dirs = vec![PathBuf::from(format!("include/{name}/{name}"))];
        global.requires.insert(Requirement::external(BOOST_HEADERS));

        if options.build_ffi {
            let mut ffi = Component::with_cmake_properties(name, ComponentId::Ffi);
            ffi.include_dirs = vec![PathBuf::from(format!("include/{name}/ffi"))];
            ffi.lib_dirs = vec![PathBuf::from(format!("lib/{name}/ffi"))];
            ffi.libs = vec![format!("{name}-ffi")];
            ffi.requires.insert(ComponentId::Global.into());
            components.insert(ComponentId::Ffi, ffi);
        }

        if options.with_default_logger {
            let mut logger = Component::with_cmake_properties(name, ComponentId::DefaultLogger);
            logger.lib_dirs = vec![PathBuf::from(format!("lib/{name}/default-logger"))];
            logger.libs = vec![format!("{name}-default-logger")];
            components.insert(ComponentId::DefaultLogger, logger);
            global.requires.insert(ComponentId::DefaultLogger.into());
        }

        components.insert(ComponentId::Global, global);

        let mut properties = BTreeMap::new();
        properties.insert(CMAKE_FILE_NAME.to_string(), name.to_string());

        let descriptor = PackageDescriptor {
            package_name: name.to_string(),
            properties,
            components,
        };
        descriptor.validate()?;

        tracing::debug!(
            package = name,
            components = ?descriptor.ids(),
            "built component graph"
        );

        Ok(descriptor)
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn ids(&self) -> BTreeSet<ComponentId> {
        self.components.keys().copied().collect()
    }

    /// Check that every component edge lands on an emitted component and
    /// that the edges are acyclic.
    pub fn validate(&self) -> Result<(), ComponentGraphError> {
        for (id, component) in &self.components {
            if let Some(missing) = component.component_requires().find(|r| !self.contains(*r)) {
                return Err(ComponentGraphError::DanglingRequirement {
                    component: *id,
                    missing,
                });
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Components ordered so that each one comes after everything it requires.
    pub fn topological_order(&self) -> Result<Vec<ComponentId>, ComponentGraphError> {
        let mut graph: DiGraph<ComponentId, ()> = DiGraph::new();
        let nodes: HashMap<ComponentId, NodeIndex> = self
            .components
            .keys()
            .map(|id| (*id, graph.add_node(*id)))
            .collect();

        for (id, component) in &self.components {
            for required in component.component_requires() {
                if let Some(&dep) = nodes.get(&required) {
                    // dependency -> dependent
                    graph.add_edge(dep, nodes[id], ());
                }
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(|n| graph[n]).collect())
            .map_err(|cycle| ComponentGraphError::Cycle(graph[cycle.node_id()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(build_ffi: bool, with_default_logger: bool) -> OptionSet {
        OptionSet {
            build_ffi,
            with_default_logger,
            ..OptionSet::default()
        }
    }

    fn ids(list: &[ComponentId]) -> BTreeSet<ComponentId> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_component_ids_follow_options() {
        for build_ffi in [false, true] {
            for with_default_logger in [false, true] {
                let desc =
                    PackageDescriptor::build("copperr", &options(build_ffi, with_default_logger))
                        .unwrap();

                let mut expected = vec![ComponentId::Global];
                if build_ffi {
                    expected.push(ComponentId::Ffi);
                }
                if with_default_logger {
                    expected.push(ComponentId::DefaultLogger);
                }
                assert_eq!(desc.ids(), ids(&expected));

                let global = desc.get(ComponentId::Global).unwrap();
                assert!(global
                    .requires
                    .contains(&Requirement::external(BOOST_HEADERS)));
                assert_eq!(
                    global
                        .requires
                        .contains(&Requirement::from(ComponentId::DefaultLogger)),
                    with_default_logger
                );
            }
        }
    }

    #[test]
    fn test_logger_without_ffi() {
        let desc = PackageDescriptor::build("copperr", &options(false, true)).unwrap();
        assert_eq!(
            desc.ids(),
            ids(&[ComponentId::Global, ComponentId::DefaultLogger])
        );

        let global = desc.get(ComponentId::Global).unwrap();
        assert_eq!(
            global.requires,
            BTreeSet::from([
                Requirement::external(BOOST_HEADERS),
                ComponentId::DefaultLogger.into(),
            ])
        );
        assert_eq!(global.include_dirs, vec![PathBuf::from("include/copperr/copperr")]);
        assert!(global.lib_dirs.is_empty());

        let logger = desc.get(ComponentId::DefaultLogger).unwrap();
        assert!(logger.include_dirs.is_empty());
        assert_eq!(logger.lib_dirs, vec![PathBuf::from("lib/copperr/default-logger")]);
        assert_eq!(logger.libs, vec!["copperr-default-logger".to_string()]);
        assert!(logger.requires.is_empty());
    }

    #[test]
    fn test_ffi_without_logger() {
        let desc = PackageDescriptor::build("copperr", &options(true, false)).unwrap();
        assert_eq!(desc.ids(), ids(&[ComponentId::Global, ComponentId::Ffi]));

        let ffi = desc.get(ComponentId::Ffi).unwrap();
        assert_eq!(
            ffi.requires,
            BTreeSet::from([Requirement::Component(ComponentId::Global)])
        );
        assert_eq!(ffi.include_dirs, vec![PathBuf::from("include/copperr/ffi")]);
        assert_eq!(ffi.lib_dirs, vec![PathBuf::from("lib/copperr/ffi")]);
        assert_eq!(ffi.libs, vec!["copperr-ffi".to_string()]);

        let global = desc.get(ComponentId::Global).unwrap();
        assert!(!global
            .requires
            .contains(&Requirement::from(ComponentId::DefaultLogger)));
    }

    #[test]
    fn test_empty_package_name_fails() {
        assert_eq!(
            PackageDescriptor::build("", &OptionSet::default()).unwrap_err(),
            ComponentGraphError::EmptyPackageName
        );
    }

    #[test]
    fn test_graph_is_recomputed_per_option_set() {
        let a = PackageDescriptor::build("copperr", &options(true, true)).unwrap();
        let b = PackageDescriptor::build("copperr", &options(true, true)).unwrap();
        let c = PackageDescriptor::build("copperr", &options(false, true)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cmake_properties() {
        let desc = PackageDescriptor::build("copperr", &options(true, true)).unwrap();
        assert_eq!(desc.properties[CMAKE_FILE_NAME], "copperr");

        let target = |id| desc.get(id).unwrap().properties[CMAKE_TARGET_NAME].clone();
        assert_eq!(target(ComponentId::Global), "copperr::copperr");
        assert_eq!(target(ComponentId::Ffi), "copperr::ffi");
        assert_eq!(target(ComponentId::DefaultLogger), "copperr::default-logger");
        assert_eq!(
            desc.get(ComponentId::Ffi).unwrap().properties[CMAKE_FIND_MODE],
            "both"
        );
    }

    #[test]
    fn test_topological_order_puts_dependencies_first() {
        let desc = PackageDescriptor::build("copperr", &options(true, true)).unwrap();
        let order = desc.topological_order().unwrap();
        let pos = |id| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(ComponentId::DefaultLogger) < pos(ComponentId::Global));
        assert!(pos(ComponentId::Global) < pos(ComponentId::Ffi));
    }

    #[test]
    fn test_validate_catches_dangling_and_cyclic_edges() {
        let mut desc = PackageDescriptor::build("copperr", &options(true, false)).unwrap();
        desc.components
            .get_mut(&ComponentId::Global)
            .unwrap()
            .requires
            .insert(ComponentId::DefaultLogger.into());
        assert_eq!(
            desc.validate().unwrap_err(),
            ComponentGraphError::DanglingRequirement {
                component: ComponentId::Global,
                missing: ComponentId::DefaultLogger,
            }
        );

        let mut desc = PackageDescriptor::build("copperr", &options(true, false)).unwrap();
        desc.components
            .get_mut(&ComponentId::Global)
            .unwrap()
            .requires
            .insert(ComponentId::Ffi.into());
        assert!(matches!(
            desc.validate().unwrap_err(),
            ComponentGraphError::Cycle(_)
        ));
    }

    #[test]
    fn test_json_shape() {
        let desc = PackageDescriptor::build("copperr", &options(false, true)).unwrap();
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["package_name"], "copperr");
        assert_eq!(
            json["components"]["global"]["requires"],
            serde_json::json!(["default-logger", "boost::headers"])
        );
        assert_eq!(
            json["components"]["default-logger"]["libs"],
            serde_json::json!(["copperr-default-logger"])
        );
    }
}
