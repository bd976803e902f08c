//! Static recipe metadata and option-dependent requirements.

use std::fmt;

use serde::Serialize;

use crate::core::options::OptionSet;

/// Descriptive metadata published alongside the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeMetadata {
    pub license: &'static str,
    pub author: &'static str,
    pub homepage: &'static str,
    pub url: &'static str,
    pub topics: &'static [&'static str],
    /// Settings that distinguish binary packages built from this recipe.
    pub settings: &'static [&'static str],
}

pub const METADATA: RecipeMetadata = RecipeMetadata {
    license: "MIT/Apache",
    author: "DICE Group <info@dice-research.org>",
    homepage: "https://github.com/dice-group/metall",
    url: "https://github.com/dice-group/metall",
    topics: &["persistent memory", "allocator"],
    settings: &["build_type", "compiler", "os", "arch"],
};

/// Patterns (relative to the recipe root) shipped with the exported sources.
pub const EXPORT_SOURCES: &[&str] = &[
    "libs/**/*",
    "CMakeLists.txt",
    "cmake/**/*",
    "LICENSE*",
    "COPYRIGHT",
    "NOTICE",
];

/// A third-party package this recipe depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRequirement {
    pub name: &'static str,
    pub version: &'static str,
    /// Whether consumers see this package's headers through ours.
    pub transitive_headers: bool,
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Packages required under `options`, in declaration order.
pub fn requirements(options: &OptionSet) -> Vec<PackageRequirement> {
    let mut reqs = vec![PackageRequirement {
        name: "boost",
        version: "1.83.0",
        transitive_headers: true,
    }];

    if options.with_test_deps {
        reqs.push(PackageRequirement {
            name: "gtest",
            version: "1.14.0",
            transitive_headers: false,
        });
    }

    reqs
}
