//! Ecosystem catalog, run order, and the project-type allowlist.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A package ecosystem an extractor reports for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Existing `CycloneDX` documents found in the tree
    Bom,
    Js,
    Java,
    Python,
    Go,
    Rust,
    Php,
    Ruby,
    Csharp,
    Dart,
    Haskell,
    Elixir,
    C,
    Clojure,
    Github,
    Cloudbuild,
    Swift,
    Jar,
    /// Cryptographic assets
    Crypto,
    /// Operating-system packages of a container image or host
    Os,
}

impl Ecosystem {
    /// Per-path run order. OS packages run once, before any path.
    pub const ORDER: &'static [Self] = &[
        Self::Bom,
        Self::Js,
        Self::Java,
        Self::Python,
        Self::Go,
        Self::Rust,
        Self::Php,
        Self::Ruby,
        Self::Csharp,
        Self::Dart,
        Self::Haskell,
        Self::Elixir,
        Self::C,
        Self::Clojure,
        Self::Github,
        Self::Cloudbuild,
        Self::Swift,
        Self::Jar,
        Self::Crypto,
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bom => "bom",
            Self::Js => "js",
            Self::Java => "java",
            Self::Python => "python",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Csharp => "csharp",
            Self::Dart => "dart",
            Self::Haskell => "haskell",
            Self::Elixir => "elixir",
            Self::C => "c",
            Self::Clojure => "clojure",
            Self::Github => "github",
            Self::Cloudbuild => "cloudbuild",
            Self::Swift => "swift",
            Self::Jar => "jar",
            Self::Crypto => "crypto",
            Self::Os => "os",
        }
    }

    /// Project-type names that select this ecosystem.
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Bom => &["bom", "cyclonedx", "cdx"],
            Self::Js => &[
                "js", "javascript", "typescript", "ts", "tsx", "npm", "pnpm", "yarn", "nodejs", "node",
            ],
            Self::Java => &[
                "java", "maven", "mvn", "gradle", "sbt", "scala", "kotlin", "groovy", "android",
            ],
            Self::Python => &["python", "py", "pypi", "pip", "poetry", "requirements", "uv", "pixi"],
            Self::Go => &["go", "golang", "gomod", "gopkg"],
            Self::Rust => &["rust", "rust-lang", "cargo"],
            Self::Php => &["php", "composer", "wordpress"],
            Self::Ruby => &["ruby", "rb", "gems", "rubygems", "bundler", "gemspec"],
            Self::Csharp => &["csharp", "dotnet", "netcore", "nuget", "vb", "dotnet-framework"],
            Self::Dart => &["dart", "flutter", "pub"],
            Self::Haskell => &["haskell", "hackage", "cabal"],
            Self::Elixir => &["elixir", "hex", "mix"],
            Self::C => &["c", "cpp", "c++", "conan", "meson", "vcpkg"],
            Self::Clojure => &["clojure", "clj", "edn", "leiningen"],
            Self::Github => &["github", "actions"],
            Self::Cloudbuild => &["cloudbuild"],
            Self::Swift => &["swift", "spm"],
            Self::Jar => &["jar", "war", "ear"],
            Self::Crypto => &["crypto", "cbom"],
            Self::Os => &["os", "osquery", "linux", "windows", "macos", "darwin"],
        }
    }

    /// purl type used for a directory-name fallback parent.
    #[must_use]
    pub const fn purl_type(&self) -> &'static str {
        match self {
            Self::Bom => "application",
            Self::Js => "npm",
            Self::Java | Self::Jar => "maven",
            Self::Python => "pypi",
            Self::Go => "golang",
            Self::Rust => "cargo",
            Self::Php => "composer",
            Self::Ruby => "gem",
            Self::Csharp => "nuget",
            Self::Dart => "pub",
            Self::Haskell => "hackage",
            Self::Elixir => "hex",
            Self::Clojure => "clojars",
            Self::Github => "github",
            Self::Swift => "swift",
            Self::C | Self::Cloudbuild | Self::Crypto | Self::Os => "generic",
        }
    }

    /// Resolve an ecosystem from its name or any alias.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ORDER
            .iter()
            .chain(std::iter::once(&Self::Os))
            .copied()
            .find(|eco| eco.aliases().contains(&name.as_str()))
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Project type allowlist
// ============================================================================

/// Container image scans: selecting any of these runs every ecosystem.
pub const CONTAINER_TYPES: &[&str] = &["oci", "docker", "container", "podman"];

/// Project types that select every ecosystem.
pub const UNIVERSAL_TYPES: &[&str] = &[
    "universal",
    "containerfile",
    "dockerfile",
    "docker-compose",
    "kubernetes",
    "openshift",
    "kustomize",
    "tekton",
    "skaffold",
];

/// Project-type allowlist with exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTypeFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl ProjectTypeFilter {
    #[must_use]
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        let normalize = |types: &[String]| {
            types
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            include: normalize(include),
            exclude: normalize(exclude),
        }
    }

    /// Whether any of `types` is selected.
    ///
    /// An exclusion matching any alias of a requested type wins. With an
    /// empty allowlist the answer is `default`. A universal type selects
    /// everything not excluded.
    #[must_use]
    pub fn has_any(&self, types: &[&str], default: bool) -> bool {
        let requested = expand(types.iter().copied());
        if !self.exclude.is_empty() {
            let excluded = expand(self.exclude.iter().map(String::as_str));
            if !requested.is_disjoint(&excluded) {
                return false;
            }
        }
        if self.include.is_empty() {
            return default;
        }
        if self.include.iter().any(|t| UNIVERSAL_TYPES.contains(&t.as_str())) {
            return true;
        }
        let included = expand(self.include.iter().map(String::as_str));
        !requested.is_disjoint(&included)
    }

    /// Whether the extractor for `ecosystem` should run.
    #[must_use]
    pub fn allows(&self, ecosystem: Ecosystem) -> bool {
        if self.is_container_scan() {
            return !self.excludes(ecosystem);
        }
        self.has_any(&[ecosystem.name()], true)
    }

    /// Whether the allowlist names a container image type.
    #[must_use]
    pub fn is_container_scan(&self) -> bool {
        self.include.iter().any(|t| CONTAINER_TYPES.contains(&t.as_str()))
    }

    /// Whether OS packages should be collected before the per-path loop.
    #[must_use]
    pub fn wants_os_packages(&self) -> bool {
        let named = self.is_container_scan()
            || self
                .include
                .iter()
                .any(|t| Ecosystem::Os.aliases().contains(&t.as_str()));
        named && !self.excludes(Ecosystem::Os)
    }

    fn excludes(&self, ecosystem: Ecosystem) -> bool {
        let excluded = expand(self.exclude.iter().map(String::as_str));
        !expand(std::iter::once(ecosystem.name())).is_disjoint(&excluded)
    }
}

/// Expand project-type names to every alias of their group.
fn expand<'a>(types: impl Iterator<Item = &'a str>) -> HashSet<String> {
    let mut expanded = HashSet::new();
    for name in types {
        let name = name.trim().to_lowercase();
        if CONTAINER_TYPES.contains(&name.as_str()) {
            expanded.extend(CONTAINER_TYPES.iter().map(ToString::to_string));
        } else if let Some(eco) = Ecosystem::from_name(&name) {
            expanded.extend(eco.aliases().iter().map(ToString::to_string));
        }
        expanded.insert(name);
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> ProjectTypeFilter {
        let owned = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        ProjectTypeFilter::new(&owned(include), &owned(exclude))
    }

    #[test]
    fn test_order_is_fixed() {
        assert_eq!(Ecosystem::ORDER.first(), Some(&Ecosystem::Bom));
        assert_eq!(Ecosystem::ORDER.last(), Some(&Ecosystem::Crypto));
        let js = Ecosystem::ORDER.iter().position(|e| *e == Ecosystem::Js);
        let java = Ecosystem::ORDER.iter().position(|e| *e == Ecosystem::Java);
        assert!(js < java);
        assert!(!Ecosystem::ORDER.contains(&Ecosystem::Os));
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(Ecosystem::from_name("npm"), Some(Ecosystem::Js));
        assert_eq!(Ecosystem::from_name("Gradle"), Some(Ecosystem::Java));
        assert_eq!(Ecosystem::from_name("linux"), Some(Ecosystem::Os));
        assert_eq!(Ecosystem::from_name("cobol"), None);
    }

    #[test]
    fn test_empty_allowlist_uses_default() {
        assert!(filter(&[], &[]).has_any(&[], true));
        assert!(filter(&[], &["rust"]).has_any(&["js"], true));
        assert!(!filter(&[], &[]).has_any(&["oci"], false));
    }

    #[test]
    fn test_include_matching() {
        assert!(filter(&["java"], &[]).has_any(&["java"], true));
        assert!(!filter(&["csharp"], &[]).has_any(&["java"], true));
        assert!(!filter(&["csharp", "rust"], &[]).has_any(&["java"], true));
        assert!(filter(&["csharp", "rust"], &[]).has_any(&["rust"], true));
        assert!(filter(&["maven"], &[]).has_any(&["java"], true));
    }

    #[test]
    fn test_exclusion_wins() {
        assert!(!filter(&["csharp", "rust"], &["rust"]).has_any(&["rust"], true));
        assert!(!filter(&["js"], &["js"]).has_any(&["js"], true));
        assert!(!filter(&[], &["oci"]).has_any(&["docker"], true));
        assert!(!filter(&["universal"], &["csharp", "javascript"]).has_any(&["js", "docker"], true));
    }

    #[test]
    fn test_oci_and_docker_are_aliases() {
        assert!(filter(&["docker"], &[]).has_any(&["oci"], true));
        assert!(filter(&["oci"], &[]).has_any(&["docker"], true));
        assert!(filter(&["java", "docker"], &["dotnet"]).has_any(&["oci"], true));
    }

    #[test]
    fn test_universal() {
        assert!(filter(&["universal"], &["csharp"]).has_any(&["js", "docker"], true));
        assert!(filter(&["universal"], &[]).has_any(&["rust"], true));
        assert!(!filter(&["universal"], &["js"]).has_any(&["js"], true));
    }

    #[test]
    fn test_container_scan_runs_every_ecosystem() {
        let oci = filter(&["oci"], &["python"]);
        assert!(oci.allows(Ecosystem::Js));
        assert!(oci.allows(Ecosystem::Go));
        assert!(!oci.allows(Ecosystem::Python));
        assert!(oci.wants_os_packages());
        assert!(!filter(&["js"], &[]).wants_os_packages());
    }
}
