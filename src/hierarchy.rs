//! Root component selection and the parent/sub-parent hierarchy.
//!
//! Root priority: a pre-built parent from configuration, then the
//! configured project name and version, then the first parent an extractor
//! discovered, then a parent named after the scanned directory.

use crate::config::ProjectConfig;
use crate::merge::{merge_dependencies, trim_components};
use crate::model::{build_purl, Component, ComponentType, DependencyEdge};
use std::path::{Path, PathBuf};

/// Version used when no project version is configured.
pub const DEFAULT_VERSION: &str = "latest";

/// purl type of a root built from project name and version.
const PROJECT_PURL_TYPE: &str = "application";

/// The root implied by configuration alone, if any.
#[must_use]
pub fn determine_parent_component(project: &ProjectConfig) -> Option<Component> {
    if let Some(parent) = project.parent_component.as_ref().filter(|p| !p.name.is_empty()) {
        return Some(parent.clone());
    }
    match (project.name.as_deref(), project.version.as_deref()) {
        (Some(name), Some(version)) => Some(project_component(
            PROJECT_PURL_TYPE,
            project.group.as_deref(),
            name,
            version,
            ComponentType::Application,
        )),
        _ => None,
    }
}

/// A root named after the scanned directory.
///
/// For a file path the containing directory's name is used. Configured
/// project name, version and group take precedence over the derived values.
#[must_use]
pub fn default_parent_component(path: &Path, purl_type: &str, project: &ProjectConfig) -> Component {
    let name = project
        .name
        .clone()
        .unwrap_or_else(|| directory_name(path));
    let version = project.version.as_deref().unwrap_or(DEFAULT_VERSION);
    let component_type = if name.ends_with(".tar") {
        ComponentType::Container
    } else {
        ComponentType::Application
    };
    project_component(purl_type, project.group.as_deref(), &name, version, component_type)
}

fn project_component(
    purl_type: &str,
    group: Option<&str>,
    name: &str,
    version: &str,
    component_type: ComponentType,
) -> Component {
    let mut component = Component::new(component_type, name).with_version(version);
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        component = component.with_group(group);
    }
    match build_purl(purl_type, group, name, Some(version)) {
        Some(purl) => component.with_purl(purl),
        None => {
            let bom_ref = format!("pkg:{purl_type}/{}", component.simple_full_name());
            component.with_bom_ref(bom_ref)
        }
    }
}

fn directory_name(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let absolute = normalize(&absolute);
    let dir = if absolute.is_dir() {
        absolute.as_path()
    } else {
        absolute.parent().unwrap_or(&absolute)
    };
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

/// Resolve `.` and `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for part in path.components() {
        match part {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// ============================================================================
// Parent hierarchy fold
// ============================================================================

/// Accumulates the root and the sub-parents discovered during a scan.
#[derive(Debug, Clone, Default)]
pub struct ParentHierarchy {
    root: Option<Component>,
    sub_parents: Vec<Component>,
}

impl ParentHierarchy {
    /// Start from the configured root, if any.
    #[must_use]
    pub fn new(root: Option<Component>) -> Self {
        Self {
            root,
            sub_parents: Vec::new(),
        }
    }

    #[must_use]
    pub const fn root(&self) -> Option<&Component> {
        self.root.as_ref()
    }

    /// Sub-parents collected so far, in discovery order.
    #[must_use]
    pub fn sub_parents(&self) -> &[Component] {
        &self.sub_parents
    }

    /// Record a parent discovered by an extractor.
    ///
    /// Its own nested components are lifted into the sub-parent list
    /// directly after it.
    pub fn absorb(&mut self, mut parent: Component) {
        let nested = std::mem::take(&mut parent.components);
        self.sub_parents.push(parent);
        self.sub_parents.extend(nested);
    }

    /// Resolve the final root and ensure the root edge.
    ///
    /// Without sub-parents the root and edges are returned as they are.
    /// Otherwise the first sub-parent becomes the root when none was
    /// configured, sub-parents equal to the root are dropped, the rest are
    /// merged into `root.components`, and the root gains an edge to each.
    /// A root left with one child of the same name collapses into that
    /// child unless the root is a container image.
    #[must_use]
    pub fn finish(self, edges: Vec<DependencyEdge>) -> (Option<Component>, Vec<DependencyEdge>) {
        let Self { root, sub_parents } = self;
        let Some(first) = sub_parents.first() else {
            return (root, edges);
        };
        let mut root = root.unwrap_or_else(|| first.clone());
        let root_key = root.identity_key();
        let subs: Vec<Component> = sub_parents
            .into_iter()
            .filter(|sub| sub.identity_key() != root_key)
            .collect();
        if subs.is_empty() {
            return (Some(root), edges);
        }

        let existing = std::mem::take(&mut root.components);
        let children = trim_components(existing.into_iter().chain(subs));
        let child_refs: Vec<String> = children.iter().filter_map(Component::reference).collect();
        root.components = children;

        if root.components.len() == 1
            && root.components[0].name == root.name
            && !root.is_container_purl()
        {
            tracing::debug!("Collapsing root {} into its only sub-component", root.name);
            let mut child = root.components.remove(0);
            child.components.clear();
            root = child;
        }

        let edges = match root.reference() {
            Some(root_ref) => merge_dependencies(
                edges,
                vec![DependencyEdge::depends(root_ref, child_refs)],
                Some(&root),
            ),
            None => {
                tracing::debug!("Root component {} has no bom-ref; no root edge added", root.name);
                edges
            }
        };
        (Some(root), edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(name: &str, purl: &str) -> Component {
        Component::new(ComponentType::Application, name).with_purl(purl)
    }

    #[test]
    fn test_preset_parent_wins() {
        let project = ProjectConfig {
            name: Some("named".to_string()),
            version: Some("1.0".to_string()),
            parent_component: Some(app("preset", "pkg:generic/preset@2")),
            ..ProjectConfig::default()
        };
        assert_eq!(determine_parent_component(&project).unwrap().name, "preset");
    }

    #[test]
    fn test_name_and_version_make_a_root() {
        let project = ProjectConfig {
            name: Some("shop".to_string()),
            version: Some("3.1.0".to_string()),
            group: Some("acme".to_string()),
            ..ProjectConfig::default()
        };
        let root = determine_parent_component(&project).unwrap();
        assert_eq!(root.purl.as_deref(), Some("pkg:application/acme/shop@3.1.0"));
        assert_eq!(root.bom_ref.as_deref(), Some("pkg:application/acme/shop@3.1.0"));

        let name_only = ProjectConfig {
            name: Some("shop".to_string()),
            ..ProjectConfig::default()
        };
        assert!(determine_parent_component(&name_only).is_none());
    }

    #[test]
    fn test_default_parent_from_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("billing-service");
        std::fs::create_dir(&dir).unwrap();
        let parent = default_parent_component(&dir, "npm", &ProjectConfig::default());
        assert_eq!(parent.name, "billing-service");
        assert_eq!(parent.version.as_deref(), Some("latest"));
        assert_eq!(parent.component_type, ComponentType::Application);
        assert_eq!(parent.bom_ref.as_deref(), Some("pkg:npm/billing-service@latest"));

        let file = dir.join("package.json");
        std::fs::write(&file, "{}").unwrap();
        assert_eq!(
            default_parent_component(&file, "npm", &ProjectConfig::default()).name,
            "billing-service"
        );
    }

    #[test]
    fn test_default_parent_for_tar_is_container() {
        let project = ProjectConfig {
            name: Some("image.tar".to_string()),
            ..ProjectConfig::default()
        };
        let parent = default_parent_component(Path::new("."), "generic", &project);
        assert_eq!(parent.component_type, ComponentType::Container);
    }

    #[test]
    fn test_first_sub_parent_becomes_root() {
        let mut hierarchy = ParentHierarchy::new(None);
        hierarchy.absorb(app("web", "pkg:npm/web@1"));
        hierarchy.absorb(app("api", "pkg:maven/com.acme/api@1"));
        let (root, edges) = hierarchy.finish(vec![]);
        let root = root.unwrap();
        assert_eq!(root.name, "web");
        assert_eq!(root.components.len(), 1);
        assert_eq!(root.components[0].name, "api");
        assert_eq!(edges, vec![DependencyEdge::depends("pkg:npm/web@1", ["pkg:maven/com.acme/api@1"])]);
    }

    #[test]
    fn test_nested_components_are_lifted() {
        let mut parent = app("mono", "pkg:maven/com.acme/mono@1");
        parent.components = vec![
            app("mod-a", "pkg:maven/com.acme/mod-a@1"),
            app("mod-b", "pkg:maven/com.acme/mod-b@1"),
        ];
        let mut hierarchy = ParentHierarchy::new(Some(app("root", "pkg:generic/root@1")));
        hierarchy.absorb(parent);
        assert_eq!(hierarchy.sub_parents().len(), 3);
        assert!(hierarchy.sub_parents()[0].components.is_empty());
        let (root, edges) = hierarchy.finish(vec![]);
        assert_eq!(root.unwrap().components.len(), 3);
        assert_eq!(edges[0].depends_on.len(), 3);
    }

    #[test]
    fn test_collapse_single_same_name_child() {
        let mut hierarchy = ParentHierarchy::new(Some(app("app", "pkg:generic/app@latest")));
        hierarchy.absorb(app("app", "pkg:npm/app@1.0.0"));
        let (root, edges) = hierarchy.finish(vec![]);
        let root = root.unwrap();
        assert_eq!(root.purl.as_deref(), Some("pkg:npm/app@1.0.0"));
        assert!(root.components.is_empty());
        assert!(edges.iter().all(|e| !e.is_self_referential()));
    }

    #[test]
    fn test_container_root_never_collapses() {
        let root = Component::new(ComponentType::Container, "app").with_purl("pkg:container/app@latest");
        let mut hierarchy = ParentHierarchy::new(Some(root));
        hierarchy.absorb(app("app", "pkg:npm/app@1.0.0"));
        let (root, _) = hierarchy.finish(vec![]);
        let root = root.unwrap();
        assert_eq!(root.purl.as_deref(), Some("pkg:container/app@latest"));
        assert_eq!(root.components.len(), 1);
    }

    #[test]
    fn test_sub_parent_equal_to_root_is_dropped() {
        let root = app("svc", "pkg:npm/svc@1");
        let mut hierarchy = ParentHierarchy::new(Some(root.clone()));
        hierarchy.absorb(root);
        let (root, edges) = hierarchy.finish(vec![]);
        assert!(root.unwrap().components.is_empty());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_existing_root_components_are_kept() {
        let mut root = app("svc", "pkg:generic/svc@1");
        root.components = vec![app("docs", "pkg:generic/docs@1")];
        let mut hierarchy = ParentHierarchy::new(Some(root));
        hierarchy.absorb(app("cli", "pkg:cargo/cli@1"));
        let (root, _) = hierarchy.finish(vec![]);
        let names: Vec<_> = root.unwrap().components.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["docs", "cli"]);
    }

    #[test]
    fn test_no_sub_parents_is_a_no_op() {
        let edges = vec![DependencyEdge::depends("a", ["b"])];
        let (root, out) = ParentHierarchy::new(None).finish(edges.clone());
        assert!(root.is_none());
        assert_eq!(out, edges);
    }
}
