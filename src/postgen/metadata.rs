//! Summary properties derived from the generated components.

use crate::model::{purl_type_and_namespace, Bom, Property, Technique};
use std::collections::BTreeSet;
use std::path::{Component as PathPart, Path, PathBuf};

pub const COMPONENT_TYPES_PROPERTY: &str = "cdx:bom:componentTypes";
pub const COMPONENT_NAMESPACES_PROPERTY: &str = "cdx:bom:componentNamespaces";
pub const COMPONENT_SRC_FILES_PROPERTY: &str = "cdx:bom:componentSrcFiles";

const SRC_FILE_PROPERTY: &str = "SrcFile";
/// Separator between values of a summary property: a literal backslash-n.
const VALUE_SEPARATOR: &str = "\\n";

/// Record the purl types, namespaces and manifest files seen in `bom`.
///
/// `SrcFile` property values and identity method values are rewritten
/// relative to `base_dir` (or the working directory) on the way. A
/// document without components is returned unchanged. Summary properties
/// already present are replaced rather than repeated.
#[must_use]
pub fn apply_metadata(mut bom: Bom, base_dir: Option<&Path>) -> Bom {
    if bom.components.is_empty() {
        return bom;
    }
    let mut types = BTreeSet::new();
    let mut namespaces = BTreeSet::new();
    let mut src_files = BTreeSet::new();

    for component in &mut bom.components {
        if let Some((ty, namespace)) = component.purl.as_deref().and_then(purl_type_and_namespace) {
            types.insert(ty);
            namespaces.extend(namespace.filter(|n| !n.is_empty()));
        }
        for property in &mut component.properties {
            if property.name == SRC_FILE_PROPERTY && !property.value.is_empty() {
                let relative = relative_dir(&property.value, base_dir);
                property.value.clone_from(&relative);
                src_files.insert(relative);
            }
        }
        let Some(evidence) = component.evidence.as_mut() else {
            continue;
        };
        for identity in &mut evidence.identity {
            if let Some(concluded) = identity.concluded_value.as_deref() {
                src_files.insert(relative_dir(concluded, base_dir));
                continue;
            }
            for method in identity.methods.iter_mut().flatten() {
                let Some(value) = method.value.as_mut() else {
                    continue;
                };
                let relative = relative_dir(value, base_dir);
                if method.technique == Technique::ManifestAnalysis && !value.is_empty() {
                    src_files.insert(relative.clone());
                }
                *value = relative;
            }
        }
    }

    if types.len() > 1 {
        tracing::debug!("Document includes {} component types", types.len());
    }
    if src_files.is_empty() && !types.contains("oci") {
        tracing::debug!("No manifest files recorded for any component");
    }

    let summary = [
        (COMPONENT_TYPES_PROPERTY, types),
        (COMPONENT_NAMESPACES_PROPERTY, namespaces),
        (COMPONENT_SRC_FILES_PROPERTY, src_files),
    ];
    let properties = &mut bom.metadata.properties;
    properties.retain(|p| !summary.iter().any(|(name, _)| p.name == *name));
    for (name, values) in summary {
        if !values.is_empty() {
            let joined = values.into_iter().collect::<Vec<_>>().join(VALUE_SEPARATOR);
            properties.push(Property::new(name, joined));
        }
    }
    bom
}

/// `value` relative to `base_dir`, or unchanged.
///
/// Paths under the system temp directory, relative paths, and paths that
/// would need to climb two or more levels above the base are kept as they
/// are, as is everything when the base directory does not exist.
#[must_use]
pub fn relative_dir(value: &str, base_dir: Option<&Path>) -> String {
    let path = Path::new(value);
    if path.starts_with(std::env::temp_dir()) || !path.is_absolute() {
        return value.to_string();
    }
    let base = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(_) => return value.to_string(),
        },
    };
    if !base.exists() {
        return value.to_string();
    }
    let relative = lexical_relative(&base, path);
    let mut parts = relative.components();
    let climbs_twice = matches!(
        (parts.next(), parts.next()),
        (Some(PathPart::ParentDir), Some(PathPart::ParentDir))
    );
    if climbs_twice {
        value.to_string()
    } else {
        relative.to_string_lossy().into_owned()
    }
}

fn lexical_relative(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<_> = base.components().filter(|c| *c != PathPart::CurDir).collect();
    let target: Vec<_> = target.components().filter(|c| *c != PathPart::CurDir).collect();
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for part in &target[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Evidence, Identity, IdentityMethod, SpecVersion};
    use tempfile::TempDir;

    fn property<'a>(bom: &'a Bom, name: &str) -> Option<&'a str> {
        bom.metadata
            .properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    #[test]
    fn test_types_and_namespaces() {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = vec![
            Component::library("core", "pkg:maven/org.acme/core@1"),
            Component::library("lodash", "pkg:npm/lodash@4"),
            Component::library("util", "pkg:maven/com.other/util@2"),
        ];
        let bom = apply_metadata(bom, None);
        assert_eq!(property(&bom, COMPONENT_TYPES_PROPERTY), Some("maven\\nnpm"));
        assert_eq!(
            property(&bom, COMPONENT_NAMESPACES_PROPERTY),
            Some("com.other\\norg.acme")
        );
        assert_eq!(property(&bom, COMPONENT_SRC_FILES_PROPERTY), None);
    }

    // the base must exist and sit outside the temp dir, wherever the checkout lives
    #[cfg(unix)]
    #[test]
    fn test_src_files_are_relativised() {
        let base = PathBuf::from("/");
        let manifest = base.join("work").join("project").join("web").join("package.json");
        let manifest = manifest.to_string_lossy().into_owned();

        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = vec![Component::library("a", "pkg:npm/a@1")
            .with_property("SrcFile", manifest.clone())
            .with_evidence(Evidence::with_identities(vec![Identity::new(
                "purl",
                1.0,
                vec![IdentityMethod::new(Technique::ManifestAnalysis, 1.0, manifest)],
            )]))];
        let bom = apply_metadata(bom, Some(&base));
        let component = &bom.components[0];
        let expected = "work/project/web/package.json".to_string();
        assert_eq!(component.properties[0].value, expected);
        let method = &component.evidence.as_ref().unwrap().identity[0]
            .methods
            .as_ref()
            .unwrap()[0];
        assert_eq!(method.value.as_deref(), Some(expected.as_str()));
        assert_eq!(property(&bom, COMPONENT_SRC_FILES_PROPERTY), Some(expected.as_str()));
    }

    #[test]
    fn test_concluded_value_preferred_over_methods() {
        let mut identity = Identity::new(
            "purl",
            1.0,
            vec![IdentityMethod::new(Technique::ManifestAnalysis, 1.0, "ignored.txt")],
        );
        identity.concluded_value = Some("requirements.txt".to_string());
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = vec![Component::library("a", "pkg:pypi/a@1")
            .with_evidence(Evidence::with_identities(vec![identity]))];
        let bom = apply_metadata(bom, None);
        assert_eq!(property(&bom, COMPONENT_SRC_FILES_PROPERTY), Some("requirements.txt"));
    }

    #[test]
    fn test_no_components_no_properties() {
        let bom = apply_metadata(Bom::new(SpecVersion::V1_6), None);
        assert!(bom.metadata.properties.is_empty());
    }

    #[test]
    fn test_repeated_application_does_not_duplicate() {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = vec![Component::library("a", "pkg:npm/a@1")];
        let once = apply_metadata(bom, None);
        let twice = apply_metadata(once.clone(), None);
        assert_eq!(once.metadata.properties, twice.metadata.properties);
    }

    #[test]
    fn test_relative_dir_rules() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&base).unwrap();

        assert_eq!(relative_dir("pom.xml", Some(&base)), "pom.xml");

        let outside = Path::new("/definitely/elsewhere/pom.xml");
        let missing = Path::new("/no/such/base/dir");
        assert_eq!(
            relative_dir(&outside.to_string_lossy(), Some(missing)),
            outside.to_string_lossy()
        );

        let temp_file = std::env::temp_dir().join("x").join("pom.xml");
        let temp_file = temp_file.to_string_lossy().into_owned();
        assert_eq!(relative_dir(&temp_file, Some(&base)), temp_file);
    }

    #[test]
    fn test_lexical_relative() {
        assert_eq!(
            lexical_relative(Path::new("/repo/app"), Path::new("/repo/lib/x.json")),
            PathBuf::from("../lib/x.json")
        );
        assert_eq!(
            lexical_relative(Path::new("/repo"), Path::new("/repo/x.json")),
            PathBuf::from("x.json")
        );
    }
}
