//! Identity keys and package-url helpers for components.
//!
//! Components are deduplicated by a merge key derived with a tiered fallback:
//!
//! 1. **PURL** - the package-url string, when present
//! 2. **bom-ref** - the graph node key, used for assets without a purl
//! 3. **Name + version** - last resort for bare records
//!
//! The key is always compared lowercase.

use packageurl::PackageUrl;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Merge key for a component record.
///
/// Equality and hashing only consider the normalized key string, so two
/// records producing the same lowercase key always collide regardless of
/// which tier the key came from.
#[derive(Debug, Clone, Eq)]
pub struct IdentityKey {
    value: String,
    source: KeySource,
}

/// Which component field produced an [`IdentityKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    /// Derived from the package-url
    Purl,
    /// Derived from the bom-ref
    BomRef,
    /// Derived from name and version
    NameVersion,
}

impl IdentityKey {
    /// Build a key from the component identity fields.
    #[must_use]
    pub fn derive(purl: Option<&str>, bom_ref: Option<&str>, name: &str, version: Option<&str>) -> Self {
        if let Some(purl) = purl.filter(|p| !p.is_empty()) {
            return Self {
                value: purl.to_lowercase(),
                source: KeySource::Purl,
            };
        }
        if let Some(bom_ref) = bom_ref.filter(|r| !r.is_empty()) {
            return Self {
                value: bom_ref.to_lowercase(),
                source: KeySource::BomRef,
            };
        }
        Self {
            value: format!("{name}{}", version.unwrap_or_default()).to_lowercase(),
            source: KeySource::NameVersion,
        }
    }

    /// The normalized key string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The tier the key was derived from
    #[must_use]
    pub const fn source(&self) -> KeySource {
        self.source
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// ============================================================================
// Package URL helpers
// ============================================================================

/// Build a package-url string. Empty group and version are omitted.
///
/// Returns `None` when the purl type or name is rejected by the parser.
#[must_use]
pub fn build_purl(purl_type: &str, group: Option<&str>, name: &str, version: Option<&str>) -> Option<String> {
    let mut purl = match PackageUrl::new(purl_type.to_string(), name.to_string()) {
        Ok(purl) => purl,
        Err(e) => {
            tracing::debug!("Unable to build purl for {purl_type}/{name}: {e}");
            return None;
        }
    };
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        purl.with_namespace(group.to_string());
    }
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        purl.with_version(version.to_string());
    }
    Some(purl.to_string())
}

/// Percent-decode a purl to form its bom-ref.
///
/// Undecodable input is returned unchanged.
#[must_use]
pub fn bom_ref_from_purl(purl: &str) -> String {
    urlencoding::decode(purl).map_or_else(|_| purl.to_string(), std::borrow::Cow::into_owned)
}

/// Recover a canonical purl from a bom-ref that carries one.
#[must_use]
pub fn purl_from_bom_ref(bom_ref: &str) -> Option<String> {
    if !bom_ref.starts_with("pkg:") {
        return None;
    }
    PackageUrl::from_str(bom_ref).ok().map(|p| p.to_string())
}

/// Parsed type, namespace of a purl.
#[must_use]
pub fn purl_type_and_namespace(purl: &str) -> Option<(String, Option<String>)> {
    let parsed = PackageUrl::from_str(purl).ok()?;
    Some((
        parsed.ty().to_string(),
        parsed.namespace().map(ToString::to_string),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_prefers_purl() {
        let key = IdentityKey::derive(
            Some("pkg:npm/Lodash@4.17.21"),
            Some("other"),
            "lodash",
            Some("4.17.21"),
        );
        assert_eq!(key.value(), "pkg:npm/lodash@4.17.21");
        assert_eq!(key.source(), KeySource::Purl);
    }

    #[test]
    fn test_key_falls_back_to_bom_ref_then_name() {
        let key = IdentityKey::derive(None, Some("crypto/algorithm/AES@1"), "aes", None);
        assert_eq!(key.source(), KeySource::BomRef);
        assert_eq!(key.value(), "crypto/algorithm/aes@1");

        let key = IdentityKey::derive(Some(""), None, "Foo", Some("1.0"));
        assert_eq!(key.source(), KeySource::NameVersion);
        assert_eq!(key.value(), "foo1.0");
    }

    #[test]
    fn test_key_equality_ignores_source() {
        let a = IdentityKey::derive(Some("pkg:x"), None, "a", None);
        let b = IdentityKey::derive(None, Some("PKG:X"), "b", None);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_build_purl_and_decode() {
        let purl = build_purl("npm", Some("@angular"), "core", Some("17.0.0"))
            .expect("valid purl");
        assert!(purl.starts_with("pkg:npm/"));
        assert_eq!(bom_ref_from_purl(&purl), "pkg:npm/@angular/core@17.0.0");
        assert_eq!(bom_ref_from_purl("pkg:npm/%40scope/x@1"), "pkg:npm/@scope/x@1");
    }

    #[test]
    fn test_build_purl_skips_empty_parts() {
        let purl = build_purl("application", Some(""), "demo", None).expect("valid purl");
        assert_eq!(purl, "pkg:application/demo");
    }

    #[test]
    fn test_purl_type_and_namespace() {
        let (ty, ns) = purl_type_and_namespace("pkg:maven/org.apache/commons@1.0").expect("parses");
        assert_eq!(ty, "maven");
        assert_eq!(ns.as_deref(), Some("org.apache"));
        assert!(purl_type_and_namespace("not a purl").is_none());
        assert!(purl_from_bom_ref("crypto/aes").is_none());
    }
}
