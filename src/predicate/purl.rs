//! Package-URL parsing
//!
//! `pkg:<type>/<namespace...>/<name>@<version>?<qualifiers>#<subpath>`

use super::types::{PackageQualifier, PkgInputSpec};
use thiserror::Error;

/// Why a locator string could not be turned into a package or source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("missing '{expected}' scheme in '{locator}'")]
    MissingScheme {
        locator: String,
        expected: &'static str,
    },
    #[error("missing type in '{0}'")]
    MissingType(String),
    #[error("missing namespace in '{0}'")]
    MissingNamespace(String),
    #[error("missing name in '{0}'")]
    MissingName(String),
}

/// Parse a package URL into a package identity.
pub fn purl_to_pkg(purl: &str) -> Result<PkgInputSpec, LocatorError> {
    let trimmed = purl.trim();
    let rest = match trimmed.get(..4) {
        Some(scheme) if scheme.eq_ignore_ascii_case("pkg:") => &trimmed[4..],
        _ => {
            return Err(LocatorError::MissingScheme {
                locator: purl.to_string(),
                expected: "pkg:",
            })
        }
    };
    let rest = rest.trim_start_matches('/');

    let (rest, subpath) = match rest.split_once('#') {
        Some((head, sub)) => (head, Some(sub.trim_matches('/'))),
        None => (rest, None),
    };
    let (rest, query) = match rest.split_once('?') {
        Some((head, q)) => (head, Some(q)),
        None => (rest, None),
    };

    let (pkg_type, path) = rest
        .split_once('/')
        .ok_or_else(|| LocatorError::MissingName(purl.to_string()))?;
    if pkg_type.is_empty() {
        return Err(LocatorError::MissingType(purl.to_string()));
    }
    let path = path.trim_end_matches('/');

    // The version separator is the last '@' inside the final path segment;
    // an '@' opening a segment is an npm scope.
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let (path, version) = match path.rfind('@') {
        Some(at) if at > name_start => (&path[..at], Some(percent_decode(&path[at + 1..]))),
        _ => (path, None),
    };

    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(percent_decode)
        .collect();
    let name = segments
        .pop()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| LocatorError::MissingName(purl.to_string()))?;
    let namespace = (!segments.is_empty()).then(|| segments.join("/"));

    let mut qualifiers: Vec<PackageQualifier> = query
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| PackageQualifier {
            key: k.to_lowercase(),
            value: percent_decode(v),
        })
        .collect();
    qualifiers.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(PkgInputSpec {
        pkg_type: pkg_type.to_lowercase(),
        namespace,
        name,
        version: version.filter(|v| !v.is_empty()),
        qualifiers,
        subpath: subpath.filter(|s| !s.is_empty()).map(percent_decode),
    })
}

/// Decode `%XX` escapes; malformed escapes are kept literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
