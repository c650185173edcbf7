//! Source-locator parsing
//!
//! `<type>+[<scheme>://]<host>/<path...>/<name>[@<revision>]`,
//! e.g. `git+https://github.com/guacsec/guac@v0.4.0`.

use super::purl::LocatorError;
use super::types::SourceInputSpec;

/// Parse a source locator into a source identity.
pub fn locator_to_source(locator: &str) -> Result<SourceInputSpec, LocatorError> {
    let trimmed = locator.trim();
    let (src_type, rest) = trimmed
        .split_once('+')
        .ok_or_else(|| LocatorError::MissingScheme {
            locator: locator.to_string(),
            expected: "<type>+",
        })?;
    if src_type.is_empty() || src_type.contains([':', '/']) {
        return Err(LocatorError::MissingType(locator.to_string()));
    }

    let without_scheme = rest.split_once("://").map_or(rest, |(_, r)| r);
    let name_start = without_scheme.rfind('/').map_or(0, |i| i + 1);
    let (path, revision) = match without_scheme.rfind('@') {
        Some(at) if at > name_start => (&without_scheme[..at], Some(&without_scheme[at + 1..])),
        _ => (without_scheme, None),
    };

    let path = path.trim_end_matches('/');
    let (namespace, name) = path
        .rsplit_once('/')
        .ok_or_else(|| LocatorError::MissingNamespace(locator.to_string()))?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    if namespace.is_empty() {
        return Err(LocatorError::MissingNamespace(locator.to_string()));
    }
    if name.is_empty() {
        return Err(LocatorError::MissingName(locator.to_string()));
    }

    Ok(SourceInputSpec::from_location(
        src_type.to_lowercase(),
        namespace,
        name,
        revision,
    ))
}
