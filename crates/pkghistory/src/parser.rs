//! Turning one revision's raw content into a [`PackageDefinition`].

use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::error::{ParseFailure, ParseFailureKind};
use crate::types::PackageDefinition;

/// Per-call parser configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report use of deprecated features as [`ParseFailureKind::Deprecated`]
    /// instead of tolerating them.
    pub strict_deprecations: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            strict_deprecations: true,
        }
    }
}

/// Parses package definitions.
///
/// `name` is the logical package name the caller expects the content to
/// define, and `path` is where the content came from (used in messages).
/// Implementations classify every failure with a [`ParseFailureKind`] so the
/// walker can tell historical noise from real defects.
pub trait DefinitionParser {
    fn parse(
        &self,
        name: &str,
        path: &Path,
        contents: &[u8],
        options: &ParseOptions,
    ) -> Result<PackageDefinition, ParseFailure>;
}

impl<P: DefinitionParser + ?Sized> DefinitionParser for &P {
    fn parse(
        &self,
        name: &str,
        path: &Path,
        contents: &[u8],
        options: &ParseOptions,
    ) -> Result<PackageDefinition, ParseFailure> {
        (**self).parse(name, path, contents, options)
    }
}

// ============================================================================
// JSON definitions
// ============================================================================

/// Top-level keys that older definitions used and that are now deprecated.
const DEPRECATED_KEYS: &[&str] = &["sha1", "md5"];

/// Parser for package definitions stored as a JSON object.
///
/// ```
/// use pkghistory::{DefinitionParser, JsonDefinitionParser, ParseOptions};
/// use std::path::Path;
///
/// let contents = br#"{
///     "name": "foo",
///     "stable": { "version": "1.2.0" },
///     "bottle": { "rebuild": 1, "checksums": {} }
/// }"#;
///
/// let def = JsonDefinitionParser
///     .parse("foo", Path::new("Formula/foo.json"), contents, &ParseOptions::default())
///     .unwrap();
/// assert_eq!(def.version().as_str(), "1.2.0");
/// assert_eq!(def.bottle.rebuild, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDefinitionParser;

impl DefinitionParser for JsonDefinitionParser {
    fn parse(
        &self,
        name: &str,
        path: &Path,
        contents: &[u8],
        options: &ParseOptions,
    ) -> Result<PackageDefinition, ParseFailure> {
        let text = std::str::from_utf8(contents).map_err(|e| {
            ParseFailure::syntax(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;

        if text.trim().is_empty() {
            return Err(ParseFailure::unavailable(format!(
                "no package definition in {}",
                path.display()
            )));
        }

        let mut value: Value = serde_json::from_str(text).map_err(|e| {
            ParseFailure::syntax(format!("{}: {}", path.display(), e))
        })?;

        let object = value.as_object_mut().ok_or_else(|| {
            ParseFailure::type_mismatch(format!(
                "{}: expected a JSON object at top level",
                path.display()
            ))
        })?;

        for key in DEPRECATED_KEYS {
            if object.remove(*key).is_some() {
                if options.strict_deprecations {
                    return Err(ParseFailure::deprecated(format!(
                        "{}: `{}` is deprecated",
                        path.display(),
                        key
                    )));
                }
                warn!("{}: ignoring deprecated `{}`", path.display(), key);
            }
        }

        let def: PackageDefinition =
            serde_json::from_value(value).map_err(|e| classify_data_error(path, e))?;

        if def.name != name {
            return Err(ParseFailure::unavailable(format!(
                "{} defines `{}`, not `{}`",
                path.display(),
                def.name,
                name
            )));
        }

        validate(path, &def)?;
        Ok(def)
    }
}

fn classify_data_error(path: &Path, err: serde_json::Error) -> ParseFailure {
    let message = format!("{}: {}", path.display(), err);
    let text = err.to_string();
    let kind = if text.starts_with("unknown field") {
        ParseFailureKind::UnknownName
    } else if text.starts_with("missing field") {
        ParseFailureKind::Specification
    } else {
        ParseFailureKind::TypeMismatch
    };
    ParseFailure::new(kind, message)
}

fn validate(path: &Path, def: &PackageDefinition) -> Result<(), ParseFailure> {
    if def.version.is_none() && def.stable.is_none() && def.devel.is_none() {
        return Err(ParseFailure::specification(format!(
            "{}: `{}` declares no version",
            path.display(),
            def.name
        )));
    }

    let declared = def
        .version
        .iter()
        .chain(def.stable.iter().map(|s| &s.version))
        .chain(def.devel.iter().map(|d| &d.version));
    for version in declared {
        if version.as_str().trim().is_empty() {
            return Err(ParseFailure::validation(format!(
                "{}: blank version",
                path.display()
            )));
        }
    }

    if let (Some(version), Some(stable)) = (&def.version, &def.stable) {
        if *version != stable.version {
            return Err(ParseFailure::validation(format!(
                "{}: version {} disagrees with stable version {}",
                path.display(),
                version,
                stable.version
            )));
        }
    }

    for (tag, checksum) in &def.bottle.checksums {
        if !is_sha256(checksum) {
            return Err(ParseFailure::validation(format!(
                "{}: bottle checksum for {} is not a sha256: {}",
                path.display(),
                tag,
                checksum
            )));
        }
    }

    Ok(())
}

fn is_sha256(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}
