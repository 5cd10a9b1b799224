//! Walking a package definition's history.

use std::path::PathBuf;
use tracing::{debug, trace};

use crate::error::{HistoryError, ParseFailure, ParseFailureKind, Result};
use crate::parser::{DefinitionParser, ParseOptions};
use crate::source::{RevisionSource, Revisions};
use crate::types::{
    AttributesMap, BottleVersionMap, Channel, ChannelMap, FileIdentity, PackageDefinition,
    RevisionId,
};

/// Default number of distinct versions a walk may see before it stops.
/// The walk ends once this many have been exceeded.
pub const MAX_VERSIONS_DEPTH: usize = 2;

/// Configuration for a [`HistoryWalker`].
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Stop once more than this many distinct versions have been seen.
    pub max_versions_depth: usize,
    /// Ask the parser to reject deprecated features.
    pub strict_deprecations: bool,
    /// Report skipped revisions at debug level.
    pub log_failures: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_versions_depth: MAX_VERSIONS_DEPTH,
            strict_deprecations: true,
            log_failures: true,
        }
    }
}

/// Walks the history of one package definition file.
///
/// Revisions are visited newest first. Each one is fetched and parsed;
/// revisions that fail to parse for expected reasons (see
/// [`ParseFailureKind::is_benign`]) are skipped, anything else aborts the walk.
///
/// # Example
///
/// ```
/// use pkghistory::{FileIdentity, HistoryWalker, JsonDefinitionParser, MemoryHistory};
///
/// let history = MemoryHistory::new()
///     .with_revision("c3", r#"{"name":"foo","stable":{"version":"2.0"}}"#)
///     .with_revision("b2", "not json at all")
///     .with_revision("a1", r#"{"name":"foo","stable":{"version":"1.0"}}"#);
///
/// let file = FileIdentity::new("/repo", "Formula/foo.json");
/// let walker = HistoryWalker::new(&history, JsonDefinitionParser, "foo", file);
///
/// let map = walker
///     .version_attributes_map(&["version".to_string()], "main")
///     .unwrap();
/// let stable = &map["version"][&pkghistory::Channel::Stable];
/// assert_eq!(stable.len(), 2);
/// ```
pub struct HistoryWalker<S, P> {
    source: S,
    parser: P,
    name: String,
    file: FileIdentity,
    config: WalkConfig,
}

impl<S: RevisionSource, P: DefinitionParser> HistoryWalker<S, P> {
    pub fn new(source: S, parser: P, name: impl Into<String>, file: FileIdentity) -> Self {
        Self {
            source,
            parser,
            name: name.into(),
            file,
            config: WalkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &FileIdentity {
        &self.file
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Revisions that changed the file on `branch`, newest first.
    pub fn revisions(&self, branch: &str) -> Result<Revisions<'_>> {
        self.source.revisions(&self.file, branch)
    }

    /// The file's raw content at `revision`.
    pub fn contents_at(&self, revision: &RevisionId) -> Result<Vec<u8>> {
        self.source.contents_at(&self.file, revision)
    }

    /// Fetch and parse the definition at `revision`, then hand it to `f`.
    ///
    /// Returns `Ok(None)` when the revision yields nothing usable: the file is
    /// missing there, or parsing (or `f`) failed with a benign or
    /// unavailable kind.
    pub fn definition_at<R>(
        &self,
        revision: &RevisionId,
        f: impl FnOnce(&PackageDefinition) -> std::result::Result<R, ParseFailure>,
    ) -> Result<Option<R>> {
        let contents = match self.contents_at(revision) {
            Ok(contents) => contents,
            Err(HistoryError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.parse_revision(revision, &contents, f)
    }

    /// Parse `contents` as the definition at `revision` and hand it to `f`.
    ///
    /// The parser runs with deprecations as configured for this call only.
    /// Failures from the parser and from `f` are classified the same way.
    pub fn parse_revision<R>(
        &self,
        revision: &RevisionId,
        contents: &[u8],
        f: impl FnOnce(&PackageDefinition) -> std::result::Result<R, ParseFailure>,
    ) -> Result<Option<R>> {
        let options = ParseOptions {
            strict_deprecations: self.config.strict_deprecations,
        };
        let path: PathBuf = self.file.path();

        let outcome = self
            .parser
            .parse(&self.name, &path, contents, &options)
            .and_then(|def| f(&def));

        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(failure) if failure.kind == ParseFailureKind::Unavailable => Ok(None),
            Err(failure) if failure.kind.is_benign() => {
                if self.config.log_failures {
                    debug!(
                        package = %self.name,
                        revision = %revision,
                        kind = %failure.kind,
                        "{} in {} at revision {}",
                        failure.message,
                        self.name,
                        revision
                    );
                }
                Ok(None)
            }
            Err(failure) => Err(HistoryError::Parse(failure)),
        }
    }

    /// Bottle rebuild numbers per package version.
    ///
    /// Only revisions declaring at least one bottle checksum contribute a
    /// rebuild number. The walk stops right after the revision that takes the
    /// number of distinct package versions past the depth bound.
    pub fn bottle_version_map(&self, branch: &str) -> Result<BottleVersionMap> {
        let mut map = BottleVersionMap::new();
        let mut versions_seen = 0;

        for revision in self.revisions(branch)? {
            let revision = revision?;
            trace!(revision = %revision, "reading bottle spec");

            let seen = self.definition_at(&revision, |def| {
                let pkg_version = def.pkg_version();
                let already_keyed = map.contains_key(&pkg_version);
                if !def.bottle.checksums.is_empty() {
                    map.entry(pkg_version).or_default().push(def.bottle.rebuild);
                    Ok(map.len())
                } else if already_keyed {
                    Ok(map.len())
                } else {
                    Ok(map.len() + 1)
                }
            })?;

            if let Some(seen) = seen {
                versions_seen = seen;
            }
            if versions_seen > self.config.max_versions_depth {
                return Ok(map);
            }
        }

        Ok(map)
    }

    /// Historical values of `attributes`, per release channel and version.
    ///
    /// Values are read from the top-level definition and filed under each
    /// present channel's own version. The walk stops after the revision that
    /// takes the number of distinct stable versions past the depth bound.
    /// With no attributes requested nothing is read at all.
    pub fn version_attributes_map(
        &self,
        attributes: &[String],
        branch: &str,
    ) -> Result<AttributesMap> {
        let mut attributes_map = AttributesMap::new();
        if attributes.is_empty() {
            return Ok(attributes_map);
        }

        let mut stable_versions_seen = 0;
        for revision in self.revisions(branch)? {
            let revision = revision?;
            trace!(revision = %revision, "reading attributes");

            self.definition_at(&revision, |def| {
                let values = attributes
                    .iter()
                    .map(|attribute| {
                        def.attribute(attribute).ok_or_else(|| {
                            ParseFailure::unknown_name(format!(
                                "undefined attribute `{}`",
                                attribute
                            ))
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                for (attribute, value) in attributes.iter().zip(values) {
                    let map = attributes_map.entry(attribute.clone()).or_default();
                    record_channels(map, def, value);

                    let version = def.version();
                    let stable_keys = map.get(&Channel::Stable);
                    let stable_count = stable_keys.map_or(0, |versions| versions.len())
                        + usize::from(!stable_keys.is_some_and(|v| v.contains_key(&version)));
                    stable_versions_seen = stable_versions_seen.max(stable_count);
                }
                Ok(())
            })?;

            if stable_versions_seen > self.config.max_versions_depth {
                break;
            }
        }

        Ok(attributes_map)
    }
}

fn record_channels(map: &mut ChannelMap, def: &PackageDefinition, value: serde_json::Value) {
    for channel in Channel::ALL {
        if let Some(spec) = def.channel(channel) {
            map.entry(channel)
                .or_default()
                .entry(spec.version.clone())
                .or_default()
                .push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonDefinitionParser;
    use crate::source::MemoryHistory;
    use crate::types::{PkgVersion, Version};
    use serde_json::json;
    use std::cell::RefCell;
    use std::path::Path;

    const SHA: &str = "1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988";

    fn file() -> FileIdentity {
        FileIdentity::new("/repo", "Formula/foo.json")
    }

    fn stable_def(version: &str) -> String {
        json!({ "name": "foo", "stable": { "version": version } }).to_string()
    }

    fn bottled_def(version: &str, revision: u32, rebuild: u32) -> String {
        json!({
            "name": "foo",
            "version": version,
            "revision": revision,
            "bottle": { "rebuild": rebuild, "checksums": { "arm64_sonoma": SHA } }
        })
        .to_string()
    }

    fn unbottled_def(version: &str) -> String {
        json!({ "name": "foo", "version": version }).to_string()
    }

    fn walker(history: &MemoryHistory) -> HistoryWalker<&MemoryHistory, JsonDefinitionParser> {
        HistoryWalker::new(history, JsonDefinitionParser, "foo", file())
    }

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Parser double that records the options of every call and fails on
    /// demand.
    struct SpyParser {
        seen: RefCell<Vec<ParseOptions>>,
        fail_with: Option<ParseFailureKind>,
    }

    impl SpyParser {
        fn new(fail_with: Option<ParseFailureKind>) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                fail_with,
            }
        }
    }

    impl DefinitionParser for SpyParser {
        fn parse(
            &self,
            name: &str,
            path: &Path,
            contents: &[u8],
            options: &ParseOptions,
        ) -> std::result::Result<PackageDefinition, ParseFailure> {
            self.seen.borrow_mut().push(*options);
            match self.fail_with {
                Some(kind) => Err(ParseFailure::new(kind, "spy failure")),
                None => JsonDefinitionParser.parse(name, path, contents, options),
            }
        }
    }

    /// Deserializes without any validation, so inconsistent definitions
    /// reach the walker.
    struct PlainJson;

    impl DefinitionParser for PlainJson {
        fn parse(
            &self,
            _name: &str,
            _path: &Path,
            contents: &[u8],
            _options: &ParseOptions,
        ) -> std::result::Result<PackageDefinition, ParseFailure> {
            serde_json::from_slice(contents).map_err(|e| ParseFailure::syntax(e.to_string()))
        }
    }

    // ── definition_at / parse_revision ─────────────────────────────────

    #[test]
    fn test_definition_at_success() {
        let history = MemoryHistory::new().with_revision("a1", stable_def("1.0"));
        let w = walker(&history);

        let version = w
            .definition_at(&RevisionId::new("a1"), |def| Ok(def.version()))
            .unwrap();
        assert_eq!(version.unwrap().as_str(), "1.0");
    }

    #[test]
    fn test_definition_at_missing_file_is_none() {
        let history = MemoryHistory::new().with_missing("a1");
        let w = walker(&history);

        let result = w.definition_at(&RevisionId::new("a1"), |_| Ok(())).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_benign_failures_yield_none() {
        for kind in [
            ParseFailureKind::Syntax,
            ParseFailureKind::UnknownName,
            ParseFailureKind::TypeMismatch,
            ParseFailureKind::Specification,
            ParseFailureKind::Validation,
            ParseFailureKind::Execution,
            ParseFailureKind::MissingLoadTarget,
            ParseFailureKind::Deprecated,
            ParseFailureKind::Unavailable,
        ] {
            let history = MemoryHistory::new().with_revision("a1", stable_def("1.0"));
            let w = HistoryWalker::new(&history, SpyParser::new(Some(kind)), "foo", file());
            let result = w.definition_at(&RevisionId::new("a1"), |_| Ok(())).unwrap();
            assert!(result.is_none(), "{kind:?} should be contained");
        }
    }

    #[test]
    fn test_internal_failure_propagates() {
        let history = MemoryHistory::new().with_revision("a1", stable_def("1.0"));
        let w = HistoryWalker::new(
            &history,
            SpyParser::new(Some(ParseFailureKind::Internal)),
            "foo",
            file(),
        );
        let err = w
            .definition_at(&RevisionId::new("a1"), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Parse(ParseFailure {
                kind: ParseFailureKind::Internal,
                ..
            })
        ));
    }

    #[test]
    fn test_callback_failure_is_classified() {
        let history = MemoryHistory::new().with_revision("a1", stable_def("1.0"));
        let w = walker(&history);

        let benign = w
            .definition_at(&RevisionId::new("a1"), |_| {
                Err::<(), _>(ParseFailure::unknown_name("no such attribute"))
            })
            .unwrap();
        assert!(benign.is_none());

        let fatal = w.definition_at(&RevisionId::new("a1"), |_| {
            Err::<(), _>(ParseFailure::internal("bug"))
        });
        assert!(fatal.is_err());
    }

    #[test]
    fn test_parser_sees_strict_deprecations_per_call() {
        for fail_with in [None, Some(ParseFailureKind::Syntax), Some(ParseFailureKind::Internal)] {
            let history = MemoryHistory::new().with_revision("a1", stable_def("1.0"));
            let spy = SpyParser::new(fail_with);
            let strict = HistoryWalker::new(&history, &spy, "foo", file());
            let lenient = HistoryWalker::new(&history, &spy, "foo", file()).with_config(
                WalkConfig {
                    strict_deprecations: false,
                    ..WalkConfig::default()
                },
            );

            // A strict call, even a failing one, leaves nothing behind for
            // the next caller.
            let _ = strict.definition_at(&RevisionId::new("a1"), |_| Ok(()));
            let _ = lenient.definition_at(&RevisionId::new("a1"), |_| Ok(()));
            let _ = strict.definition_at(&RevisionId::new("a1"), |_| Ok(()));

            let modes: Vec<bool> = spy.seen.borrow().iter().map(|o| o.strict_deprecations).collect();
            assert_eq!(modes, vec![true, false, true], "failing with {fail_with:?}");
        }
    }

    #[test]
    fn test_non_strict_config_reaches_parser() {
        let history = MemoryHistory::new().with_revision(
            "a1",
            json!({ "name": "foo", "version": "1.0", "sha1": "abc" }).to_string(),
        );
        let strict = walker(&history);
        assert!(
            strict
                .definition_at(&RevisionId::new("a1"), |_| Ok(()))
                .unwrap()
                .is_none()
        );

        let lenient = walker(&history).with_config(WalkConfig {
            strict_deprecations: false,
            ..WalkConfig::default()
        });
        assert!(
            lenient
                .definition_at(&RevisionId::new("a1"), |_| Ok(()))
                .unwrap()
                .is_some()
        );
    }

    // ── bottle_version_map ─────────────────────────────────────────────

    #[test]
    fn test_bottle_map_collects_rebuilds() {
        let history = MemoryHistory::new()
            .with_revision("d4", bottled_def("2.0", 0, 1))
            .with_revision("c3", bottled_def("2.0", 0, 0))
            .with_revision("b2", bottled_def("1.0", 0, 0));
        let map = walker(&history).bottle_version_map("main").unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map[&PkgVersion::new("2.0", 0)], vec![1, 0]);
        assert_eq!(map[&PkgVersion::new("1.0", 0)], vec![0]);
    }

    #[test]
    fn test_bottle_map_keys_by_pkg_version() {
        let history = MemoryHistory::new()
            .with_revision("c3", bottled_def("2.0", 1, 0))
            .with_revision("b2", bottled_def("2.0", 0, 0));
        let map = walker(&history).bottle_version_map("main").unwrap();

        let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["2.0", "2.0_1"]);
    }

    #[test]
    fn test_bottle_map_skips_unbottled_revisions() {
        let history = MemoryHistory::new()
            .with_revision("c3", unbottled_def("3.0"))
            .with_revision("b2", bottled_def("2.0", 0, 4));
        let map = walker(&history).bottle_version_map("main").unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map[&PkgVersion::new("2.0", 0)], vec![4]);
    }

    #[test]
    fn test_bottle_map_stops_past_depth() {
        let history = MemoryHistory::new()
            .with_revision("e5", bottled_def("4.0", 0, 0))
            .with_revision("d4", bottled_def("3.0", 0, 0))
            .with_revision("c3", bottled_def("2.0", 0, 0))
            .with_revision("b2", bottled_def("1.0", 0, 0))
            .with_revision("a1", bottled_def("0.9", 0, 0));
        let map = walker(&history).bottle_version_map("main").unwrap();

        // The third distinct version is included, then the walk stops.
        assert_eq!(map.len(), 3);
        assert!(map.contains_key(&PkgVersion::new("2.0", 0)));
        assert_eq!(history.fetch_count(), 3);
    }

    #[test]
    fn test_bottle_map_unbottled_versions_count_toward_depth() {
        let history = MemoryHistory::new()
            .with_revision("d4", bottled_def("3.0", 0, 0))
            .with_revision("c3", bottled_def("2.0", 0, 0))
            .with_revision("b2", unbottled_def("1.0"))
            .with_revision("a1", bottled_def("0.9", 0, 0));
        let map = walker(&history).bottle_version_map("main").unwrap();

        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(&PkgVersion::new("1.0", 0)));
        assert_eq!(history.fetch_count(), 3);
    }

    #[test]
    fn test_bottle_map_custom_depth() {
        let history = MemoryHistory::new()
            .with_revision("c3", bottled_def("3.0", 0, 0))
            .with_revision("b2", bottled_def("2.0", 0, 0))
            .with_revision("a1", bottled_def("1.0", 0, 0));
        let map = walker(&history)
            .with_config(WalkConfig {
                max_versions_depth: 0,
                ..WalkConfig::default()
            })
            .bottle_version_map("main")
            .unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(history.fetch_count(), 1);
    }

    #[test]
    fn test_bottle_map_fatal_failure_discards_partial_map() {
        let history = MemoryHistory::new()
            .with_revision("b2", bottled_def("2.0", 0, 0))
            .with_revision("a1", bottled_def("1.0", 0, 0));
        let w = HistoryWalker::new(
            &history,
            SpyParser::new(Some(ParseFailureKind::Internal)),
            "foo",
            file(),
        );
        assert!(w.bottle_version_map("main").is_err());
    }

    #[test]
    fn test_bottle_map_enumeration_failure_propagates() {
        let history = MemoryHistory::new()
            .with_revision("b2", bottled_def("2.0", 0, 0))
            .with_revision("a1", bottled_def("1.0", 0, 0))
            .failing_after(1);
        let err = walker(&history).bottle_version_map("main").unwrap_err();
        assert!(matches!(err, HistoryError::Command { .. }));
    }

    // ── version_attributes_map ─────────────────────────────────────────

    #[test]
    fn test_attributes_empty_request_reads_nothing() {
        let history = MemoryHistory::new()
            .with_revision("b2", stable_def("2.0"))
            .with_revision("a1", stable_def("1.0"));
        let map = walker(&history).version_attributes_map(&[], "main").unwrap();

        assert!(map.is_empty());
        assert_eq!(history.fetch_count(), 0);
        assert_eq!(history.listed_count(), 0);
    }

    #[test]
    fn test_attributes_stop_after_third_stable_version() {
        let history = MemoryHistory::new()
            .with_revision("e5", stable_def("1.0"))
            .with_revision("d4", stable_def("1.0"))
            .with_revision("c3", stable_def("0.9"))
            .with_revision("b2", stable_def("0.9"))
            .with_revision("a1", stable_def("0.8"))
            .with_revision("z0", stable_def("0.7"));
        let map = walker(&history)
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap();

        let stable = &map["version"][&Channel::Stable];
        let keys: Vec<&str> = stable.keys().map(|v| v.as_str()).collect();
        assert_eq!(keys, vec!["0.8", "0.9", "1.0"]);
        assert_eq!(stable[&Version::from("1.0")], vec![json!("1.0"), json!("1.0")]);
        assert_eq!(history.fetch_count(), 5);
    }

    #[test]
    fn test_attributes_depth_counts_stable_channel_versions() {
        let def = |stable: &str| {
            json!({ "name": "foo", "version": "9.9", "stable": { "version": stable } }).to_string()
        };
        let history = MemoryHistory::new()
            .with_revision("e5", def("1.0"))
            .with_revision("d4", def("1.0"))
            .with_revision("c3", def("0.9"))
            .with_revision("b2", def("0.9"))
            .with_revision("a1", def("0.8"))
            .with_revision("z0", def("0.7"));
        let w = HistoryWalker::new(&history, PlainJson, "foo", file());
        let map = w
            .version_attributes_map(&attrs(&["revision"]), "main")
            .unwrap();

        let keys: Vec<&str> = map["revision"][&Channel::Stable]
            .keys()
            .map(|v| v.as_str())
            .collect();
        assert_eq!(keys, vec!["0.8", "0.9", "1.0"]);
        assert_eq!(history.fetch_count(), 5);
    }

    #[test]
    fn test_attributes_values_come_from_top_level() {
        let history = MemoryHistory::new().with_revision(
            "a1",
            json!({
                "name": "foo",
                "version": "2.0",
                "stable": { "version": "2.0" },
                "devel": { "version": "2.1-beta" },
                "homepage": "https://example.com"
            })
            .to_string(),
        );
        let map = walker(&history)
            .version_attributes_map(&attrs(&["homepage", "version"]), "main")
            .unwrap();

        let homepage = &map["homepage"];
        assert_eq!(
            homepage[&Channel::Stable][&Version::from("2.0")],
            vec![json!("https://example.com")]
        );
        assert_eq!(
            homepage[&Channel::Devel][&Version::from("2.1-beta")],
            vec![json!("https://example.com")]
        );
        // "version" is the top-level version, also under the devel key.
        assert_eq!(
            map["version"][&Channel::Devel][&Version::from("2.1-beta")],
            vec![json!("2.0")]
        );
    }

    #[test]
    fn test_attributes_newest_first_order() {
        let history = MemoryHistory::new()
            .with_revision(
                "b2",
                json!({ "name": "foo", "stable": { "version": "1.0" }, "revision": 1 }).to_string(),
            )
            .with_revision("a1", stable_def("1.0"));
        let map = walker(&history)
            .version_attributes_map(&attrs(&["revision"]), "main")
            .unwrap();

        assert_eq!(
            map["revision"][&Channel::Stable][&Version::from("1.0")],
            vec![json!(1), json!(0)]
        );
    }

    #[test]
    fn test_attributes_benign_failures_skip_revision() {
        let history = MemoryHistory::new()
            .with_revision("d4", stable_def("3.0"))
            .with_revision("c3", "{ this is not json")
            .with_revision("b2", r#"{ "name": "foo" }"#)
            .with_missing("a0")
            .with_revision("a1", stable_def("2.0"));
        let map = walker(&history)
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap();

        let stable = &map["version"][&Channel::Stable];
        assert_eq!(stable.len(), 2);
        assert_eq!(history.fetch_count(), 5);
    }

    #[test]
    fn test_attributes_unknown_attribute_skips_revision() {
        let history = MemoryHistory::new()
            .with_revision(
                "b2",
                json!({ "name": "foo", "stable": { "version": "2.0" }, "license": "MIT" })
                    .to_string(),
            )
            .with_revision("a1", stable_def("1.0"));
        let map = walker(&history)
            .version_attributes_map(&attrs(&["license"]), "main")
            .unwrap();

        let stable = &map["license"][&Channel::Stable];
        assert_eq!(stable.len(), 1);
        assert_eq!(stable[&Version::from("2.0")], vec![json!("MIT")]);
    }

    #[test]
    fn test_attributes_keys_created_lazily() {
        let history = MemoryHistory::new()
            .with_revision("b2", "garbage")
            .with_revision("a1", "more garbage");
        let map = walker(&history)
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap();
        assert!(map.is_empty());

        let devel_only = MemoryHistory::new().with_revision(
            "a1",
            json!({ "name": "foo", "devel": { "version": "0.1-alpha" } }).to_string(),
        );
        let map = walker(&devel_only)
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap();
        assert!(!map["version"].contains_key(&Channel::Stable));
        assert!(map["version"].contains_key(&Channel::Devel));
    }

    #[test]
    fn test_attributes_depth_ignores_devel_versions() {
        let history = MemoryHistory::new()
            .with_revision(
                "c3",
                json!({ "name": "foo", "stable": { "version": "1.0" }, "devel": { "version": "1.3" } })
                    .to_string(),
            )
            .with_revision(
                "b2",
                json!({ "name": "foo", "stable": { "version": "1.0" }, "devel": { "version": "1.2" } })
                    .to_string(),
            )
            .with_revision(
                "a1",
                json!({ "name": "foo", "stable": { "version": "1.0" }, "devel": { "version": "1.1" } })
                    .to_string(),
            );
        let map = walker(&history)
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap();

        assert_eq!(map["version"][&Channel::Devel].len(), 3);
        assert_eq!(history.fetch_count(), 3);
    }

    #[test]
    fn test_attributes_fatal_failure_propagates() {
        let history = MemoryHistory::new()
            .with_revision("b2", stable_def("2.0"))
            .with_revision("a1", stable_def("1.0"));
        let w = HistoryWalker::new(
            &history,
            SpyParser::new(Some(ParseFailureKind::Internal)),
            "foo",
            file(),
        );
        let err = w
            .version_attributes_map(&attrs(&["version"]), "main")
            .unwrap_err();
        assert!(matches!(err, HistoryError::Parse(_)));
    }
}
