use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{HistoryError, Result};

// ============================================================================
// Identities
// ============================================================================

/// One historical state of a file, usually an abbreviated commit hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The file whose history is walked: a repository root plus a path
/// relative to that root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    root: PathBuf,
    entry: PathBuf,
}

impl FileIdentity {
    pub fn new(root: impl Into<PathBuf>, entry: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entry: entry.into(),
        }
    }

    /// Build an identity from an absolute (or root-prefixed) path.
    ///
    /// Fails with [`HistoryError::PathOutsideRoot`] when `path` does not live
    /// under `root`.
    pub fn from_absolute(root: impl Into<PathBuf>, path: &Path) -> Result<Self> {
        let root = root.into();
        let entry = path
            .strip_prefix(&root)
            .map_err(|_| HistoryError::PathOutsideRoot {
                root: root.clone(),
                path: path.to_path_buf(),
            })?
            .to_path_buf();
        Ok(Self { root, entry })
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the repository root.
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Absolute location of the file in the working tree.
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.entry)
    }

    /// The entry with forward slashes, as git expects in `<rev>:<path>`.
    pub fn entry_name(&self) -> String {
        self.entry
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ============================================================================
// Versions
// ============================================================================

/// A declared version string. Used as the grouping key of history maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A version together with the package revision, e.g. `1.2.0_1`.
///
/// Two definitions with the same upstream version but different package
/// revisions produce distinct binary artifacts, so they get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PkgVersion {
    pub version: Version,
    pub revision: u32,
}

impl PkgVersion {
    pub fn new(version: impl Into<Version>, revision: u32) -> Self {
        Self {
            version: version.into(),
            revision,
        }
    }
}

impl std::fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.revision == 0 {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}_{}", self.version, self.revision)
        }
    }
}

impl Serialize for PkgVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Release channel of a package definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stable,
    /// The development channel.
    Devel,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Stable, Channel::Devel];
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Stable => write!(f, "stable"),
            Channel::Devel => write!(f, "devel"),
        }
    }
}

// ============================================================================
// Package definition
// ============================================================================

/// Prebuilt binary artifacts ("bottles") declared by a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BottleSpec {
    #[serde(default)]
    pub rebuild: u32,
    /// Platform tag to sha256.
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

/// A release channel sub-definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSpec {
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ReleaseSpec {
    pub fn new(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            url: None,
            sha256: None,
        }
    }
}

/// One revision's package definition, as produced by a
/// [`DefinitionParser`](crate::DefinitionParser).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default)]
    pub revision: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<ReleaseSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devel: Option<ReleaseSpec>,
    #[serde(default)]
    pub bottle: BottleSpec,
    /// Every other declared field.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PackageDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            revision: 0,
            stable: None,
            devel: None,
            bottle: BottleSpec::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<Version>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_stable(mut self, version: impl Into<Version>) -> Self {
        self.stable = Some(ReleaseSpec::new(version));
        self
    }

    pub fn with_devel(mut self, version: impl Into<Version>) -> Self {
        self.devel = Some(ReleaseSpec::new(version));
        self
    }

    pub fn with_bottle(mut self, rebuild: u32, checksums: &[(&str, &str)]) -> Self {
        self.bottle = BottleSpec {
            rebuild,
            checksums: checksums
                .iter()
                .map(|(tag, sum)| (tag.to_string(), sum.to_string()))
                .collect(),
        };
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// The active version: stable's, else the explicit one, else devel's.
    ///
    /// A stable channel always wins, so this is the key the definition's
    /// values land under in the stable history. Parsers reject definitions
    /// without any version, so the empty fallback only shows up for
    /// hand-built definitions.
    pub fn version(&self) -> Version {
        self.stable
            .as_ref()
            .map(|s| s.version.clone())
            .or_else(|| self.version.clone())
            .or_else(|| self.devel.as_ref().map(|d| d.version.clone()))
            .unwrap_or_else(|| Version::new(""))
    }

    pub fn pkg_version(&self) -> PkgVersion {
        PkgVersion::new(self.version(), self.revision)
    }

    pub fn channel(&self, channel: Channel) -> Option<&ReleaseSpec> {
        match channel {
            Channel::Stable => self.stable.as_ref(),
            Channel::Devel => self.devel.as_ref(),
        }
    }

    /// Look up a top-level attribute by name.
    pub fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        use serde_json::Value;
        match name {
            "name" => Some(Value::from(self.name.clone())),
            "version" => Some(Value::from(self.version().to_string())),
            "pkg_version" => Some(Value::from(self.pkg_version().to_string())),
            "revision" => Some(Value::from(self.revision)),
            "rebuild" => Some(Value::from(self.bottle.rebuild)),
            _ => self.extra.get(name).cloned(),
        }
    }
}

// ============================================================================
// Aggregated history
// ============================================================================

/// Bottle rebuild numbers per package version, newest revision first.
pub type BottleVersionMap = BTreeMap<PkgVersion, Vec<u32>>;

/// Attribute values per channel version, newest revision first.
pub type VersionMap = BTreeMap<Version, Vec<serde_json::Value>>;

pub type ChannelMap = BTreeMap<Channel, VersionMap>;

/// Attribute name to its per-channel history.
pub type AttributesMap = BTreeMap<String, ChannelMap>;
