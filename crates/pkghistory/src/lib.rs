#![doc = include_str!("../README.md")]

pub mod error;
pub mod parser;
pub mod source;
pub mod types;
pub mod walker;

pub use error::{HistoryError, ParseFailure, ParseFailureKind, Result};
pub use parser::{DefinitionParser, JsonDefinitionParser, ParseOptions};
pub use source::{MemoryHistory, RevisionSource, Revisions};
pub use types::{
    AttributesMap, BottleSpec, BottleVersionMap, Channel, ChannelMap, FileIdentity,
    PackageDefinition, PkgVersion, ReleaseSpec, RevisionId, Version, VersionMap,
};
pub use walker::{HistoryWalker, MAX_VERSIONS_DEPTH, WalkConfig};
