use anyhow::Result;
use pkghistory::RevisionId;
use serde::Serialize;

use crate::target::{Target, WalkOptions, open_walker, print_json};

#[derive(Serialize, Debug)]
struct RevisionRow {
    revision: RevisionId,
    /// `None` when the revision has no usable definition.
    version: Option<String>,
}

pub fn run(target: Target, options: &WalkOptions) -> Result<()> {
    let walker = open_walker(&target, options)?;

    let mut rows = Vec::new();
    for revision in walker.revisions(&target.branch)? {
        let revision = revision?;
        let version = walker.definition_at(&revision, |def| Ok(def.pkg_version().to_string()))?;
        rows.push(RevisionRow { revision, version });
    }

    print_json(&rows, options.pretty)
}
