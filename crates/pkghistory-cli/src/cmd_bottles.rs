use anyhow::Result;

use crate::target::{Target, WalkOptions, open_walker, print_json};

pub fn run(target: Target, options: &WalkOptions) -> Result<()> {
    let walker = open_walker(&target, options)?;
    let map = walker.bottle_version_map(&target.branch)?;
    print_json(&map, options.pretty)
}
