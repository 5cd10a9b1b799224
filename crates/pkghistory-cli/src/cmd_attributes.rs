use anyhow::Result;

use crate::target::{Target, WalkOptions, open_walker, print_json};

pub fn run(target: Target, attributes: Vec<String>, options: &WalkOptions) -> Result<()> {
    let walker = open_walker(&target, options)?;
    let map = walker.version_attributes_map(&attributes, &target.branch)?;
    print_json(&map, options.pretty)
}
