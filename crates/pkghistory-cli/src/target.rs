use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pkghistory::{
    FileIdentity, HistoryWalker, JsonDefinitionParser, RevisionSource, WalkConfig,
};
use pkghistory_git::{GitCommand, LibGit2};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Which implementation reads git history.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Run the `git` executable
    Git,
    /// Use libgit2
    Libgit2,
}

/// The package definition file to inspect.
#[derive(Args, Debug)]
pub struct Target {
    /// Path to the package definition file
    pub file: PathBuf,

    /// Package name (defaults to the file stem)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Branch or revision to walk back from
    #[arg(short, long, default_value = "HEAD")]
    pub branch: String,
}

impl Target {
    pub fn package_name(&self) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        self.file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .with_context(|| format!("Cannot derive a package name from {:?}", self.file))
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub backend: Backend,
    pub depth: usize,
    pub strict_deprecations: bool,
    pub pretty: bool,
}

pub type Walker = HistoryWalker<Box<dyn RevisionSource>, JsonDefinitionParser>;

/// Locate the target's repository and build a walker over it.
pub fn open_walker(target: &Target, options: &WalkOptions) -> Result<Walker> {
    let name = target.package_name()?;
    let file = pkghistory_git::locate(&target.file)
        .with_context(|| format!("Failed to find a repository around {:?}", target.file))?;
    debug!(
        package = %name,
        root = %file.root().display(),
        entry = %file.entry_name(),
        backend = ?options.backend,
        "opening history"
    );
    let source = open_source(options.backend, &file)?;

    let config = WalkConfig {
        max_versions_depth: options.depth,
        strict_deprecations: options.strict_deprecations,
        ..WalkConfig::default()
    };
    Ok(HistoryWalker::new(source, JsonDefinitionParser, name, file).with_config(config))
}

fn open_source(backend: Backend, file: &FileIdentity) -> Result<Box<dyn RevisionSource>> {
    Ok(match backend {
        Backend::Git => Box::new(GitCommand::new()),
        Backend::Libgit2 => Box::new(
            LibGit2::open(file.root())
                .with_context(|| format!("Failed to open repository at {:?}", file.root()))?,
        ),
    })
}

pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
