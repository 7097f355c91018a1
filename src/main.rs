// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use regex::Regex;

use dupesweep::action::{apply_action_to_groups, Action};
use dupesweep::{dedupe_with_config, summary, Config};

/// Finds duplicate files and optionally replaces them with links.
///
/// Recursively analyzes one or more paths and finds files that appear in
/// multiple places, possibly with different names, but have exactly the
/// same content.
#[derive(Parser)]
#[command(name = "dupesweep")]
struct Cli {
    /// Search root (repeatable); defaults to the current directory.
    #[arg(short = 'i', long = "input")]
    search_roots: Vec<PathBuf>,

    /// Exclusion regex matched against each path's native string form
    /// (repeatable).
    #[arg(short = 'e', long = "exclude")]
    exclude: Vec<String>,

    /// Worker count, 1..=256.
    #[arg(short = 'j', long = "jobs", default_value_t = 4)]
    max_thread: u32,

    /// Print groups to stdout, separated by lines of `----`.
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Also consider empty files.
    #[arg(long)]
    empty: bool,

    /// Print a summary of what was found instead of listing paths.
    #[arg(short = 'm', long = "summarize")]
    summarize: bool,

    /// Delete every non-canonical path in every group.
    #[arg(long)]
    delete: bool,

    /// Replace every non-canonical path with a link to the canonical one
    /// instead of deleting it outright.
    #[arg(long, value_enum)]
    link: Option<LinkKind>,

    /// Enable `[log]` progress output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LinkKind {
    SymRel,
    SymAbs,
    Hard,
}

impl From<LinkKind> for Action {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::SymRel => Action::SymlinkRelative,
            LinkKind::SymAbs => Action::SymlinkAbsolute,
            LinkKind::Hard => Action::HardLink,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut args = Cli::parse();

    dupesweep::init_logging(args.verbose);

    if args.search_roots.is_empty() {
        args.search_roots.push(".".into());
    }

    let exclude_patterns = args
        .exclude
        .iter()
        .map(|pattern| Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if args.delete && args.link.is_some() {
        bail!("--delete and --link are mutually exclusive");
    }

    let config = Config::builder()
        .search_roots(args.search_roots)
        .exclude_patterns(exclude_patterns)
        .max_thread(args.max_thread)
        .include_empty(args.empty)
        .build()?;

    let groups = dedupe_with_config(config)?;

    if args.summarize {
        println!("{}", summary::summarize(&groups));
    } else if args.print {
        for group in &groups {
            println!("----");
            for path in &group.0 {
                println!("{}", path.display());
            }
        }
        println!("----");
    }

    if args.delete {
        apply_action_to_groups(&groups, Action::Remove);
    } else if let Some(kind) = args.link {
        apply_action_to_groups(&groups, kind.into());
    }

    Ok(())
}
