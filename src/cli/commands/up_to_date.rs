//! The `up-to-date` subcommand: pure file I/O, no parsing. Compares each file's modification
//! time and size against `.ccbranch-cache/`, prints a verdict per file, and records the current
//! state for the next run.

use std::path::PathBuf;

use colored::Colorize as _;

use crate::cache::Cache;
use crate::cli::commands::EngineCommand;

/// `up-to-date FILE...`: reports whether each file is unchanged since the last recorded run,
/// without invoking the parser.
#[derive(clap::Parser)]
pub struct UpToDateCommand {
	/// The files to check.
	#[arg(required = true)]
	files: Vec<PathBuf>,
}

impl EngineCommand for UpToDateCommand {
	fn execute(self) -> anyhow::Result<()> {
		let directory = std::env::current_dir()?;
		let mut cache = Cache::load(&directory)?;
		let mut all_up_to_date = true;

		for path in &self.files {
			if cache.is_up_to_date(path) {
				println!("{}: {}", path.display(), "up to date".green());
			} else {
				println!("{}: {}", path.display(), "stale".yellow());
				all_up_to_date = false;
			}
			cache.record(path);
		}

		cache.save(&directory)?;

		if !all_up_to_date {
			anyhow::bail!("one or more files are stale");
		}
		Ok(())
	}
}
