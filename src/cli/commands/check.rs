//! The `check` subcommand: the "does it still parse" counterpart to the engine's own use from
//! `ls`/`track`, parsing each file and surfacing whatever diagnostics it produced.

use std::path::PathBuf;

use anyhow::Context as _;
use colored::Colorize as _;

use crate::cli::commands::EngineCommand;
use crate::config::Configuration;
use crate::context::Context;
use crate::driver;

/// `check FILE...`: parses each file and reports diagnostics, exiting non-zero if any file
/// produced a fatal (lexical, structural, or I/O) error.
#[derive(clap::Parser)]
pub struct CheckCommand {
	/// The source files to parse.
	#[arg(required = true)]
	files: Vec<PathBuf>,
}

impl EngineCommand for CheckCommand {
	fn execute(self) -> anyhow::Result<()> {
		let configuration = Configuration::load(&std::env::current_dir()?)?;
		let mut any_fatal = false;

		for path in &self.files {
			let source = std::fs::read_to_string(path).with_context(|| format!("while reading {}", path.display()))?;
			let mut context = Context::new(path.display().to_string(), configuration.clone());
			let unit = driver::parse_translation_unit(&mut context, &source);

			if context.diagnostics().is_empty() {
				println!("{} {}", path.display(), "ok".green());
			} else {
				for diagnostic in context.diagnostics() {
					println!("{}: {diagnostic}", path.display().to_string().bold());
				}
			}
			if context.has_fatal_diagnostics() {
				any_fatal = true;
			}
			log::debug!("{} produced {} symbols", path.display(), unit.symbols.find(&crate::symbol::SymbolCriteria::default()).len());
		}

		if any_fatal {
			anyhow::bail!("one or more files produced a fatal error");
		}
		Ok(())
	}
}
