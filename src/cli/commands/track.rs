//! The `track` subcommand: runs the parser with the branch-track recorder (C9) enabled and
//! writes the newline-delimited event stream an external visualizer renders into a timeline.

use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::commands::EngineCommand;
use crate::config::Configuration;
use crate::context::Context;
use crate::driver;

/// `track FILE -o OUT`: parses FILE with recording enabled and writes its branch-track event
/// stream to `OUT`, or to standard output if omitted.
#[derive(clap::Parser)]
pub struct TrackCommand {
	/// The source file to parse.
	file: PathBuf,

	/// Where to write the event stream. Defaults to standard output.
	#[arg(short = 'o', long = "output")]
	output: Option<PathBuf>,
}

impl EngineCommand for TrackCommand {
	fn execute(self) -> anyhow::Result<()> {
		let configuration = Configuration::load(&std::env::current_dir()?)?;
		let source = std::fs::read_to_string(&self.file).with_context(|| format!("while reading {}", self.file.display()))?;

		let mut context = Context::new(self.file.display().to_string(), configuration);
		context.enable_recording();
		let _unit = driver::parse_translation_unit(&mut context, &source);

		match self.output {
			Some(path) => {
				let file = std::fs::File::create(&path).with_context(|| format!("while creating {}", path.display()))?;
				context.recorder().write_to(file)?;
			}
			None => context.recorder().write_to(std::io::stdout())?,
		}

		for diagnostic in context.diagnostics() {
			log::warn!("{diagnostic}");
		}

		Ok(())
	}
}
