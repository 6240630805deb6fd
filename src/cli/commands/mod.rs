use check::CheckCommand;
use help::HelpCommand;
use ls::LsCommand;
use track::TrackCommand;
use up_to_date::UpToDateCommand;

pub mod check;
pub mod help;
pub mod ls;
pub mod track;
pub mod up_to_date;

#[enum_dispatch::enum_dispatch]
pub trait EngineCommand {
	/// Executes this subcommand.
	fn execute(self) -> anyhow::Result<()>;
}

#[derive(clap::Subcommand)]
#[enum_dispatch::enum_dispatch(EngineCommand)]
pub enum SubCommand {
	/// Lists symbols, literals, or comments found while parsing one or more files.
	Ls(LsCommand),
	/// Lists registered subcommands, or prints one command's help.
	Help(HelpCommand),
	/// Parses each file and reports diagnostics, exiting non-zero on any fatal error.
	Check(CheckCommand),
	/// Parses a file with the branch-track recorder enabled and writes its event stream.
	Track(TrackCommand),
	/// Reports whether each file is unchanged since the last recorded run.
	#[command(name = "up-to-date")]
	UpToDate(UpToDateCommand),
}
