//! # ccbranch
//!
//! A static analyzer for C that parses every preprocessor conditional configuration
//! simultaneously, rather than requiring a fixed set of macro definitions.
//!
//! ## Installation
//!
//! `ccbranch` can be installed cross-platform with Cargo:
//!
//! ```bash
//! cargo install ccbranch
//! ```

/// Bring the `Parser` trait into scope from `clap`, which allows parsing argument structs from
/// the command line. Assigned to underscore to indicate clearly that it's not used outside of
/// bringing its trait methods into scope.
use ccbranch::cli::commands::{EngineCommand as _, SubCommand};
use clap::Parser as _;

/// The command-line arguments for `ccbranch`.
#[derive(clap::Parser)]
#[command(name = "ccbranch", about = "A static analyzer for C that parses every preprocessor conditional configuration simultaneously.")]
pub struct EngineArguments {
	/// Raises the log filter to `debug` regardless of `RUST_LOG`; pass twice for `trace`.
	#[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// The subcommand to run, such as `ls` or `check`.
	#[command(subcommand)]
	pub command: SubCommand,
}

/// The main entry point. Installs the log sink, parses the arguments passed at the command
/// line, and runs the given subcommand (`ls`, `help`, `check`, `track`, `up-to-date`).
fn main() -> anyhow::Result<()> {
	let arguments = EngineArguments::parse();

	let default_filter = match arguments.verbose {
		0 => "warn",
		1 => "debug",
		_ => "trace",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

	arguments.command.execute()
}
