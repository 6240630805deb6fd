//! The `help` subcommand. §9's "Global state" design note replaces the source's process-wide
//! command registry with an explicit [`CommandRegistry`] value, built fresh each time `help` runs
//! rather than stashed behind a `static`.

use colored::Colorize as _;

use crate::cli::commands::EngineCommand;

/// One entry in the command registry: a subcommand's name, its one-line summary (shown by
/// `help` with no arguments), and its longer description (shown by `help NAME`).
struct CommandEntry {
	name: &'static str,
	summary: &'static str,
	long_help: String,
}

/// The set of registered subcommands, constructed fresh at dispatch time rather than read from a
/// process-wide static.
pub struct CommandRegistry {
	entries: Vec<CommandEntry>,
}

impl CommandRegistry {
	/// Builds the registry. Kept in sync with [`crate::cli::commands::SubCommand`] by hand, the
	/// same way the teacher's own command list is a fixed enum rather than a discovered set.
	#[must_use]
	pub fn build() -> Self {
		Self {
			entries: vec![
				CommandEntry {
					name: "ls",
					summary: "List symbols, literals, or comments found while parsing one or more files",
					long_help: unindent::unindent(
						"
						ls [options] FILE...

						Parses each FILE and lists the symbols (or, with --literal/--comment, the
						literals or comments) it can contain under some preprocessor configuration.
						Every listed item is annotated with the condition under which it exists
						unless --long is omitted.
						",
					),
				},
				CommandEntry {
					name: "help",
					summary: "List registered commands, or print one command's help",
					long_help: "help [COMMAND]\n\nWith no argument, lists every registered command. With COMMAND, prints that command's longer description.".to_owned(),
				},
				CommandEntry {
					name: "check",
					summary: "Parse each file and report diagnostics",
					long_help: "check FILE...\n\nParses each FILE and prints any diagnostics raised. Exits non-zero if any file produced a fatal (lexical, structural, or I/O) error.".to_owned(),
				},
				CommandEntry {
					name: "track",
					summary: "Parse a file with the branch-track recorder enabled",
					long_help: "track FILE [-o OUT]\n\nParses FILE with event recording enabled and writes the newline-delimited branch-track event stream to OUT, or to standard output if -o is omitted.".to_owned(),
				},
				CommandEntry {
					name: "up-to-date",
					summary: "Check whether each file is unchanged since the last recorded run",
					long_help: "up-to-date FILE...\n\nCompares each FILE's modification time and size against a cache recorded by a previous check/ls/track run, without invoking the parser. Exits non-zero if any file is stale.".to_owned(),
				},
			],
		}
	}

	fn find(&self, name: &str) -> Option<&CommandEntry> {
		self.entries.iter().find(|entry| entry.name == name)
	}
}

/// `help [COMMAND]`: lists every registered command, or prints one command's longer description.
#[derive(clap::Parser)]
pub struct HelpCommand {
	/// The command to show detailed help for. Omit to list every command.
	command: Option<String>,
}

impl EngineCommand for HelpCommand {
	fn execute(self) -> anyhow::Result<()> {
		let registry = CommandRegistry::build();

		let Some(name) = self.command else {
			for entry in &registry.entries {
				println!("{}\t- {}", entry.name.bold().green(), entry.summary);
			}
			return Ok(());
		};

		match registry.find(&name) {
			Some(entry) => println!("{}", entry.long_help),
			None => println!("Unknown command: `{name}'"),
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registry_has_one_entry_per_subcommand() {
		let registry = CommandRegistry::build();
		assert_eq!(registry.entries.len(), 5);
	}

	#[test]
	fn find_is_case_sensitive_and_exact() {
		let registry = CommandRegistry::build();
		assert!(registry.find("ls").is_some());
		assert!(registry.find("bogus").is_none());
	}
}
