//! The command dispatcher: subcommand parsing and the `ls`/`help`-style text formatters.

/// The commands module, which handles all of the different subcommands: `ls`, `help`, `check`,
/// `track`, and `up-to-date`.
pub mod commands;
