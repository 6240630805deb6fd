//! Project configuration, loaded from an optional `ccbranch.toml` in the working directory and
//! an optional, untracked `ccbranch.local.toml` override -- the same project/local split the
//! teacher scaffolds for its own `cabin.toml`/`cabin.local.toml` pair. Neither file is required;
//! absence of both simply means every field takes its default.

use std::path::Path;

/// The name of every `ls` the user runs unless overridden on the command line.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
	/// Condition strings applied as if `--assume` had been passed, in order.
	pub assume: Vec<String>,
	/// Macro names applied as if `--assume-def NAME` had been passed, in order.
	pub assume_defined: Vec<String>,
	/// Default `--format` string for `ls`, if the command line doesn't supply one.
	pub default_format: Option<String>,
	/// Suppresses informational output (diagnostics still print).
	pub quiet: bool,
}

impl Configuration {
	/// Loads configuration by reading `ccbranch.toml` then layering `ccbranch.local.toml` on top
	/// of it, both relative to `directory`. Missing files are not an error; a present file that
	/// fails to parse as TOML is.
	///
	/// # Errors
	/// Returns an error if a present config file cannot be read or is not valid TOML with the
	/// expected shape.
	pub fn load(directory: &Path) -> anyhow::Result<Self> {
		let mut configuration = Self::default();
		configuration.layer_file(&directory.join("ccbranch.toml"))?;
		configuration.layer_file(&directory.join("ccbranch.local.toml"))?;
		Ok(configuration)
	}

	fn layer_file(&mut self, path: &Path) -> anyhow::Result<()> {
		use anyhow::Context as _;

		if !path.exists() {
			return Ok(());
		}
		let text = std::fs::read_to_string(path).with_context(|| format!("while reading configuration file {}", path.display()))?;
		let document = text.parse::<toml_edit::DocumentMut>().with_context(|| format!("while parsing configuration file {}", path.display()))?;

		if let Some(assume) = document.get("assume").and_then(toml_edit::Item::as_array) {
			self.assume = assume.iter().filter_map(toml_edit::Value::as_str).map(ToOwned::to_owned).collect();
		}
		if let Some(assume_defined) = document.get("assume_defined").and_then(toml_edit::Item::as_array) {
			self.assume_defined = assume_defined.iter().filter_map(toml_edit::Value::as_str).map(ToOwned::to_owned).collect();
		}
		if let Some(format) = document.get("default_format").and_then(toml_edit::Item::as_str) {
			self.default_format = Some(format.to_owned());
		}
		if let Some(quiet) = document.get("quiet").and_then(toml_edit::Item::as_bool) {
			self.quiet = quiet;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_files_yield_defaults() {
		let directory = std::env::temp_dir().join("ccbranch-config-test-missing");
		let _ = std::fs::create_dir_all(&directory);
		let configuration = Configuration::load(&directory).expect("missing files are not an error");
		assert!(configuration.assume.is_empty());
		assert!(!configuration.quiet);
	}

	#[test]
	fn local_file_overrides_project_file() {
		let directory = std::env::temp_dir().join("ccbranch-config-test-override");
		std::fs::create_dir_all(&directory).expect("create temp dir");
		std::fs::write(directory.join("ccbranch.toml"), "quiet = false\ndefault_format = \"short\"\n").expect("write project config");
		std::fs::write(directory.join("ccbranch.local.toml"), "quiet = true\n").expect("write local config");

		let configuration = Configuration::load(&directory).expect("valid configuration");
		assert!(configuration.quiet);
		assert_eq!(configuration.default_format.as_deref(), Some("short"));
	}
}
