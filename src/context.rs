//! Ambient state threaded through one translation unit's parse: which file is being read, the
//! configuration governing default `ls` behavior, the atom table backing the condition algebra,
//! the branch-track recorder, and the diagnostics collected so far. Mirrors the teacher's
//! `Context::new(filename)` constructor shape, generalized with the fields this engine needs.

use crate::config::Configuration;
use crate::condition::AtomTable;
use crate::diagnostics::EngineError;
use crate::recorder::Recorder;

/// Per-translation-unit state that doesn't belong to any one branch. A `Context` is created once
/// per file and passed by mutable reference into the driver.
pub struct Context {
	filename: String,
	config: Configuration,
	atoms: AtomTable,
	recorder: Recorder,
	diagnostics: Vec<EngineError>,
}

impl Context {
	/// Creates a context for parsing `filename`, with recording disabled by default (enable it
	/// with [`Context::enable_recording`] for `track`).
	#[must_use]
	pub fn new(filename: impl Into<String>, config: Configuration) -> Self {
		Self {
			filename: filename.into(),
			config,
			atoms: AtomTable::new(),
			recorder: Recorder::disabled(),
			diagnostics: Vec::new(),
		}
	}

	#[must_use]
	pub fn filename(&self) -> &str {
		&self.filename
	}

	#[must_use]
	pub const fn config(&self) -> &Configuration {
		&self.config
	}

	pub const fn atoms_mut(&mut self) -> &mut AtomTable {
		&mut self.atoms
	}

	#[must_use]
	pub const fn atoms(&self) -> &AtomTable {
		&self.atoms
	}

	/// Swaps in an enabled recorder, for `track`.
	pub fn enable_recording(&mut self) {
		self.recorder = Recorder::enabled();
	}

	pub const fn recorder_mut(&mut self) -> &mut Recorder {
		&mut self.recorder
	}

	#[must_use]
	pub const fn recorder(&self) -> &Recorder {
		&self.recorder
	}

	/// Records a branch-local diagnostic and logs it at `warn!`, per the propagation policy: the
	/// branch that raised it fails, but parsing of the rest of the translation unit continues.
	pub fn report(&mut self, error: EngineError) {
		log::warn!("{error}");
		self.diagnostics.push(error);
	}

	#[must_use]
	pub fn diagnostics(&self) -> &[EngineError] {
		&self.diagnostics
	}

	#[must_use]
	pub fn has_fatal_diagnostics(&self) -> bool {
		self.diagnostics.iter().any(|error| matches!(error, EngineError::Lexical { .. } | EngineError::Structural { .. } | EngineError::Io { .. }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::diagnostics::SourceLocation;

	#[test]
	fn new_context_has_no_diagnostics() {
		let context = Context::new("a.c", Configuration::default());
		assert!(context.diagnostics().is_empty());
		assert!(!context.has_fatal_diagnostics());
	}

	#[test]
	fn reporting_a_lexical_error_marks_the_context_fatal() {
		let mut context = Context::new("a.c", Configuration::default());
		context.report(EngineError::Lexical {
			location: SourceLocation { file: "a.c".to_owned(), line: 1, column: 1 },
			message: "bad token".to_owned(),
		});
		assert!(context.has_fatal_diagnostics());
	}
}
