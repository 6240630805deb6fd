//! The error-kind taxonomy. Every failure the engine can produce fits one of the five kinds laid
//! out here; `main.rs` and the `cli` subcommands wrap these in `anyhow` once they cross into
//! user-facing territory, but the engine itself never returns a bare `anyhow::Error` so that
//! callers can match on what actually went wrong.

/// Where in a source file a diagnostic applies. Lines and columns are 1-based, matching
/// [`crate::lexer::Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
	pub file: String,
	pub line: usize,
	pub column: usize,
}

impl std::fmt::Display for SourceLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.file, self.line, self.column)
	}
}

/// The five error kinds a translation unit's parse can raise.
///
/// `Lexical` and `ConditionAlgebra` are branch-local: the branch that raised them fails and is
/// removed from consideration, but its siblings and the rest of the translation unit proceed.
/// `Structural` is the "fatal programming-error class" -- it indicates the driver reached a scope
/// state it should be impossible to reach, and additionally fires a `debug_assert!` at its call
/// site so a development build panics immediately rather than limping on with corrupted state.
/// `Io` is fatal for the file it names but not for the rest of a multi-file invocation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("{location}:error:{message}")]
	Lexical { location: SourceLocation, message: String },

	#[error("{location}:error:conflicting symbols at {identifier}")]
	ConditionAlgebra { location: SourceLocation, identifier: String, message: String },

	#[error("internal error: {message}")]
	Structural { message: String },

	#[error("{path}: {source}")]
	Io { path: String, #[source] source: std::io::Error },
}

impl EngineError {
	/// Constructs a [`EngineError::Structural`] and asserts in debug builds that this path is
	/// never taken outside a genuine engine bug.
	#[must_use]
	pub fn structural(message: impl Into<String>) -> Self {
		let message = message.into();
		debug_assert!(false, "structural invariant violated: {message}");
		Self::Structural { message }
	}
}

/// A convenience alias for engine-internal results; CLI code converts this to `anyhow::Result`
/// at the boundary via `anyhow::Context`.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_location_formats_as_file_colon_line_colon_column() {
		let location = SourceLocation { file: "a.c".to_owned(), line: 3, column: 5 };
		assert_eq!(location.to_string(), "a.c:3:5");
	}

	#[test]
	fn lexical_error_renders_with_location_prefix() {
		let error = EngineError::Lexical {
			location: SourceLocation { file: "a.c".to_owned(), line: 1, column: 1 },
			message: "Unrecognized token: @".to_owned(),
		};
		assert_eq!(error.to_string(), "a.c:1:1:error:Unrecognized token: @");
	}
}
