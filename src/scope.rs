//! The scope-frame stack (C3) and pending-token buffer (C4), kept per-branch. Plain LIFO
//! semantics, as the specification requires -- no arena indirection is needed here the way
//! [`crate::branch`] needs one for its tree, since a scope stack's frames genuinely are owned
//! by exactly one branch at a time and clone cleanly when a branch forks.

use std::collections::VecDeque;

use crate::arising::{ArisingSpecification, FunctionSignature};
use crate::lexer::Token;

/// A lexical/semantic context entered while parsing. Tagged variants stand in for the dynamic
/// dispatch the teacher's original scope types would reach for; the parser matches exhaustively
/// on this instead.
#[derive(Debug, Clone)]
pub enum ScopeFrame {
	TranslationUnit,
	Arising(ArisingSpecification),
	Function,
	CompoundStatement,
	Initializer,
	FunctionSignature(FunctionSignature),
}

impl ScopeFrame {
	#[must_use]
	pub const fn is_function(&self) -> bool {
		matches!(self, Self::Function)
	}

	#[must_use]
	pub const fn is_arising(&self) -> bool {
		matches!(self, Self::Arising(_))
	}

	#[must_use]
	pub const fn as_arising(&self) -> Option<&ArisingSpecification> {
		match self {
			Self::Arising(arising) => Some(arising),
			_ => None,
		}
	}

	pub const fn as_arising_mut(&mut self) -> Option<&mut ArisingSpecification> {
		match self {
			Self::Arising(arising) => Some(arising),
			_ => None,
		}
	}

	pub const fn as_function_signature_mut(&mut self) -> Option<&mut FunctionSignature> {
		match self {
			Self::FunctionSignature(signature) => Some(signature),
			_ => None,
		}
	}
}

/// A LIFO stack of [`ScopeFrame`]s, always non-empty: a freshly created stack starts with a
/// single [`ScopeFrame::TranslationUnit`] frame that is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
	frames: Vec<ScopeFrame>,
}

impl Default for ScopeStack {
	fn default() -> Self {
		Self { frames: vec![ScopeFrame::TranslationUnit] }
	}
}

impl ScopeStack {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn enter_scope(&mut self, frame: ScopeFrame) {
		self.frames.push(frame);
	}

	/// Pops the current frame, returning it. Never pops the root `TranslationUnit` frame; calling
	/// this with only the root frame present is a structural bug in the driver and panics in
	/// debug builds via the `debug_assert!` this invariant relies on.
	pub fn leave_scope(&mut self) -> ScopeFrame {
		debug_assert!(self.frames.len() > 1, "attempted to leave the translation-unit scope");
		self.frames.pop().unwrap_or(ScopeFrame::TranslationUnit)
	}

	#[must_use]
	pub fn current_scope(&self) -> &ScopeFrame {
		self.frames.last().unwrap_or(&ScopeFrame::TranslationUnit)
	}

	pub fn current_scope_mut(&mut self) -> &mut ScopeFrame {
		self.frames.last_mut().expect("scope stack is never empty")
	}

	/// The frame `depth` levels up from the current one; `0` is the current frame, `1` is the
	/// frame directly enclosing it.
	#[must_use]
	pub fn surrounding_scope(&self, depth: usize) -> Option<&ScopeFrame> {
		let index = self.frames.len().checked_sub(1)?.checked_sub(depth)?;
		self.frames.get(index)
	}

	/// The nearest frame (searching from the top) matching `predicate`.
	pub fn find_scope(&self, predicate: impl Fn(&ScopeFrame) -> bool) -> Option<&ScopeFrame> {
		self.frames.iter().rev().find(|frame| predicate(frame))
	}

	/// Whether any frame in the stack is a [`ScopeFrame::Function`] -- the test §4.6 uses to
	/// decide that a declaration has no linkage.
	#[must_use]
	pub fn contains_function(&self) -> bool {
		self.frames.iter().any(ScopeFrame::is_function)
	}

	#[must_use]
	pub fn depth(&self) -> usize {
		self.frames.len()
	}
}

/// The per-branch FIFO of tokens whose semantic role isn't decided yet -- a run of type
/// specifiers before the declarator's identifier arrives, for instance.
#[derive(Debug, Clone, Default)]
pub struct PendingBuffer {
	tokens: VecDeque<Token>,
}

impl PendingBuffer {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, token: Token) {
		self.tokens.push_back(token);
	}

	pub fn clear(&mut self) {
		self.tokens.clear();
	}

	#[must_use]
	pub fn has_pending(&self) -> bool {
		!self.tokens.is_empty()
	}

	pub fn drain(&mut self) -> Vec<Token> {
		self.tokens.drain(..).collect()
	}

	/// A textual rendering of the buffered tokens, for diagnostics only -- never consumed by the
	/// parser itself.
	#[must_use]
	pub fn render(&self) -> String {
		self.tokens.iter().map(|token| token.value.as_str()).collect::<Vec<_>>().join(" ")
	}
}

impl PartialEq for PendingBuffer {
	fn eq(&self, other: &Self) -> bool {
		self.tokens.len() == other.tokens.len() && self.tokens.iter().zip(other.tokens.iter()).all(|(mine, theirs)| mine.token_type == theirs.token_type && mine.value == theirs.value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_stack_starts_at_translation_unit() {
		let stack = ScopeStack::new();
		assert_eq!(stack.depth(), 1);
		assert!(matches!(stack.current_scope(), ScopeFrame::TranslationUnit));
	}

	#[test]
	fn contains_function_finds_an_enclosing_function_frame() {
		let mut stack = ScopeStack::new();
		stack.enter_scope(ScopeFrame::Function);
		stack.enter_scope(ScopeFrame::CompoundStatement);
		assert!(stack.contains_function());
	}

	#[test]
	fn surrounding_scope_zero_is_current() {
		let mut stack = ScopeStack::new();
		stack.enter_scope(ScopeFrame::CompoundStatement);
		assert!(matches!(stack.surrounding_scope(0), Some(ScopeFrame::CompoundStatement)));
		assert!(matches!(stack.surrounding_scope(1), Some(ScopeFrame::TranslationUnit)));
	}

	#[test]
	fn pending_buffer_tracks_presence() {
		let mut buffer = PendingBuffer::new();
		assert!(!buffer.has_pending());
		buffer.push(Token { token_type: crate::lexer::TokenType::KeywordInt, value: "int".to_owned(), line: 1, column: 1, whitespace_after: false });
		assert!(buffer.has_pending());
		buffer.clear();
		assert!(!buffer.has_pending());
	}
}
