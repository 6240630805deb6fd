//! The arising specification (§4.6) and function signature (§4.7) builders: mutable,
//! progressively-filled state for a declaration or definition that hasn't finished parsing yet.
//! These live on top of the scope stack as [`crate::scope::ScopeFrame::Arising`] /
//! [`crate::scope::ScopeFrame::FunctionSignature`] frames and are finalized into a [`crate::symbol::Symbol`]
//! once the declarator is complete.

use crate::lexer::Token;
use crate::symbol::{Linkage, StorageClass, SymbolFamily};

/// A declaration or definition under construction. Accumulates storage class, qualifiers, type
/// specifiers, and the declarator chain before an identifier is even known, since C's grammar
/// allows arbitrarily many specifiers (`const unsigned long int`) before the declarator.
#[derive(Debug, Clone, Default)]
pub struct ArisingSpecification {
	pub storage_class: Option<StorageClass>,
	pub qualifiers: Vec<String>,
	pub type_specifiers: Vec<String>,
	pub pointer_depth: u32,
	pub array_suffixes: Vec<Option<String>>,
	pub is_function: bool,
	pub identifier: Option<String>,
	/// The tag name following a bare `struct`/`union`/`enum` keyword, e.g. `Point` in
	/// `struct Point { ... } origin;`. Kept separate from `identifier` because a single
	/// specification can carry both: the tag itself and a trailing variable declarator.
	pub tag_name: Option<String>,
	/// Set once this declarator's parameter list has closed. A separate
	/// [`crate::scope::ScopeFrame::FunctionSignature`] frame accumulates it while `(...)` is
	/// being scanned; its contents are merged back here when that frame pops, since the
	/// specification's "frames own only metadata" rule means the completed signature belongs to
	/// the declaration it's part of, not to the transient frame that built it.
	pub function_signature: Option<FunctionSignature>,
}

impl ArisingSpecification {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a declaration-specifier keyword or identifier (`const`, `unsigned`, a typedef name),
	/// recognizing the small set that determines storage class vs. qualifier vs. type specifier.
	pub fn push_specifier(&mut self, keyword_or_typedef_name: &str) {
		match keyword_or_typedef_name {
			"static" => self.storage_class = Some(StorageClass::Static),
			"extern" => self.storage_class = Some(StorageClass::Extern),
			"typedef" => self.storage_class = Some(StorageClass::Typedef),
			"register" => self.storage_class = Some(StorageClass::Register),
			"auto" => self.storage_class = Some(StorageClass::Auto),
			"const" | "volatile" | "restrict" | "inline" => self.qualifiers.push(keyword_or_typedef_name.to_owned()),
			other => self.type_specifiers.push(other.to_owned()),
		}
	}

	/// Records one more `*` in the declarator's pointer chain.
	pub const fn push_pointer(&mut self) {
		self.pointer_depth += 1;
	}

	/// Records an array suffix; `extent` is the bracketed expression text, or `None` for `[]`.
	pub fn push_array_suffix(&mut self, extent: Option<String>) {
		self.array_suffixes.push(extent);
	}

	/// Renders a best-effort textual type signature, used for the symbol index's structural
	/// equality check and for `ls --long` output. This is not a real type representation -- the
	/// specification explicitly excludes type checking beyond signature shape.
	#[must_use]
	pub fn signature(&self) -> String {
		let mut parts = self.qualifiers.clone();
		parts.extend(self.type_specifiers.iter().cloned());
		let mut rendered = parts.join(" ");
		for _ in 0..self.pointer_depth {
			rendered.push('*');
		}
		for suffix in &self.array_suffixes {
			rendered.push('[');
			if let Some(extent) = suffix {
				rendered.push_str(extent);
			}
			rendered.push(']');
		}
		rendered
	}

	/// Determines the [`Linkage`] this specification would have, per §4.6: declarations nested
	/// inside a function body have no linkage at all regardless of storage class; otherwise the
	/// storage class decides, falling back to the family's default.
	#[must_use]
	pub fn linkage(&self, enclosing_scope_contains_function: bool, family: SymbolFamily) -> Linkage {
		if enclosing_scope_contains_function {
			return Linkage::None;
		}
		match self.storage_class {
			Some(StorageClass::Static) => Linkage::Internal,
			Some(StorageClass::Extern) => Linkage::External,
			Some(StorageClass::Typedef) => Linkage::TypedefNameOnly,
			_ => family.default_linkage(),
		}
	}
}

/// The mutable state of a function's parameter list while it's between its opening and closing
/// parenthesis. §4.7: the signature is `complete?` iff both parenthesis tokens have been seen.
#[derive(Debug, Clone, Default)]
pub struct FunctionSignature {
	pub parameters: Vec<Parameter>,
	opening_parenthesis: Option<Token>,
	closing_parenthesis: Option<Token>,
}

/// One parameter in a function signature. `register` is the only storage class C permits here;
/// anything else is a diagnostic at the call site, not something this type itself enforces.
#[derive(Debug, Clone)]
pub struct Parameter {
	pub type_signature: String,
	pub name: Option<String>,
	pub storage_class: Option<StorageClass>,
}

impl FunctionSignature {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn open(&mut self, token: Token) {
		self.opening_parenthesis = Some(token);
	}

	pub fn close(&mut self, token: Token) {
		self.closing_parenthesis = Some(token);
	}

	#[must_use]
	pub const fn is_complete(&self) -> bool {
		self.opening_parenthesis.is_some() && self.closing_parenthesis.is_some()
	}

	/// Appends one parameter, per §4.7's `add_param(type, name, storage_class?)`.
	pub fn add_parameter(&mut self, type_signature: impl Into<String>, name: Option<String>, storage_class: Option<StorageClass>) {
		self.parameters.push(Parameter { type_signature: type_signature.into(), name, storage_class });
	}

	/// Compares this signature's parameter types against `existing`, for the "subsequent
	/// redeclarations must type-match" rule. Names and storage classes are allowed to differ
	/// between a declaration and its definition; only the type sequence must agree.
	#[must_use]
	pub fn type_matches(&self, existing: &Self) -> bool {
		self.parameters.len() == existing.parameters.len()
			&& self.parameters.iter().zip(existing.parameters.iter()).all(|(mine, theirs)| mine.type_signature == theirs.type_signature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_specifier_recognizes_storage_classes() {
		let mut arising = ArisingSpecification::new();
		arising.push_specifier("static");
		arising.push_specifier("int");
		assert_eq!(arising.storage_class, Some(StorageClass::Static));
		assert_eq!(arising.signature(), "int");
	}

	#[test]
	fn function_body_scope_forces_no_linkage() {
		let mut arising = ArisingSpecification::new();
		arising.push_specifier("static");
		arising.push_specifier("int");
		assert_eq!(arising.linkage(true, SymbolFamily::Variable), Linkage::None);
	}

	#[test]
	fn signature_renders_pointer_and_array_suffixes() {
		let mut arising = ArisingSpecification::new();
		arising.push_specifier("char");
		arising.push_pointer();
		arising.push_array_suffix(Some("4".to_owned()));
		assert_eq!(arising.signature(), "char*[4]");
	}

	#[test]
	fn function_signature_is_incomplete_until_both_parens_seen() {
		let mut signature = FunctionSignature::new();
		assert!(!signature.is_complete());
		signature.open(Token { token_type: crate::lexer::TokenType::LeftParenthesis, value: "(".to_owned(), line: 1, column: 1, whitespace_after: false });
		assert!(!signature.is_complete());
		signature.close(Token { token_type: crate::lexer::TokenType::RightParenthesis, value: ")".to_owned(), line: 1, column: 2, whitespace_after: false });
		assert!(signature.is_complete());
	}

	#[test]
	fn type_matches_ignores_parameter_names() {
		let mut first = FunctionSignature::new();
		first.add_parameter("int", Some("a".to_owned()), None);
		let mut second = FunctionSignature::new();
		second.add_parameter("int", Some("b".to_owned()), None);
		assert!(first.type_matches(&second));
	}
}
