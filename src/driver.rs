//! The parser driver (C8): feeds each logical line to every currently active branch, dispatches
//! preprocessor conditional directives into [`crate::branch::BranchArena`] operations, and drives
//! a simplified declaration scanner over everything else, flushing finished declarations into the
//! [`crate::symbol::SymbolIndex`].
//!
//! The declaration scanner deliberately does not implement a full C grammar -- the specification
//! this crate follows excludes type checking beyond signature shape, and this crate additionally
//! does not recurse into statement bodies or struct/union/enum member lists (see `DESIGN.md`).
//! What it does track precisely, because §4.6 depends on it, is brace nesting: every `{`/`}` pair
//! pushes and pops a scope frame so that [`crate::scope::ScopeStack::contains_function`] correctly
//! answers "is this declaration lexically inside a function body" no matter how deeply nested the
//! enclosing braces are.

use std::collections::{HashSet, VecDeque};

use crate::arising::ArisingSpecification;
use crate::branch::{Adducer, BranchArena, BranchId};
use crate::condition::{Atom, Condition};
use crate::consolidate;
use crate::context::Context;
use crate::diagnostics::{EngineError, SourceLocation};
use crate::lexer::{self, Token, TokenType};
use crate::recorder::{Event, EventKind};
use crate::scope::ScopeFrame;
use crate::symbol::{Occurrence, Symbol, SymbolFamily, SymbolIndex};

/// The result of parsing one translation unit: the symbol index it populated, plus bookkeeping
/// the specification names as owned by the root scope frame.
pub struct TranslationUnit {
	pub main_file: String,
	pub included_files: Vec<String>,
	pub symbols: SymbolIndex,
	pub literals: Vec<LiteralOccurrence>,
	pub comments: Vec<CommentOccurrence>,
}

/// The kind of literal an occurrence represents, per §3's Token data model and `ls --literal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
	String,
	Char,
	Integer,
	Float,
}

/// One literal token seen while scanning a line, under the condition of the branch that saw it.
#[derive(Debug, Clone)]
pub struct LiteralOccurrence {
	pub kind: LiteralKind,
	pub text: String,
	pub location: SourceLocation,
	pub existence_condition: Condition,
}

/// The kind of comment an occurrence represents, for `ls --comment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
	Block,
	Line,
}

/// One comment token seen while scanning a line, under the condition of the branch that saw it.
#[derive(Debug, Clone)]
pub struct CommentOccurrence {
	pub kind: CommentKind,
	pub text: String,
	pub location: SourceLocation,
	pub existence_condition: Condition,
}

/// Classifies a [`TokenType::Number`] token's text as an integer or floating-point literal: a
/// decimal point, an exponent marker not part of a hex prefix, or an `f`/`F` suffix all indicate
/// a floating-point literal.
fn classify_number(text: &str) -> LiteralKind {
	let is_hex = text.starts_with("0x") || text.starts_with("0X");
	let has_exponent = !is_hex && (text.contains('e') || text.contains('E'));
	let has_float_suffix = text.ends_with('f') || text.ends_with('F');
	if text.contains('.') || has_exponent || has_float_suffix {
		LiteralKind::Float
	} else {
		LiteralKind::Integer
	}
}

/// One logical line: its tokens (directives included, `Newline` excluded) and the 1-based source
/// line its first token started on.
struct LogicalLine {
	tokens: Vec<Token>,
	line: usize,
}

fn split_logical_lines(mut tokens: VecDeque<Token>) -> Vec<LogicalLine> {
	let mut lines = Vec::new();
	let mut current = Vec::new();
	while let Some(token) = tokens.pop_front() {
		if token.token_type == TokenType::Newline {
			if !current.is_empty() {
				let line = current[0].line;
				lines.push(LogicalLine { tokens: std::mem::take(&mut current), line });
			}
			continue;
		}
		current.push(token);
	}
	if !current.is_empty() {
		let line = current[0].line;
		lines.push(LogicalLine { tokens: current, line });
	}
	lines
}

/// Parses `source` as the contents of `context.filename()`, returning the populated symbol index.
/// Lexical errors are reported through `context` and stop tokenization of the remainder of the
/// file (a lexical error is fatal per-branch, but since it happens before any branch exists it is
/// effectively fatal for the whole file).
#[must_use]
pub fn parse_translation_unit(context: &mut Context, source: &str) -> TranslationUnit {
	let spliced = lexer::splice_continuations(source);
	let tokens = match lexer::tokenize(&spliced) {
		Ok(tokens) => tokens,
		Err(error) => {
			context.report(EngineError::Lexical {
				location: SourceLocation { file: context.filename().to_owned(), line: 1, column: 1 },
				message: error.to_string(),
			});
			VecDeque::new()
		}
	};

	let lines = split_logical_lines(tokens);
	let mut arena = BranchArena::new();
	let mut symbols = SymbolIndex::new();
	let mut typedef_names: HashSet<String> = HashSet::new();
	let mut conditional_stack: Vec<ConditionalGroup> = Vec::new();
	let mut literals: Vec<LiteralOccurrence> = Vec::new();
	let mut comments: Vec<CommentOccurrence> = Vec::new();
	let root = arena.root();

	for line in &lines {
		context.recorder_mut().record(Event {
			kind: Some(EventKind::LogicalLinePursue),
			branch_id: "*".to_owned(),
			content: Some(render_line(line)),
			..Event::default()
		});

		let leaves = arena.active_leaves(root);
		if let Some(directive) = recognize_directive(line) {
			handle_directive(&mut arena, &mut conditional_stack, &leaves, &directive, line.line, &mut symbols, context);
		} else {
			for leaf in &leaves {
				pursue_line(&mut arena, *leaf, &line.tokens, &mut symbols, &mut typedef_names, &mut literals, &mut comments, context);
			}
		}

		consolidate::consolidate_to_fixed_point(&mut arena, root, context.recorder_mut());
	}

	TranslationUnit { main_file: context.filename().to_owned(), included_files: Vec::new(), symbols, literals, comments }
}

fn render_line(line: &LogicalLine) -> String {
	line.tokens.iter().map(|token| token.value.as_str()).collect::<Vec<_>>().join(" ")
}

// --- preprocessor directive recognition and dispatch ---

/// A recognized `#`-directive: its keyword (`if`, `ifdef`, `elif`, ...) and the tokens after it.
struct Directive<'tokens> {
	keyword: String,
	rest: &'tokens [Token],
}

fn recognize_directive(line: &LogicalLine) -> Option<Directive<'_>> {
	let first = line.tokens.first()?;
	if first.token_type != TokenType::Hash {
		return None;
	}
	let keyword_token = line.tokens.get(1)?;
	if keyword_token.token_type != TokenType::Identifier {
		return None;
	}
	Some(Directive { keyword: keyword_token.value.clone(), rest: &line.tokens[2..] })
}

/// Per-lineage state for one open `#if ... #endif` conditional: one entry per active leaf that
/// existed when the opening directive was seen, since each such leaf forks independently and the
/// forks belonging to the same textual conditional must be tracked together so `#elif`/`#else`
/// know which sibling to extend and `#endif` knows the group has closed.
struct ConditionalEntry {
	parent: BranchId,
	collected: Condition,
	current_child: BranchId,
}

struct ConditionalGroup {
	entries: Vec<ConditionalEntry>,
}

fn handle_directive(arena: &mut BranchArena, stack: &mut Vec<ConditionalGroup>, leaves: &[BranchId], directive: &Directive<'_>, line: usize, symbols: &mut SymbolIndex, context: &mut Context) {
	match directive.keyword.as_str() {
		"if" => {
			let condition = parse_condition_expression(directive.rest, context.atoms_mut());
			open_conditional(arena, stack, leaves, condition, directive.rest, line, context);
		}
		"ifdef" => {
			let name = directive.rest.first().map_or_default(|token| token.value.clone());
			let condition = Condition::atom(context.atoms_mut().intern(Atom::Defined(name)));
			open_conditional(arena, stack, leaves, condition, directive.rest, line, context);
		}
		"ifndef" => {
			let name = directive.rest.first().map_or_default(|token| token.value.clone());
			let condition = Condition::atom(context.atoms_mut().intern(Atom::Defined(name))).complement();
			open_conditional(arena, stack, leaves, condition, directive.rest, line, context);
		}
		"elif" => {
			let Some(group) = stack.last_mut() else {
				context.report(EngineError::Lexical { location: directive_location(context, line), message: "#elif with no open conditional".to_owned() });
				return;
			};
			let condition = parse_condition_expression(directive.rest, context.atoms_mut());
			for entry in &mut group.entries {
				let branch_condition = condition.conjunction(&entry.collected.complement());
				let text = format!("#elif {}", render_tokens(directive.rest));
				arena.deactivate(entry.current_child, context.recorder_mut());
				let child = arena.fork(entry.parent, branch_condition.clone(), Adducer::Directive { text, line }, context.recorder_mut());
				entry.collected = entry.collected.disjunction(&branch_condition);
				entry.current_child = child;
			}
		}
		"else" => {
			let Some(group) = stack.last_mut() else {
				context.report(EngineError::Lexical { location: directive_location(context, line), message: "#else with no open conditional".to_owned() });
				return;
			};
			for entry in &mut group.entries {
				let branch_condition = entry.collected.complement();
				arena.deactivate(entry.current_child, context.recorder_mut());
				let child = arena.fork(entry.parent, branch_condition.clone(), Adducer::Directive { text: "#else".to_owned(), line }, context.recorder_mut());
				entry.collected = entry.collected.disjunction(&branch_condition);
				entry.current_child = child;
			}
		}
		"endif" => {
			if stack.pop().is_none() {
				context.report(EngineError::Lexical { location: directive_location(context, line), message: "#endif with no open conditional".to_owned() });
			}
		}
		"define" => {
			let Some(name_token) = directive.rest.first() else {
				return;
			};
			let opens_parameter_list = !name_token.whitespace_after && directive.rest.get(1).is_some_and(|next| next.token_type == TokenType::LeftParenthesis);
			let family = if opens_parameter_list { SymbolFamily::MacroFunction } else { SymbolFamily::MacroObject };
			let location = SourceLocation { file: context.filename().to_owned(), line, column: name_token.column };
			for &leaf in leaves {
				let symbol = Symbol {
					identifier: name_token.value.clone(),
					family,
					existence_condition: arena.get(leaf).conditions().clone(),
					linkage: crate::symbol::Linkage::None,
					storage_class: None,
					type_signature: String::new(),
					occurrences: vec![Occurrence { location: location.clone(), is_definition: true }],
				};
				if let Err(error) = symbols.announce(symbol, &location) {
					context.report(error);
				}
			}
		}
		// `undef`/`include`/`pragma` and anything else fall through to the ordinary declaration
		// scanner as an opaque line; no macro expansion or textual inclusion happens in this
		// engine, and `#undef` does not retract a macro's existence condition once announced --
		// removing a symbol the index already widened by disjunction across branches isn't
		// representable by the condition algebra without a dedicated operation (see DESIGN.md).
		_ => {}
	}
}

fn open_conditional(arena: &mut BranchArena, stack: &mut Vec<ConditionalGroup>, leaves: &[BranchId], condition: Condition, rest: &[Token], line: usize, context: &mut Context) {
	let mut entries = Vec::with_capacity(leaves.len());
	for &leaf in leaves {
		let text = format!("#if {}", render_tokens(rest));
		let child = arena.fork(leaf, condition.clone(), Adducer::Directive { text, line }, context.recorder_mut());
		entries.push(ConditionalEntry { parent: leaf, collected: condition.clone(), current_child: child });
	}
	stack.push(ConditionalGroup { entries });
}

fn render_tokens(tokens: &[Token]) -> String {
	tokens.iter().map(|token| token.value.as_str()).collect::<Vec<_>>().join(" ")
}

/// A minimal recursive-descent parser for `#if` expressions: `defined(NAME)`/`defined NAME`,
/// `!`, `&&`, `||`, parentheses, bare macro names (truthy), and `0`/nonzero integer literals.
/// Anything else in a real preprocessor expression (arithmetic, `==`, ternary) is treated as an
/// opaque truthy atom keyed by its rendered text -- sound per P1 (it never claims an implication
/// it can't back up) even though it can't prove equivalences that a full evaluator could.
struct ConditionParser<'tokens> {
	tokens: &'tokens [Token],
	position: usize,
}

impl<'tokens> ConditionParser<'tokens> {
	fn peek(&self) -> Option<&'tokens Token> {
		self.tokens.get(self.position)
	}

	fn advance(&mut self) -> Option<&'tokens Token> {
		let token = self.tokens.get(self.position);
		self.position += 1;
		token
	}

	fn parse_or(&mut self, atoms: &mut crate::condition::AtomTable) -> Condition {
		let mut left = self.parse_and(atoms);
		while self.peek().is_some_and(|token| token.token_type == TokenType::PipePipe) {
			self.advance();
			let right = self.parse_and(atoms);
			left = left.disjunction(&right);
		}
		left
	}

	fn parse_and(&mut self, atoms: &mut crate::condition::AtomTable) -> Condition {
		let mut left = self.parse_unary(atoms);
		while self.peek().is_some_and(|token| token.token_type == TokenType::AmpersandAmpersand) {
			self.advance();
			let right = self.parse_unary(atoms);
			left = left.conjunction(&right);
		}
		left
	}

	fn parse_unary(&mut self, atoms: &mut crate::condition::AtomTable) -> Condition {
		if self.peek().is_some_and(|token| token.token_type == TokenType::Bang) {
			self.advance();
			return self.parse_unary(atoms).complement();
		}
		self.parse_primary(atoms)
	}

	fn parse_primary(&mut self, atoms: &mut crate::condition::AtomTable) -> Condition {
		let Some(token) = self.advance() else {
			return Condition::unconditional();
		};
		match token.token_type {
			TokenType::LeftParenthesis => {
				let inner = self.parse_or(atoms);
				if self.peek().is_some_and(|next| next.token_type == TokenType::RightParenthesis) {
					self.advance();
				}
				inner
			}
			TokenType::KeywordDefined => {
				let parenthesized = self.peek().is_some_and(|next| next.token_type == TokenType::LeftParenthesis);
				if parenthesized {
					self.advance();
				}
				let name = self.advance().map(|next| next.value.clone()).unwrap_or_default();
				if parenthesized && self.peek().is_some_and(|next| next.token_type == TokenType::RightParenthesis) {
					self.advance();
				}
				Condition::atom(atoms.intern(Atom::Defined(name)))
			}
			TokenType::Number if token.value == "0" => Condition::never(),
			TokenType::Number => Condition::unconditional(),
			TokenType::Identifier => Condition::atom(atoms.intern(Atom::Truthy(token.value.clone()))),
			_ => Condition::atom(atoms.intern(Atom::Truthy(token.value.clone()))),
		}
	}
}

fn parse_condition_expression(tokens: &[Token], atoms: &mut crate::condition::AtomTable) -> Condition {
	ConditionParser { tokens, position: 0 }.parse_or(atoms)
}

/// Parses `text` as a standalone `#if`-style condition expression, reusing the same grammar the
/// directive handler uses for `#if`/`#elif`. Used by `ls --assume COND` to turn a command-line
/// condition string into a [`Condition`] without going through a whole translation unit.
///
/// # Errors
/// Returns a lexical error if `text` does not tokenize.
pub fn parse_standalone_condition(text: &str, atoms: &mut crate::condition::AtomTable) -> Result<Condition, EngineError> {
	let tokens: Vec<Token> = lexer::tokenize(text)
		.map_err(|error| EngineError::Lexical { location: SourceLocation { file: "<condition>".to_owned(), line: 1, column: 1 }, message: error.to_string() })?
		.into_iter()
		.filter(|token| token.token_type != TokenType::Newline)
		.collect();
	Ok(parse_condition_expression(&tokens, atoms))
}

// --- ordinary-line declaration scanning ---

fn pursue_line(
	arena: &mut BranchArena,
	leaf: BranchId,
	tokens: &[Token],
	symbols: &mut SymbolIndex,
	typedef_names: &mut HashSet<String>,
	literals: &mut Vec<LiteralOccurrence>,
	comments: &mut Vec<CommentOccurrence>,
	context: &mut Context,
) {
	let mut index = 0;
	let mut depth = 0_i32;

	while index < tokens.len() {
		let token = &tokens[index];
		match token.token_type {
			TokenType::StringLiteral => literals.push(LiteralOccurrence {
				kind: LiteralKind::String,
				text: token.value.clone(),
				location: token_location(context, token),
				existence_condition: arena.get(leaf).conditions().clone(),
			}),
			TokenType::CharLiteral => literals.push(LiteralOccurrence {
				kind: LiteralKind::Char,
				text: token.value.clone(),
				location: token_location(context, token),
				existence_condition: arena.get(leaf).conditions().clone(),
			}),
			TokenType::Number => literals.push(LiteralOccurrence {
				kind: classify_number(&token.value),
				text: token.value.clone(),
				location: token_location(context, token),
				existence_condition: arena.get(leaf).conditions().clone(),
			}),
			TokenType::BlockComment | TokenType::UnterminatedBlockComment => comments.push(CommentOccurrence {
				kind: CommentKind::Block,
				text: token.value.clone(),
				location: token_location(context, token),
				existence_condition: arena.get(leaf).conditions().clone(),
			}),
			TokenType::LineComment => comments.push(CommentOccurrence {
				kind: CommentKind::Line,
				text: token.value.clone(),
				location: token_location(context, token),
				existence_condition: arena.get(leaf).conditions().clone(),
			}),
			TokenType::LeftParenthesis => {
				if depth == 0 && arena.get(leaf).scope_stack().current_scope().is_arising() {
					let declarator_is_ready = arena.get(leaf).scope_stack().current_scope().as_arising().is_some_and(|arising| arising.identifier.is_some());
					if declarator_is_ready {
						let mut signature = crate::arising::FunctionSignature::new();
						signature.open(token.clone());
						arena.get_mut(leaf).scope_stack_mut().enter_scope(ScopeFrame::FunctionSignature(signature));
					}
				}
				depth += 1;
			}
			TokenType::RightParenthesis => {
				depth -= 1;
				if matches!(arena.get(leaf).scope_stack().current_scope(), ScopeFrame::FunctionSignature(_)) {
					let mut frame = arena.get_mut(leaf).scope_stack_mut().leave_scope();
					if let Some(signature) = frame.as_function_signature_mut() {
						signature.close(token.clone());
					}
					if let ScopeFrame::FunctionSignature(signature) = frame {
						if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
							arising.is_function = true;
							arising.function_signature = Some(signature);
						}
					}
				}
			}
			TokenType::LeftBrace => {
				let opens_function = matches!(arena.get(leaf).scope_stack().current_scope(), ScopeFrame::Arising(arising) if arising.is_function);
				if opens_function {
					finalize_declaration(arena, leaf, symbols, typedef_names, &token_location(context, token), true, context);
					arena.get_mut(leaf).scope_stack_mut().enter_scope(ScopeFrame::Function);
				} else {
					arena.get_mut(leaf).scope_stack_mut().enter_scope(ScopeFrame::CompoundStatement);
				}
			}
			TokenType::RightBrace => {
				if arena.get(leaf).scope_stack().depth() > 1 {
					arena.get_mut(leaf).scope_stack_mut().leave_scope();
				}
			}
			TokenType::Semicolon => {
				if arena.get(leaf).scope_stack().current_scope().is_arising() {
					finalize_declaration(arena, leaf, symbols, typedef_names, &token_location(context, token), false, context);
				}
			}
			TokenType::Comma => {
				if depth == 0 {
					finalize_and_continue_declarator_list(arena, leaf, symbols, typedef_names, &token_location(context, token), context);
				}
			}
			TokenType::Asterisk => {
				if depth == 0 {
					ensure_arising(arena, leaf);
					if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
						if arising.identifier.is_none() {
							arising.push_pointer();
						}
					}
				}
			}
			TokenType::Identifier => {
				handle_identifier_token(arena, leaf, token, typedef_names);
			}
			TokenType::KeywordTypedef
			| TokenType::KeywordStruct
			| TokenType::KeywordUnion
			| TokenType::KeywordEnum
			| TokenType::KeywordConst
			| TokenType::KeywordStatic
			| TokenType::KeywordExtern
			| TokenType::KeywordInline
			| TokenType::KeywordVoid
			| TokenType::KeywordSigned
			| TokenType::KeywordUnsigned
			| TokenType::KeywordShort
			| TokenType::KeywordLong
			| TokenType::KeywordInt
			| TokenType::KeywordChar
			| TokenType::KeywordFloat
			| TokenType::KeywordDouble
			| TokenType::KeywordBool
			| TokenType::KeywordAuto
			| TokenType::KeywordRegister
			| TokenType::KeywordVolatile
			| TokenType::KeywordRestrict => {
				if depth == 0 {
					ensure_arising(arena, leaf);
					if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
						arising.push_specifier(keyword_text(token.token_type));
					}
				}
			}
			_ => {}
		}
		index += 1;
	}
}

fn keyword_text(token_type: TokenType) -> &'static str {
	match token_type {
		TokenType::KeywordTypedef => "typedef",
		TokenType::KeywordStruct => "struct",
		TokenType::KeywordUnion => "union",
		TokenType::KeywordEnum => "enum",
		TokenType::KeywordConst => "const",
		TokenType::KeywordStatic => "static",
		TokenType::KeywordExtern => "extern",
		TokenType::KeywordInline => "inline",
		TokenType::KeywordVoid => "void",
		TokenType::KeywordSigned => "signed",
		TokenType::KeywordUnsigned => "unsigned",
		TokenType::KeywordShort => "short",
		TokenType::KeywordLong => "long",
		TokenType::KeywordInt => "int",
		TokenType::KeywordChar => "char",
		TokenType::KeywordFloat => "float",
		TokenType::KeywordDouble => "double",
		TokenType::KeywordBool => "bool",
		TokenType::KeywordAuto => "auto",
		TokenType::KeywordRegister => "register",
		TokenType::KeywordVolatile => "volatile",
		TokenType::KeywordRestrict => "restrict",
		_ => "",
	}
}

fn tag_family(type_specifiers: &[String]) -> Option<SymbolFamily> {
	if type_specifiers.iter().any(|specifier| specifier == "struct") {
		Some(SymbolFamily::TagStruct)
	} else if type_specifiers.iter().any(|specifier| specifier == "union") {
		Some(SymbolFamily::TagUnion)
	} else if type_specifiers.iter().any(|specifier| specifier == "enum") {
		Some(SymbolFamily::TagEnum)
	} else {
		None
	}
}

fn ensure_arising(arena: &mut BranchArena, leaf: BranchId) {
	if !arena.get(leaf).scope_stack().current_scope().is_arising() {
		arena.get_mut(leaf).scope_stack_mut().enter_scope(ScopeFrame::Arising(ArisingSpecification::new()));
	}
}

fn handle_identifier_token(arena: &mut BranchArena, leaf: BranchId, token: &Token, typedef_names: &HashSet<String>) {
	let is_typedef_name = typedef_names.contains(&token.value);
	let already_has_declarator = arena.get(leaf).scope_stack().current_scope().as_arising().is_some_and(|arising| arising.identifier.is_some());

	if !arena.get(leaf).scope_stack().current_scope().is_arising() {
		if is_typedef_name {
			ensure_arising(arena, leaf);
			if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
				arising.push_specifier(&token.value);
			}
		}
		return;
	}

	let directly_follows_tag_keyword = arena.get(leaf).scope_stack().current_scope().as_arising().is_some_and(|arising| {
		arising.tag_name.is_none() && arising.identifier.is_none() && arising.type_specifiers.last().is_some_and(|specifier| matches!(specifier.as_str(), "struct" | "union" | "enum"))
	});
	if directly_follows_tag_keyword {
		if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
			arising.tag_name = Some(token.value.clone());
			arising.type_specifiers.push(token.value.clone());
		}
		return;
	}

	if already_has_declarator {
		return;
	}

	let has_any_specifier = arena
		.get(leaf)
		.scope_stack()
		.current_scope()
		.as_arising()
		.is_some_and(|arising| arising.storage_class.is_some() || !arising.qualifiers.is_empty() || !arising.type_specifiers.is_empty());

	if is_typedef_name && !has_any_specifier {
		if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
			arising.push_specifier(&token.value);
		}
		return;
	}

	if has_any_specifier {
		if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
			arising.identifier = Some(token.value.clone());
		}
	}
}

fn token_location(context: &Context, token: &Token) -> SourceLocation {
	SourceLocation { file: context.filename().to_owned(), line: token.line, column: token.column }
}

/// Builds a location for a diagnostic that applies to a whole directive line rather than one
/// token, such as an orphan `#elif`/`#else`/`#endif`.
fn directive_location(context: &Context, line: usize) -> SourceLocation {
	SourceLocation { file: context.filename().to_owned(), line, column: 1 }
}

/// Finalizes the `Arising` frame currently on top of `leaf`'s scope stack into a symbol, per
/// §4.6. `is_definition` is true when finalization was triggered by a function body's opening
/// brace; false when triggered by a terminating `;`.
fn finalize_declaration(arena: &mut BranchArena, leaf: BranchId, symbols: &mut SymbolIndex, typedef_names: &mut HashSet<String>, location: &SourceLocation, is_definition: bool, context: &mut Context) {
	let frame = arena.get_mut(leaf).scope_stack_mut().leave_scope();
	let ScopeFrame::Arising(arising) = frame else {
		context.report(EngineError::structural("finalize_declaration called with a non-arising top frame"));
		return;
	};

	if let Some(tag_name) = &arising.tag_name {
		if let Some(family) = tag_family(&arising.type_specifiers) {
			let tag_symbol = Symbol {
				identifier: tag_name.clone(),
				family,
				existence_condition: arena.get(leaf).conditions().clone(),
				linkage: crate::symbol::Linkage::None,
				storage_class: None,
				type_signature: tag_name.clone(),
				occurrences: vec![Occurrence { location: location.clone(), is_definition: true }],
			};
			if let Err(error) = symbols.announce(tag_symbol, location) {
				context.report(error);
			}
		}
	}

	let Some(identifier) = arising.identifier.clone() else {
		// A bare `struct Foo { ... };` with no trailing declarator: the tag itself was already
		// announced above, and there is no variable to index.
		return;
	};

	let is_typedef = arising.storage_class == Some(crate::symbol::StorageClass::Typedef);
	if is_typedef {
		typedef_names.insert(identifier.clone());
	}

	let family = if is_typedef {
		SymbolFamily::Typedef
	} else if arising.is_function {
		SymbolFamily::Function
	} else {
		SymbolFamily::Variable
	};

	let enclosing_contains_function = arena.get(leaf).scope_stack().contains_function();
	let linkage = arising.linkage(enclosing_contains_function, family);

	let symbol = Symbol {
		identifier: identifier.clone(),
		family,
		existence_condition: arena.get(leaf).conditions().clone(),
		linkage,
		storage_class: arising.storage_class,
		type_signature: arising.signature(),
		occurrences: vec![Occurrence { location: location.clone(), is_definition }],
	};

	if let Err(error) = symbols.announce(symbol, location) {
		context.report(error);
	}
}

fn finalize_and_continue_declarator_list(arena: &mut BranchArena, leaf: BranchId, symbols: &mut SymbolIndex, typedef_names: &mut HashSet<String>, location: &SourceLocation, context: &mut Context) {
	let Some(mut template) = arena.get(leaf).scope_stack().current_scope().as_arising().cloned() else {
		return;
	};

	if let Some(tag_name) = &template.tag_name {
		if let Some(family) = tag_family(&template.type_specifiers) {
			let tag_symbol = Symbol {
				identifier: tag_name.clone(),
				family,
				existence_condition: arena.get(leaf).conditions().clone(),
				linkage: crate::symbol::Linkage::None,
				storage_class: None,
				type_signature: tag_name.clone(),
				occurrences: vec![Occurrence { location: location.clone(), is_definition: true }],
			};
			if let Err(error) = symbols.announce(tag_symbol, location) {
				context.report(error);
			}
		}
	}

	if template.identifier.is_some() {
		let is_typedef = template.storage_class == Some(crate::symbol::StorageClass::Typedef);
		if is_typedef {
			if let Some(identifier) = &template.identifier {
				typedef_names.insert(identifier.clone());
			}
		}
		let family = if is_typedef { SymbolFamily::Typedef } else { SymbolFamily::Variable };
		let enclosing_contains_function = arena.get(leaf).scope_stack().contains_function();
		let linkage = template.linkage(enclosing_contains_function, family);
		let symbol = Symbol {
			identifier: template.identifier.clone().unwrap_or_default(),
			family,
			existence_condition: arena.get(leaf).conditions().clone(),
			linkage,
			storage_class: template.storage_class,
			type_signature: template.signature(),
			occurrences: vec![Occurrence { location: location.clone(), is_definition: false }],
		};
		if let Err(error) = symbols.announce(symbol, location) {
			context.report(error);
		}
	}

	template.identifier = None;
	template.pointer_depth = 0;
	template.array_suffixes.clear();
	template.is_function = false;
	template.function_signature = None;
	if let Some(arising) = arena.get_mut(leaf).scope_stack_mut().current_scope_mut().as_arising_mut() {
		*arising = template;
	}
}

trait OptionTokenExt {
	fn map_or_default(self, function: impl FnOnce(&Token) -> String) -> String;
}

impl OptionTokenExt for Option<&Token> {
	fn map_or_default(self, function: impl FnOnce(&Token) -> String) -> String {
		self.map_or_else(String::new, function)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Configuration;

	fn parse(source: &str) -> (TranslationUnit, Vec<String>) {
		let mut context = Context::new("a.c", Configuration::default());
		let unit = parse_translation_unit(&mut context, source);
		let diagnostics = context.diagnostics().iter().map(ToString::to_string).collect();
		(unit, diagnostics)
	}

	#[test]
	fn simple_if_else_produces_two_complementary_symbols() {
		let (unit, diagnostics) = parse("#define FOO 1\n#ifdef BAR\nint x;\n#else\nint y;\n#endif\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");

		let x = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("x".to_owned()), ..Default::default() });
		let y = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("y".to_owned()), ..Default::default() });
		assert_eq!(x.len(), 1);
		assert_eq!(y.len(), 1);
		assert!(x[0].existence_condition.equivalent(&y[0].existence_condition.complement()));

		let foo = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("FOO".to_owned()), ..Default::default() });
		assert_eq!(foo.len(), 1);
		assert_eq!(foo[0].family, crate::symbol::SymbolFamily::MacroObject);
		assert!(foo[0].existence_condition.is_unconditional());
	}

	#[test]
	fn elif_chain_produces_three_mutually_exclusive_symbols() {
		let (unit, diagnostics) = parse("#ifdef A\nint x;\n#elif defined(B)\nint y;\n#else\nint z;\n#endif\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");

		let x = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("x".to_owned()), ..Default::default() })[0].existence_condition.clone();
		let y = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("y".to_owned()), ..Default::default() })[0].existence_condition.clone();
		let z = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("z".to_owned()), ..Default::default() })[0].existence_condition.clone();

		// Each branch excludes the others: no two of x/y/z can coexist under any configuration.
		assert!(x.conjunction(&y).is_never());
		assert!(y.conjunction(&z).is_never());
		assert!(x.conjunction(&z).is_never());
		// Together they cover every configuration.
		assert!(x.disjunction(&y).disjunction(&z).is_unconditional());
	}

	#[test]
	fn orphan_elif_else_endif_report_lexical_diagnostics_without_panicking() {
		for source in ["#elif defined(A)\nint x;\n", "#else\nint x;\n", "#endif\nint x;\n"] {
			let (_unit, diagnostics) = parse(source);
			assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
			assert!(diagnostics[0].contains("error"), "{diagnostics:?}");
		}
	}

	#[test]
	fn function_like_macro_is_distinguished_by_adjacent_parenthesis() {
		let (unit, diagnostics) = parse("#define MAX(a, b) ((a) > (b) ? (a) : (b))\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		let max = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("MAX".to_owned()), ..Default::default() });
		assert_eq!(max.len(), 1);
		assert_eq!(max[0].family, crate::symbol::SymbolFamily::MacroFunction);
	}

	#[test]
	fn object_like_macro_with_space_before_parenthesis_is_not_function_like() {
		let (unit, diagnostics) = parse("#define FOO (1)\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		let foo = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("FOO".to_owned()), ..Default::default() });
		assert_eq!(foo.len(), 1);
		assert_eq!(foo[0].family, crate::symbol::SymbolFamily::MacroObject);
	}

	#[test]
	fn identical_declarations_under_the_same_condition_collapse_to_one_symbol() {
		let (unit, diagnostics) = parse("#if A\n int x;\n#endif\n#if A\n int x;\n#endif\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		let x = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("x".to_owned()), ..Default::default() });
		assert_eq!(x.len(), 1);
	}

	#[test]
	fn conflicting_declarations_under_overlapping_conditions_report_a_diagnostic() {
		let (_unit, diagnostics) = parse("#if A\nint x;\n#else\nfloat x;\n#endif\n");
		assert!(!diagnostics.is_empty());
	}

	#[test]
	fn function_parameter_declared_inside_body_has_no_linkage() {
		let (unit, diagnostics) = parse("int add(int a, int b) {\nstatic int total;\n}\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		let total = unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("total".to_owned()), ..Default::default() });
		assert_eq!(total.len(), 1);
		assert_eq!(total[0].linkage, crate::symbol::Linkage::None);
	}

	#[test]
	fn comma_separated_declarators_each_become_a_symbol() {
		let (unit, diagnostics) = parse("int x, y;\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		assert_eq!(unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("x".to_owned()), ..Default::default() }).len(), 1);
		assert_eq!(unit.symbols.find(&crate::symbol::SymbolCriteria { identifier: Some("y".to_owned()), ..Default::default() }).len(), 1);
	}

	#[test]
	fn string_and_integer_literals_are_collected_under_their_branch_condition() {
		let (unit, diagnostics) = parse("#if A\nchar *s = \"hi\";\nint n = 4;\n#endif\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		assert_eq!(unit.literals.iter().filter(|literal| literal.kind == LiteralKind::String).count(), 1);
		let integer = unit.literals.iter().find(|literal| literal.kind == LiteralKind::Integer).expect("integer literal collected");
		assert!(!integer.existence_condition.is_unconditional());
	}

	#[test]
	fn floating_point_literal_is_distinguished_from_integer() {
		let (unit, diagnostics) = parse("float f = 1.5;\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		assert_eq!(unit.literals.iter().filter(|literal| literal.kind == LiteralKind::Float).count(), 1);
	}

	#[test]
	fn standalone_condition_parses_the_same_grammar_as_if_directives() {
		let mut table = crate::condition::AtomTable::new();
		let parsed = parse_standalone_condition("A && !B", &mut table).expect("valid condition text");
		let a = Condition::atom(table.intern(Atom::Truthy("A".to_owned())));
		let b = Condition::atom(table.intern(Atom::Truthy("B".to_owned())));
		assert!(parsed.equivalent(&a.conjunction(&b.complement())));
	}

	#[test]
	fn line_and_block_comments_are_collected() {
		let (unit, diagnostics) = parse("int x; // trailing\n/* leading */ int y;\n");
		assert!(diagnostics.is_empty(), "{diagnostics:?}");
		assert_eq!(unit.comments.iter().filter(|comment| comment.kind == CommentKind::Line).count(), 1);
		assert_eq!(unit.comments.iter().filter(|comment| comment.kind == CommentKind::Block).count(), 1);
	}
}
