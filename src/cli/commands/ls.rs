//! The `ls` subcommand: lists the symbols (or, with `--literal`/`--comment`, the literals or
//! comments) a translation unit can contain under some preprocessor configuration.

use std::path::PathBuf;

use anyhow::Context as _;
use colored::Colorize as _;

use crate::cli::commands::EngineCommand;
use crate::condition::Condition;
use crate::config::Configuration;
use crate::context::Context;
use crate::driver::{self, CommentKind, CommentOccurrence, LiteralKind, LiteralOccurrence, TranslationUnit};
use crate::symbol::{Namespace, Symbol, SymbolFamily};

/// The family restriction accepted by `-t, --type`. A superset of [`SymbolFamily`]: `file` lists
/// the translation unit's own file set rather than anything in the symbol index, `symbol`
/// matches every family, and `identifier`/`tag` group several families under the C namespace
/// they share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum TypeFilter {
	File,
	Symbol,
	Identifier,
	Macro,
	Function,
	Variable,
	Type,
	Tag,
	Struct,
	Union,
	Enum,
	Label,
}

impl TypeFilter {
	fn matches_symbol(self, symbol: &Symbol) -> bool {
		match self {
			Self::File => false,
			Self::Symbol => true,
			Self::Identifier => symbol.namespace() == Namespace::Ordinary,
			Self::Macro => matches!(symbol.family, SymbolFamily::MacroObject | SymbolFamily::MacroFunction),
			Self::Function => symbol.family == SymbolFamily::Function,
			Self::Variable => symbol.family == SymbolFamily::Variable,
			Self::Type => symbol.family == SymbolFamily::Typedef,
			Self::Tag => symbol.namespace() == Namespace::Tag,
			Self::Struct => symbol.family == SymbolFamily::TagStruct,
			Self::Union => symbol.family == SymbolFamily::TagUnion,
			Self::Enum => matches!(symbol.family, SymbolFamily::TagEnum | SymbolFamily::EnumConstant),
			Self::Label => symbol.family == SymbolFamily::Label,
		}
	}
}

/// The literal kinds accepted by `--literal`, mirroring [`LiteralKind`] for the CLI surface so
/// the engine module itself stays free of a `clap` dependency.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LiteralFilter {
	String,
	Char,
	Integer,
	Float,
}

impl LiteralFilter {
	const fn matches(self, kind: LiteralKind) -> bool {
		matches!((self, kind), (Self::String, LiteralKind::String) | (Self::Char, LiteralKind::Char) | (Self::Integer, LiteralKind::Integer) | (Self::Float, LiteralKind::Float))
	}
}

/// The comment kinds accepted by `--comment`, mirroring [`CommentKind`].
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CommentFilter {
	Block,
	Line,
}

impl CommentFilter {
	const fn matches(self, kind: CommentKind) -> bool {
		matches!((self, kind), (Self::Block, CommentKind::Block) | (Self::Line, CommentKind::Line))
	}
}

/// `ls [options] FILE...`: lists symbols, literals, or comments found while parsing one or more
/// files.
#[derive(clap::Parser)]
pub struct LsCommand {
	/// The source files to parse.
	#[arg(required = true)]
	files: Vec<PathBuf>,

	/// Restrict the listing to one symbol family (or `file` to list the translation unit's own
	/// files instead of symbols).
	#[arg(short = 't', long = "type")]
	type_filter: Option<TypeFilter>,

	/// List literals of the given kind instead of symbols.
	#[arg(long = "literal")]
	literal: Option<LiteralFilter>,

	/// List comments of the given kind instead of symbols.
	#[arg(long = "comment")]
	comment: Option<CommentFilter>,

	/// A substring filter applied to the identifier (or literal/comment text) before listing.
	#[arg(short = 'f', long = "filter")]
	filter: Option<String>,

	/// Print family, linkage, storage class, and type signature alongside each entry.
	#[arg(short = 'l', long = "long")]
	long: bool,

	/// A custom format string; `{name}`, `{family}`, `{condition}`, `{file}`, and `{line}`
	/// are substituted per entry.
	#[arg(long = "format")]
	format: Option<String>,

	/// List each declaration/definition occurrence rather than one line per symbol.
	#[arg(long = "each")]
	each: bool,

	/// Assume the given condition expression is true; entries whose existence condition can
	/// never hold alongside it are omitted.
	#[arg(long = "assume")]
	assume: Vec<String>,

	/// Shorthand for `--assume defined(NAME)`.
	#[arg(long = "assume-def")]
	assume_defined: Vec<String>,
}

impl EngineCommand for LsCommand {
	#[allow(clippy::too_many_lines)]
	fn execute(self) -> anyhow::Result<()> {
		let directory = std::env::current_dir()?;
		let configuration = Configuration::load(&directory)?;

		for path in &self.files {
			let source = std::fs::read_to_string(path).with_context(|| format!("while reading {}", path.display()))?;
			let mut context = Context::new(path.display().to_string(), configuration.clone());
			let assumed = build_assumption(&configuration, &self, &mut context)?;
			let unit = driver::parse_translation_unit(&mut context, &source);

			if self.type_filter == Some(TypeFilter::File) {
				list_files(&unit);
				continue;
			}

			let format = self.format.as_deref().or(configuration.default_format.as_deref());

			if let Some(literal_filter) = self.literal {
				list_literals(&unit, literal_filter, &self, &assumed, context.atoms(), format);
			} else if let Some(comment_filter) = self.comment {
				list_comments(&unit, comment_filter, &self, &assumed, context.atoms(), format);
			} else {
				list_symbols(&unit, &self, &assumed, context.atoms(), format);
			}

			if !configuration.quiet {
				for diagnostic in context.diagnostics() {
					log::warn!("{diagnostic}");
				}
			}
		}

		Ok(())
	}
}

/// Merges the configuration's default `--assume`/`--assume-def` predicates with any given on the
/// command line into a single [`Condition`] every listed entry's existence condition must remain
/// compatible with.
fn build_assumption(configuration: &Configuration, command: &LsCommand, context: &mut Context) -> anyhow::Result<Condition> {
	let mut assumed = Condition::unconditional();
	for text in configuration.assume.iter().chain(&command.assume) {
		let parsed = driver::parse_standalone_condition(text, context.atoms_mut())?;
		assumed = assumed.conjunction(&parsed);
	}
	for name in configuration.assume_defined.iter().chain(&command.assume_defined) {
		let parsed = driver::parse_standalone_condition(&format!("defined({name})"), context.atoms_mut())?;
		assumed = assumed.conjunction(&parsed);
	}
	Ok(assumed)
}

fn compatible_with_assumption(condition: &Condition, assumed: &Condition) -> bool {
	!condition.conjunction(assumed).is_never()
}

fn passes_filter(filter: Option<&str>, text: &str) -> bool {
	filter.is_none_or(|needle| text.contains(needle))
}

fn list_files(unit: &TranslationUnit) {
	println!("{}", unit.main_file);
	for included in &unit.included_files {
		println!("{included}");
	}
}

fn list_symbols(unit: &TranslationUnit, command: &LsCommand, assumed: &Condition, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	for symbol in unit.symbols.find(&crate::symbol::SymbolCriteria::default()) {
		if !command.type_filter.is_none_or(|filter| filter.matches_symbol(symbol)) {
			continue;
		}
		if !passes_filter(command.filter.as_deref(), &symbol.identifier) {
			continue;
		}
		if !compatible_with_assumption(&symbol.existence_condition, assumed) {
			continue;
		}

		if command.each {
			for occurrence in &symbol.occurrences {
				print_symbol_line(command, symbol, &occurrence.location.to_string(), atoms, format);
			}
		} else {
			print_symbol_line(command, symbol, &format!("{} locations", symbol.occurrences.len()), atoms, format);
		}
	}
}

fn print_symbol_line(command: &LsCommand, symbol: &Symbol, location_text: &str, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	let rendered = match format {
		Some(format) => render_format(format, &symbol.identifier, family_name(symbol.family), &symbol.existence_condition, location_text, atoms),
		None if command.long => format!(
			"{}\t{}\t{}\t{}\t{}\t{}",
			symbol.identifier.bold(),
			family_name(symbol.family),
			symbol.type_signature,
			linkage_name(symbol.linkage),
			symbol.existence_condition.display(atoms),
			location_text
		),
		None => symbol.identifier.clone(),
	};
	println!("{rendered}");
}

fn list_literals(unit: &TranslationUnit, filter: LiteralFilter, command: &LsCommand, assumed: &Condition, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	for literal in &unit.literals {
		if !filter.matches(literal.kind) {
			continue;
		}
		if !passes_filter(command.filter.as_deref(), &literal.text) {
			continue;
		}
		if !compatible_with_assumption(&literal.existence_condition, assumed) {
			continue;
		}
		print_literal_line(command, literal, atoms, format);
	}
}

fn print_literal_line(command: &LsCommand, literal: &LiteralOccurrence, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	match format {
		Some(format) => println!("{}", render_format(format, &literal.text, literal_kind_name(literal.kind), &literal.existence_condition, &literal.location.to_string(), atoms)),
		None if command.long => println!("{}\t{}\t{}\t{}", literal.text, literal_kind_name(literal.kind), literal.existence_condition.display(atoms), literal.location),
		None => println!("{}", literal.text),
	}
}

fn list_comments(unit: &TranslationUnit, filter: CommentFilter, command: &LsCommand, assumed: &Condition, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	for comment in &unit.comments {
		if !filter.matches(comment.kind) {
			continue;
		}
		if !passes_filter(command.filter.as_deref(), &comment.text) {
			continue;
		}
		if !compatible_with_assumption(&comment.existence_condition, assumed) {
			continue;
		}
		print_comment_line(command, comment, atoms, format);
	}
}

fn print_comment_line(command: &LsCommand, comment: &CommentOccurrence, atoms: &crate::condition::AtomTable, format: Option<&str>) {
	match format {
		Some(format) => println!("{}", render_format(format, &comment.text, comment_kind_name(comment.kind), &comment.existence_condition, &comment.location.to_string(), atoms)),
		None if command.long => println!("{}\t{}\t{}\t{}", comment.text, comment_kind_name(comment.kind), comment.existence_condition.display(atoms), comment.location),
		None => println!("{}", comment.text),
	}
}

fn render_format(format: &str, name: &str, family: &str, condition: &Condition, location: &str, atoms: &crate::condition::AtomTable) -> String {
	format
		.replace("{name}", name)
		.replace("{family}", family)
		.replace("{condition}", &condition.display(atoms))
		.replace("{file}", location)
		.replace("{line}", location)
}

const fn linkage_name(linkage: crate::symbol::Linkage) -> &'static str {
	match linkage {
		crate::symbol::Linkage::None => "none",
		crate::symbol::Linkage::Internal => "internal",
		crate::symbol::Linkage::External => "external",
		crate::symbol::Linkage::TypedefNameOnly => "typedef",
	}
}

const fn family_name(family: SymbolFamily) -> &'static str {
	match family {
		SymbolFamily::Function => "function",
		SymbolFamily::Variable => "variable",
		SymbolFamily::Typedef => "type",
		SymbolFamily::TagStruct => "struct",
		SymbolFamily::TagUnion => "union",
		SymbolFamily::TagEnum => "enum",
		SymbolFamily::EnumConstant => "enum-constant",
		SymbolFamily::MacroObject | SymbolFamily::MacroFunction => "macro",
		SymbolFamily::Label => "label",
	}
}

const fn literal_kind_name(kind: LiteralKind) -> &'static str {
	match kind {
		LiteralKind::String => "string",
		LiteralKind::Char => "char",
		LiteralKind::Integer => "integer",
		LiteralKind::Float => "float",
	}
}

const fn comment_kind_name(kind: CommentKind) -> &'static str {
	match kind {
		CommentKind::Block => "block",
		CommentKind::Line => "line",
	}
}
