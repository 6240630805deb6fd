use std::collections::VecDeque;

// Bring the `IntoEnumIterator` trait into scope, which allows us to use `::iter()` on enums that
// `#[derive(strum_macros::EnumIter)]`. This is used on `TokenType` to find which variant matches
// the start of a piece of C source. We assign this to `as _` to make clear the trait itself is
// never referenced, only its methods.
use convert_case::Casing as _;
use strum::IntoEnumIterator as _;

/// A type of token in C source code, after preprocessing-line splicing but before any macro
/// expansion or directive interpretation.
///
/// # Conventions
///
/// Token types are named for what the token *looks like*, not what it's used for in the grammar
/// (`Hash`, not `DirectiveStart`). Variants are declared in match-precedence order: [`TokenType::find_match`]
/// tries each variant in declaration order and returns the first that matches, so a keyword must
/// be declared before `Identifier`, and multi-character operators must be declared before any
/// operator that is one of their prefixes (`Arrow` before `Minus`, `ShiftLeftAssign` before
/// `ShiftLeft` before `LessThan`). Moving a variant relative to `Identifier` or to one of its own
/// prefixes silently changes what gets tokenized; each affected variant below calls this out.
#[derive(strum_macros::EnumIter, PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenType {
	/// A block comment, `/* ... */`. May itself span multiple lines; the matched value includes
	/// both delimiters. Must be declared before `ForwardSlash` and before `Asterisk`, or else an
	/// opening `/*` tokenizes as two separate operators.
	BlockComment,

	/// `/* ...` with no closing `*/` anywhere in the remainder of the file: the "leave multiline
	/// comment when parsing `*/`" edge case the specification leaves unresolved (§9). Must be
	/// declared directly after `BlockComment` -- it only ever matches when `BlockComment` already
	/// failed to find a closing delimiter -- and before `ForwardSlash`/`Asterisk`.
	UnterminatedBlockComment,

	/// A line comment, `// ...`, running to (but not including) the next newline. Must be
	/// declared before `ForwardSlash`.
	LineComment,

	// --- keywords recognized by the declaration and statement scanner ---
	// All keywords must be declared before `Identifier`, or else they tokenize as identifiers.
	KeywordTypedef,
	KeywordStruct,
	KeywordUnion,
	KeywordEnum,
	KeywordConst,
	KeywordStatic,
	KeywordExtern,
	KeywordInline,
	KeywordVoid,
	KeywordSigned,
	KeywordUnsigned,
	KeywordShort,
	KeywordLong,
	KeywordInt,
	KeywordChar,
	KeywordFloat,
	KeywordDouble,
	KeywordBool,
	KeywordAuto,
	KeywordRegister,
	KeywordVolatile,
	KeywordRestrict,
	KeywordSizeof,
	KeywordIf,
	KeywordElse,
	KeywordWhile,
	KeywordDo,
	KeywordFor,
	KeywordSwitch,
	KeywordCase,
	KeywordDefault,
	KeywordBreak,
	KeywordContinue,
	KeywordReturn,
	KeywordGoto,
	KeywordDefined,

	/// An identifier, `[A-Za-z_]\w*`. Must come after every keyword variant above; this pattern
	/// will happily match keyword text too.
	Identifier,

	/// A hexadecimal or decimal or octal integer literal, with an optional `u`/`U`/`l`/`L` suffix
	/// combination, or a floating-point literal with an optional exponent and `f`/`F`/`l`/`L`
	/// suffix. The preprocessor expression evaluator only ever needs the integer forms, but the
	/// declaration scanner also has to skip over floating literals inside initializers.
	Number,

	/// A double-quoted string literal, including escape sequences and the surrounding quotes.
	StringLiteral,

	/// A single-quoted character literal, including the surrounding quotes.
	CharLiteral,

	/// `...`, the variadic parameter marker. Must be declared before `Dot`.
	Ellipsis,

	/// `->`. Must be declared before `Minus`.
	Arrow,
	/// `++`. Must be declared before `Plus`.
	PlusPlus,
	/// `--`. Must be declared before `Minus`.
	MinusMinus,
	/// `<<=`. Must be declared before `ShiftLeft` and `LessEqual`.
	ShiftLeftAssign,
	/// `>>=`. Must be declared before `ShiftRight` and `GreaterEqual`.
	ShiftRightAssign,
	/// `<<`. Must be declared before `LessThan`.
	ShiftLeft,
	/// `>>`. Must be declared before `GreaterThan`.
	ShiftRight,
	/// `<=`. Must be declared before `LessThan`.
	LessEqual,
	/// `>=`. Must be declared before `GreaterThan`.
	GreaterEqual,
	/// `==`. Must be declared before `Equal`.
	EqualEqual,
	/// `!=`. Must be declared before `Bang`.
	NotEqual,
	/// `&&`. Must be declared before `Ampersand`.
	AmpersandAmpersand,
	/// `||`. Must be declared before `Pipe`.
	PipePipe,
	/// `+=`. Must be declared before `Plus`.
	PlusAssign,
	/// `-=`. Must be declared before `Minus`.
	MinusAssign,
	/// `*=`. Must be declared before `Asterisk`.
	StarAssign,
	/// `/=`. Must be declared before `ForwardSlash`.
	SlashAssign,
	/// `%=`. Must be declared before `Percent`.
	PercentAssign,
	/// `&=`. Must be declared before `Ampersand`.
	AmpersandAssign,
	/// `|=`. Must be declared before `Pipe`.
	PipeAssign,
	/// `^=`. Must be declared before `Caret`.
	CaretAssign,
	/// `##`, the token-pasting operator. Must be declared before `Hash`.
	HashHash,

	Hash,
	LeftBrace,
	RightBrace,
	LeftBracket,
	RightBracket,
	LeftParenthesis,
	RightParenthesis,
	Semicolon,
	Comma,
	Dot,
	Colon,
	QuestionMark,
	Equal,
	Plus,
	Minus,
	Asterisk,
	ForwardSlash,
	Percent,
	Bang,
	Ampersand,
	Pipe,
	Caret,
	Tilde,
	LessThan,
	GreaterThan,
	Backslash,

	/// Runs of ASCII whitespace other than the newline itself. Newlines are tokenized separately
	/// ([`TokenType::Newline`]) because the preprocessor driver needs to know where each logical
	/// line ends; both are dropped before tokens reach the declaration scanner.
	Whitespace,

	/// A single `\n` (or `\r\n`, normalized to one token). Preprocessor directives are
	/// line-oriented, so the driver slices the token stream on these rather than re-deriving line
	/// breaks from `Token::line`.
	Newline,
}

impl TokenType {
	/// Returns the regular expression that recognizes this token type at the *start* of a string.
	/// The returned reference is to a lazily-built static, so calling this repeatedly costs
	/// nothing beyond the match itself.
	fn pattern(self) -> &'static regex_macro::Regex {
		match self {
			Self::BlockComment => regex_macro::regex!(r"(?s)^/\*.*?\*/"),
			Self::UnterminatedBlockComment => regex_macro::regex!(r"(?s)^/\*.*"),
			Self::LineComment => regex_macro::regex!(r"^//[^\n]*"),

			Self::KeywordTypedef => regex_macro::regex!(r"^typedef\b"),
			Self::KeywordStruct => regex_macro::regex!(r"^struct\b"),
			Self::KeywordUnion => regex_macro::regex!(r"^union\b"),
			Self::KeywordEnum => regex_macro::regex!(r"^enum\b"),
			Self::KeywordConst => regex_macro::regex!(r"^const\b"),
			Self::KeywordStatic => regex_macro::regex!(r"^static\b"),
			Self::KeywordExtern => regex_macro::regex!(r"^extern\b"),
			Self::KeywordInline => regex_macro::regex!(r"^(inline|__inline__|__inline)\b"),
			Self::KeywordVoid => regex_macro::regex!(r"^void\b"),
			Self::KeywordSigned => regex_macro::regex!(r"^signed\b"),
			Self::KeywordUnsigned => regex_macro::regex!(r"^unsigned\b"),
			Self::KeywordShort => regex_macro::regex!(r"^short\b"),
			Self::KeywordLong => regex_macro::regex!(r"^long\b"),
			Self::KeywordInt => regex_macro::regex!(r"^int\b"),
			Self::KeywordChar => regex_macro::regex!(r"^char\b"),
			Self::KeywordFloat => regex_macro::regex!(r"^float\b"),
			Self::KeywordDouble => regex_macro::regex!(r"^double\b"),
			Self::KeywordBool => regex_macro::regex!(r"^(_Bool|bool)\b"),
			Self::KeywordAuto => regex_macro::regex!(r"^auto\b"),
			Self::KeywordRegister => regex_macro::regex!(r"^register\b"),
			Self::KeywordVolatile => regex_macro::regex!(r"^(volatile|__volatile__)\b"),
			Self::KeywordRestrict => regex_macro::regex!(r"^(restrict|__restrict__|__restrict)\b"),
			Self::KeywordSizeof => regex_macro::regex!(r"^sizeof\b"),
			Self::KeywordIf => regex_macro::regex!(r"^if\b"),
			Self::KeywordElse => regex_macro::regex!(r"^else\b"),
			Self::KeywordWhile => regex_macro::regex!(r"^while\b"),
			Self::KeywordDo => regex_macro::regex!(r"^do\b"),
			Self::KeywordFor => regex_macro::regex!(r"^for\b"),
			Self::KeywordSwitch => regex_macro::regex!(r"^switch\b"),
			Self::KeywordCase => regex_macro::regex!(r"^case\b"),
			Self::KeywordDefault => regex_macro::regex!(r"^default\b"),
			Self::KeywordBreak => regex_macro::regex!(r"^break\b"),
			Self::KeywordContinue => regex_macro::regex!(r"^continue\b"),
			Self::KeywordReturn => regex_macro::regex!(r"^return\b"),
			Self::KeywordGoto => regex_macro::regex!(r"^goto\b"),
			Self::KeywordDefined => regex_macro::regex!(r"^defined\b"),

			Self::Identifier => regex_macro::regex!(r"^[A-Za-z_]\w*"),

			Self::Number => regex_macro::regex!(r"(?i)^(0x[0-9a-f]+|0[0-7]*|[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+|[0-9]+)[uUlLfF]*"),
			Self::StringLiteral => regex_macro::regex!(r#"^"(\\.|[^"\\])*""#),
			Self::CharLiteral => regex_macro::regex!(r"^'(\\.|[^'\\])*'"),

			Self::Ellipsis => regex_macro::regex!(r"^\.\.\."),
			Self::Arrow => regex_macro::regex!(r"^->"),
			Self::PlusPlus => regex_macro::regex!(r"^\+\+"),
			Self::MinusMinus => regex_macro::regex!(r"^--"),
			Self::ShiftLeftAssign => regex_macro::regex!(r"^<<="),
			Self::ShiftRightAssign => regex_macro::regex!(r"^>>="),
			Self::ShiftLeft => regex_macro::regex!(r"^<<"),
			Self::ShiftRight => regex_macro::regex!(r"^>>"),
			Self::LessEqual => regex_macro::regex!(r"^<="),
			Self::GreaterEqual => regex_macro::regex!(r"^>="),
			Self::EqualEqual => regex_macro::regex!(r"^=="),
			Self::NotEqual => regex_macro::regex!(r"^!="),
			Self::AmpersandAmpersand => regex_macro::regex!(r"^&&"),
			Self::PipePipe => regex_macro::regex!(r"^\|\|"),
			Self::PlusAssign => regex_macro::regex!(r"^\+="),
			Self::MinusAssign => regex_macro::regex!(r"^-="),
			Self::StarAssign => regex_macro::regex!(r"^\*="),
			Self::SlashAssign => regex_macro::regex!(r"^/="),
			Self::PercentAssign => regex_macro::regex!(r"^%="),
			Self::AmpersandAssign => regex_macro::regex!(r"^&="),
			Self::PipeAssign => regex_macro::regex!(r"^\|="),
			Self::CaretAssign => regex_macro::regex!(r"^\^="),
			Self::HashHash => regex_macro::regex!(r"^##"),

			Self::Hash => regex_macro::regex!(r"^#"),
			Self::LeftBrace => regex_macro::regex!(r"^\{"),
			Self::RightBrace => regex_macro::regex!(r"^\}"),
			Self::LeftBracket => regex_macro::regex!(r"^\["),
			Self::RightBracket => regex_macro::regex!(r"^\]"),
			Self::LeftParenthesis => regex_macro::regex!(r"^\("),
			Self::RightParenthesis => regex_macro::regex!(r"^\)"),
			Self::Semicolon => regex_macro::regex!(r"^;"),
			Self::Comma => regex_macro::regex!(r"^,"),
			Self::Dot => regex_macro::regex!(r"^\."),
			Self::Colon => regex_macro::regex!(r"^:"),
			Self::QuestionMark => regex_macro::regex!(r"^\?"),
			Self::Equal => regex_macro::regex!(r"^="),
			Self::Plus => regex_macro::regex!(r"^\+"),
			Self::Minus => regex_macro::regex!(r"^-"),
			Self::Asterisk => regex_macro::regex!(r"^\*"),
			Self::ForwardSlash => regex_macro::regex!(r"^/"),
			Self::Percent => regex_macro::regex!(r"^%"),
			Self::Bang => regex_macro::regex!(r"^!"),
			Self::Ampersand => regex_macro::regex!(r"^&"),
			Self::Pipe => regex_macro::regex!(r"^\|"),
			Self::Caret => regex_macro::regex!(r"^\^"),
			Self::Tilde => regex_macro::regex!(r"^~"),
			Self::LessThan => regex_macro::regex!(r"^<"),
			Self::GreaterThan => regex_macro::regex!(r"^>"),
			Self::Backslash => regex_macro::regex!(r"^\\"),

			Self::Whitespace => regex_macro::regex!(r"^[ \t\r\x0B\x0C]+"),
			Self::Newline => regex_macro::regex!(r"^\n"),
		}
	}

	/// Matches this token type against the start of `code`, returning the matched text if any.
	#[must_use]
	pub fn get_match(self, code: &str) -> Option<String> {
		self.pattern().find(code).map(|found| found.as_str().to_owned())
	}

	/// Finds the first token type (in declaration order) that matches the start of `code`.
	#[must_use]
	fn find_match(code: &str) -> Option<(Self, String)> {
		for token_type in Self::iter() {
			if let Some(matched) = token_type.get_match(code) {
				return Some((token_type, matched));
			}
		}
		None
	}

	/// Whether tokens of this type are dropped from the stream entirely. Whitespace is pure
	/// noise and never reaches any consumer. Comments are *not* insignificant by this
	/// definition -- they are retained in the stream so `ls --comment` can list them -- but the
	/// declaration scanner ignores them the same way it ignores any other token type it has no
	/// match arm for.
	#[must_use]
	pub const fn is_insignificant(self) -> bool {
		matches!(self, Self::Whitespace)
	}

	/// Whether this token type is one of the two comment kinds, complete or not.
	#[must_use]
	pub const fn is_comment(self) -> bool {
		matches!(self, Self::BlockComment | Self::UnterminatedBlockComment | Self::LineComment)
	}
}

impl std::fmt::Display for TokenType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A single lexed token, carrying its 1-based source position in the file as it existed *before*
/// continuation-line splicing (so diagnostics point at what the author actually wrote).
#[derive(Debug, Clone)]
pub struct Token {
	pub token_type: TokenType,
	pub value: String,
	pub line: usize,
	pub column: usize,
	/// Whether whitespace (of any kind, including a line break) immediately follows this token
	/// in the source. The declaration scanner doesn't need this, but distinguishing a
	/// function-like macro (`#define FOO(x)`, no space before `(`) from an object-like one whose
	/// replacement list happens to start with a parenthesized expression (`#define FOO (x)`)
	/// depends on it.
	pub whitespace_after: bool,
}

/// Joins every `\` immediately followed by a newline into nothing, per the C standard's line
/// splicing phase. This has to happen before tokenization: a macro name or string literal can be
/// split across a spliced line, and the lexer must see the already-joined text.
///
/// Line numbers are preserved by replacing the splice with a sentinel that [`tokenize`] accounts
/// for when advancing `line`, so diagnostics still point at the physical line the token started
/// on.
#[must_use]
pub fn splice_continuations(source: &str) -> String {
	let mut result = String::with_capacity(source.len());
	let mut chars = source.chars().peekable();
	while let Some(current) = chars.next() {
		if current == '\\' {
			match chars.peek() {
				Some('\n') => {
					chars.next();
					result.push('\n');
					continue;
				}
				Some('\r') => {
					chars.next();
					if chars.peek() == Some(&'\n') {
						chars.next();
					}
					result.push('\n');
					continue;
				}
				_ => {}
			}
		}
		result.push(current);
	}
	result
}

/// Tokenizes a string of (already continuation-spliced) C source into a flat token stream.
///
/// Whitespace and comments are dropped; newlines are kept as [`TokenType::Newline`] so callers
/// that need logical-line boundaries (directive recognition) can find them without re-scanning
/// the original text.
///
/// # Errors
/// Returns an error if a prefix of the remaining code matches no token type -- typically a
/// stray non-ASCII byte or an unused punctuation character.
pub fn tokenize(code: &str) -> anyhow::Result<VecDeque<Token>> {
	let mut remaining = code.to_owned();
	let mut tokens = VecDeque::new();
	let mut line = 1;
	let mut column = 1;

	while !remaining.is_empty() {
		let Some((token_type, value)) = TokenType::find_match(&remaining) else {
			let offending_line = remaining.split('\n').next().unwrap_or_default();
			anyhow::bail!("{line}:{column}:error:Unrecognized token: {offending_line}");
		};

		let length = value.len();
		let newline_count = value.chars().filter(|character| *character == '\n').count();
		let rest = remaining.get(length..).unwrap_or_default();
		let whitespace_after = rest.starts_with(|character: char| character.is_whitespace());

		if !token_type.is_insignificant() {
			tokens.push_back(Token { token_type, value, line, column, whitespace_after });
		}

		line += newline_count;
		column = if newline_count > 0 { 1 } else { column + length };
		remaining = rest.to_owned();
	}

	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn types_of(tokens: &VecDeque<Token>) -> Vec<TokenType> {
		tokens.iter().map(|token| token.token_type).collect()
	}

	#[test]
	fn tokenizes_a_simple_object_like_directive() {
		let tokens = tokenize("#define FOO 1\n").expect("valid source");
		assert_eq!(types_of(&tokens), vec![TokenType::Hash, TokenType::Identifier, TokenType::Identifier, TokenType::Number, TokenType::Newline]);
	}

	#[test]
	fn line_comment_does_not_tokenize_as_two_slashes() {
		let tokens = tokenize("int x; // trailing\n").expect("valid source");
		assert!(!tokens.iter().any(|token| token.token_type == TokenType::ForwardSlash));
	}

	#[test]
	fn block_comment_spans_multiple_lines() {
		let tokens = tokenize("int /* a\nb */ x;\n").expect("valid source");
		let kinds = types_of(&tokens);
		assert_eq!(kinds, vec![TokenType::KeywordInt, TokenType::BlockComment, TokenType::Identifier, TokenType::Semicolon, TokenType::Newline]);
		let comment = tokens.iter().find(|token| token.token_type == TokenType::BlockComment).expect("comment token present");
		assert_eq!(comment.value, "/* a\nb */");
	}

	#[test]
	fn unterminated_block_comment_consumes_to_end_of_file() {
		let tokens = tokenize("int /* a\nb\n").expect("valid source");
		let kinds = types_of(&tokens);
		assert_eq!(kinds, vec![TokenType::KeywordInt, TokenType::UnterminatedBlockComment]);
	}

	#[test]
	fn whitespace_after_distinguishes_adjacent_parenthesis() {
		let tokens = tokenize("FOO(x)\nFOO (x)\n").expect("valid source");
		assert!(!tokens[0].whitespace_after);
		assert!(tokens[3].whitespace_after);
	}

	#[test]
	fn backslash_newline_continuation_is_spliced_before_tokenizing() {
		let spliced = splice_continuations("#define LONG_MA\\\nCRO 1\n");
		assert_eq!(spliced, "#define LONG_MACRO 1\n");
	}

	#[test]
	fn keyword_takes_precedence_over_identifier() {
		let tokens = tokenize("static").expect("valid source");
		assert_eq!(types_of(&tokens), vec![TokenType::KeywordStatic]);
	}

	#[test]
	fn unrecognized_character_is_an_error() {
		assert!(tokenize("int x @ y;").is_err());
	}

	#[test]
	fn multi_character_operators_are_not_split() {
		let tokens = tokenize("a->b <<= c\n").expect("valid source");
		let kinds = types_of(&tokens);
		assert!(kinds.contains(&TokenType::Arrow));
		assert!(kinds.contains(&TokenType::ShiftLeftAssign));
	}
}
