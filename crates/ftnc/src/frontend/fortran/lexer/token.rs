//! Token definitions for the Fortran lexer

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

fn char_literal(lex: &mut logos::Lexer<TokenKind>) -> String {
    let slice = lex.slice();
    let quote = &slice[..1];
    let doubled = quote.repeat(2);
    slice[1..slice.len() - 1].replace(&doubled, quote)
}

/// All token kinds in free-form Fortran.
///
/// Fortran has no reserved words, so keywords arrive as identifiers and the
/// parser recognizes them by position. Identifiers are upper-cased.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]        // Skip whitespace
#[logos(skip r"![^\n]*")]           // Skip comments
#[logos(skip r"&[ \t\r]*\n")]       // Skip line continuations
pub enum TokenKind {
    // === Identifiers and literals ===
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_ascii_uppercase())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(i64),

    #[regex(r"[0-9]+\.[0-9]+([eEdD][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eEdD][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+[eEdD][+-]?[0-9]+", |lex| lex.slice().to_string())]
    RealLiteral(String),

    #[regex(r"'([^'\n]|'')*'", char_literal)]
    #[regex(r#""([^"\n]|"")*""#, char_literal)]
    CharLiteral(String),

    #[token(".true.", |_| true, ignore(ascii_case))]
    #[token(".false.", |_| false, ignore(ascii_case))]
    LogicalLiteral(bool),

    // === Relational and logical operators ===
    #[token(".eq.", ignore(ascii_case))]
    #[token("==")]
    Eq,
    #[token(".ne.", ignore(ascii_case))]
    #[token("/=")]
    Ne,
    #[token(".lt.", ignore(ascii_case))]
    #[token("<")]
    Lt,
    #[token(".le.", ignore(ascii_case))]
    #[token("<=")]
    Le,
    #[token(".gt.", ignore(ascii_case))]
    #[token(">")]
    Gt,
    #[token(".ge.", ignore(ascii_case))]
    #[token(">=")]
    Ge,
    #[token(".and.", ignore(ascii_case))]
    And,
    #[token(".or.", ignore(ascii_case))]
    Or,
    #[token(".not.", ignore(ascii_case))]
    Not,
    #[token(".eqv.", ignore(ascii_case))]
    Eqv,
    #[token(".neqv.", ignore(ascii_case))]
    Neqv,

    // === Arithmetic operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    Power,
    #[token("//")]
    Concat,

    // === Punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("%")]
    Percent,

    // === Statement terminators ===
    #[token("\n")]
    Newline,
    #[token(";")]
    Semi,

    Eof,
}

impl TokenKind {
    /// Newline, `;` or end of input
    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semi | TokenKind::Eof)
    }

    /// Identifier spelled `keyword` (case-insensitive, identifiers are upper-cased)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Identifier(name) if name == keyword)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::IntLiteral(value) => write!(f, "integer '{}'", value),
            TokenKind::RealLiteral(text) => write!(f, "real '{}'", text),
            TokenKind::CharLiteral(text) => write!(f, "character literal '{}'", text),
            TokenKind::LogicalLiteral(true) => write!(f, "'.TRUE.'"),
            TokenKind::LogicalLiteral(false) => write!(f, "'.FALSE.'"),
            TokenKind::Eq => write!(f, "'.EQ.'"),
            TokenKind::Ne => write!(f, "'.NE.'"),
            TokenKind::Lt => write!(f, "'.LT.'"),
            TokenKind::Le => write!(f, "'.LE.'"),
            TokenKind::Gt => write!(f, "'.GT.'"),
            TokenKind::Ge => write!(f, "'.GE.'"),
            TokenKind::And => write!(f, "'.AND.'"),
            TokenKind::Or => write!(f, "'.OR.'"),
            TokenKind::Not => write!(f, "'.NOT.'"),
            TokenKind::Eqv => write!(f, "'.EQV.'"),
            TokenKind::Neqv => write!(f, "'.NEQV.'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Power => write!(f, "'**'"),
            TokenKind::Concat => write!(f, "'//'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::DoubleColon => write!(f, "'::'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
