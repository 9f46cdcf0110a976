//! Lexer implementation using logos

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};
use logos::Logos;

/// Lexer for free-form Fortran source code
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            at_eof: false,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<Token> {
        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, Span::new(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(())) => {
                let span = self.inner.span();
                Err(CompileError::lexer(
                    format!("unexpected character '{}'", self.inner.slice()),
                    Span::new(span.start, span.end),
                ))
            }
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, Span::new(len, len)))
            }
        }
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the source being lexed
    pub fn source(&self) -> &'a str {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_identifiers_are_upper_cased() {
        let mut lexer = Lexer::new("foo Bar_1");
        assert!(matches!(
            lexer.next_token().unwrap().kind,
            TokenKind::Identifier(s) if s == "FOO"
        ));
        assert!(matches!(
            lexer.next_token().unwrap().kind,
            TokenKind::Identifier(s) if s == "BAR_1"
        ));
        assert!(matches!(lexer.next_token().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(
            kinds("10 1.5 2.0D0 3E2 .25"),
            vec![
                TokenKind::IntLiteral(10),
                TokenKind::RealLiteral("1.5".to_string()),
                TokenKind::RealLiteral("2.0D0".to_string()),
                TokenKind::RealLiteral("3E2".to_string()),
                TokenKind::RealLiteral(".25".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dotted_operators() {
        assert_eq!(
            kinds("X .eq. 1 .AND. .not. .TRUE."),
            vec![
                TokenKind::Identifier("X".to_string()),
                TokenKind::Eq,
                TokenKind::IntLiteral(1),
                TokenKind::And,
                TokenKind::Not,
                TokenKind::LogicalLiteral(true),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_character_literals_undouble_quotes() {
        assert_eq!(
            kinds("'it''s' \"a\"\"b\""),
            vec![
                TokenKind::CharLiteral("it's".to_string()),
                TokenKind::CharLiteral("a\"b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_terminators_comments_and_continuations() {
        assert_eq!(
            kinds("A = 1 ! set A\nB = &\n  2; C"),
            vec![
                TokenKind::Identifier("A".to_string()),
                TokenKind::Assign,
                TokenKind::IntLiteral(1),
                TokenKind::Newline,
                TokenKind::Identifier("B".to_string()),
                TokenKind::Assign,
                TokenKind::IntLiteral(2),
                TokenKind::Semi,
                TokenKind::Identifier("C".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_symbolic_operators() {
        assert_eq!(
            kinds("** // /= :: % <="),
            vec![
                TokenKind::Power,
                TokenKind::Concat,
                TokenKind::Ne,
                TokenKind::DoubleColon,
                TokenKind::Percent,
                TokenKind::Le,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("A @ B");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, CompileError::Lexer { .. }));
    }
}
