//! Recursive descent parser for free-form Fortran

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::*;
use crate::frontend::fortran::lexer::{Lexer, Token, TokenKind};

/// Recursive descent parser over a pre-lexed token stream.
///
/// Alternatives that may fail part-way run inside [`Parser::attempt`], which
/// rewinds the cursor on failure; anything the failed alternative built is
/// dropped with it.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser for the given source
    pub fn new(source: &str) -> CompileResult<Self> {
        let tokens = Lexer::new(source).tokenize_all()?;
        Ok(Self { tokens, pos: 0 })
    }

    /// Parse a complete program unit
    pub fn parse(&mut self) -> CompileResult<Program> {
        let start_span = self.current().span;
        self.skip_terminators();

        let mut name = None;
        if self.current().kind.is_keyword("PROGRAM") {
            self.advance();
            name = Some(self.expect_identifier()?);
            self.expect_terminator()?;
        }

        let mut body = Vec::new();
        loop {
            self.skip_terminators();
            if self.at_end() {
                return Err(CompileError::parser("missing END statement", self.current().span));
            }

            if self.at_end_statement() {
                self.parse_end_statement(name.as_deref())?;
                self.expect_terminator()?;
                break;
            }

            body.push(self.parse_statement()?);
            self.expect_terminator()?;
        }

        self.skip_terminators();
        if !self.at_end() {
            return Err(CompileError::parser(
                "unexpected statement after END",
                self.current().span,
            ));
        }

        Ok(Program {
            name,
            body,
            span: start_span.merge(self.current().span),
        })
    }

    /// Parse one statement, leaving its terminator unconsumed
    pub fn parse_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        let label = self.parse_statement_label()?;

        let kind = self.parse_statement_kind(false)?;
        let stmt = Stmt::new(kind, start_span.merge(self.prev_span()));

        Ok(match label {
            Some(label) => stmt.with_label(label),
            None => stmt,
        })
    }

    /// Tokens not yet consumed
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.pos..]
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn current(&self) -> &Token {
        // The stream always ends with Eof and the cursor never passes it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.current().span
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.current().kind.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> CompileResult<()> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<String> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_terminator(&mut self) -> CompileResult<()> {
        match self.current().kind {
            TokenKind::Newline | TokenKind::Semi => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.current().kind, TokenKind::Newline | TokenKind::Semi) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::parser(
            format!("expected {}, found {}", expected, self.current().kind),
            self.current().span,
        )
    }

    /// Run `f`, rewinding the cursor if it fails
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> CompileResult<T>) -> CompileResult<T> {
        let saved = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = saved;
        }
        result
    }

    /// Of two failed alternatives, keep the one that got further into the input
    fn furthest(a: CompileError, b: CompileError) -> CompileError {
        let start = |e: &CompileError| e.span().map_or(0, |s| s.start);
        if start(&b) > start(&a) { b } else { a }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement_label(&mut self) -> CompileResult<Option<Label>> {
        if matches!(self.current().kind, TokenKind::IntLiteral(_))
            && !self.peek_kind(1).is_terminator()
        {
            return self.parse_label().map(Some);
        }
        Ok(None)
    }

    fn parse_label(&mut self) -> CompileResult<Label> {
        match self.current().kind {
            TokenKind::IntLiteral(value) if (1..=99999).contains(&value) => {
                self.advance();
                Ok(value as Label)
            }
            TokenKind::IntLiteral(_) => Err(CompileError::parser(
                "label must be between 1 and 99999",
                self.current().span,
            )),
            _ => Err(self.unexpected("label")),
        }
    }

    fn at_end_statement(&self) -> bool {
        let offset = usize::from(
            matches!(self.current().kind, TokenKind::IntLiteral(_))
                && self.peek_kind(1).is_keyword("END"),
        );
        let kind = self.peek_kind(offset);
        let next = self.peek_kind(offset + 1);
        (kind.is_keyword("END") && (next.is_terminator() || next.is_keyword("PROGRAM")))
            || kind.is_keyword("ENDPROGRAM")
    }

    fn parse_end_statement(&mut self, program: Option<&str>) -> CompileResult<()> {
        self.parse_statement_label()?;
        if !self.match_keyword("ENDPROGRAM") {
            self.expect_keyword("END")?;
            if !self.match_keyword("PROGRAM") {
                return Ok(());
            }
        }

        if let TokenKind::Identifier(name) = self.current().kind.clone() {
            if let Some(program) = program.filter(|p| *p != name) {
                return Err(CompileError::parser(
                    format!("END PROGRAM {} does not match PROGRAM {}", name, program),
                    self.current().span,
                ));
            }
            self.advance();
        }
        Ok(())
    }

    /// Assignment is tried first; keyword statements are recognized by their
    /// leading identifier. `executable_only` restricts to statements allowed
    /// as the action of a logical IF.
    fn parse_statement_kind(&mut self, executable_only: bool) -> CompileResult<StmtKind> {
        let assignment_error = match self.attempt(|p| p.parse_assignment()) {
            Ok(assignment) => return Ok(StmtKind::Assignment(assignment)),
            Err(e) => e,
        };

        let keyword = match &self.current().kind {
            TokenKind::Identifier(name) => name.clone(),
            _ => return Err(assignment_error),
        };

        let result = match keyword.as_str() {
            "IF" => self.attempt(|p| p.parse_if()),
            "GOTO" | "GO" => self.attempt(|p| p.parse_goto()),
            "CONTINUE" => {
                self.advance();
                Ok(StmtKind::Continue)
            }
            _ if executable_only => return Err(assignment_error),
            "IMPLICIT" => self.attempt(|p| {
                p.advance();
                p.expect_keyword("NONE")?;
                Ok(StmtKind::ImplicitNone)
            }),
            "PARAMETER" => self.attempt(|p| p.parse_parameter()),
            "INTRINSIC" => self.attempt(|p| p.parse_intrinsic()),
            "TYPE" if !matches!(self.peek_kind(1), TokenKind::LParen) => {
                self.attempt(|p| p.parse_derived_type().map(StmtKind::DerivedType))
            }
            "INTEGER" | "REAL" | "LOGICAL" | "COMPLEX" | "BYTE" | "CHARACTER" | "DOUBLE"
            | "DOUBLEPRECISION" | "DOUBLECOMPLEX" | "TYPE" => {
                self.attempt(|p| p.parse_type_decl().map(StmtKind::Declaration))
            }
            _ => return Err(assignment_error),
        };

        result.map_err(|e| Self::furthest(assignment_error, e))
    }

    fn parse_assignment(&mut self) -> CompileResult<Assignment> {
        let name = self.parse_lhs()?;
        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr()?;
        Ok(Assignment { name, init })
    }

    fn parse_goto(&mut self) -> CompileResult<StmtKind> {
        if !self.match_keyword("GOTO") {
            self.expect_keyword("GO")?;
            self.expect_keyword("TO")?;
        }
        Ok(StmtKind::Goto(self.parse_label()?))
    }

    /// `IF (cond) stmt`, falling back to `IF (cond) label, ...`
    fn parse_if(&mut self) -> CompileResult<StmtKind> {
        self.expect_keyword("IF")?;

        let statement_error = match self.attempt(|p| p.parse_if_statement()) {
            Ok(kind) => return Ok(kind),
            Err(e) => e,
        };

        self.attempt(|p| p.parse_if_computed())
            .map_err(|e| Self::furthest(statement_error, e))
    }

    fn parse_if_condition(&mut self) -> CompileResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    /// The nested statement never consumes the terminator, which belongs to
    /// the enclosing statement list.
    fn parse_if_statement(&mut self) -> CompileResult<StmtKind> {
        let cond = self.parse_if_condition()?;

        let start_span = self.current().span;
        let start = self.pos;
        let kind = self.parse_statement_kind(true)?;
        if self.pos == start {
            return Err(self.unexpected("statement"));
        }

        let stmt = Stmt::new(kind, start_span.merge(self.prev_span()));
        Ok(StmtKind::IfStatement {
            cond,
            stmt: Box::new(stmt),
        })
    }

    /// A label that fails to parse after a comma ends the list without
    /// consuming the comma.
    fn parse_if_computed(&mut self) -> CompileResult<StmtKind> {
        let cond = self.parse_if_condition()?;

        let mut labels = vec![self.parse_label()?];
        while self.check(&TokenKind::Comma)
            && matches!(self.peek_kind(1), TokenKind::IntLiteral(_))
        {
            let saved = self.pos;
            self.advance();
            match self.parse_label() {
                Ok(label) => labels.push(label),
                Err(_) => {
                    self.pos = saved;
                    break;
                }
            }
        }

        Ok(StmtKind::IfComputed { cond, labels })
    }

    fn parse_parameter(&mut self) -> CompileResult<StmtKind> {
        self.expect_keyword("PARAMETER")?;
        self.expect(TokenKind::LParen)?;

        let mut constants = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Assign)?;
            constants.push((name, self.parse_expr()?));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(StmtKind::Parameter(constants))
    }

    fn parse_intrinsic(&mut self) -> CompileResult<StmtKind> {
        self.expect_keyword("INTRINSIC")?;
        self.match_token(&TokenKind::DoubleColon);

        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(StmtKind::Intrinsic(names))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_type_name(&mut self) -> CompileResult<TypeName> {
        let name = self.expect_identifier()?;
        Ok(match name.as_str() {
            "INTEGER" => TypeName::Integer,
            "REAL" => TypeName::Real,
            "LOGICAL" => TypeName::Logical,
            "COMPLEX" => TypeName::Complex,
            "BYTE" => TypeName::Byte,
            "CHARACTER" => TypeName::Character,
            "DOUBLEPRECISION" => TypeName::DoublePrecision,
            "DOUBLECOMPLEX" => TypeName::DoubleComplex,
            "DOUBLE" => {
                if self.match_keyword("PRECISION") {
                    TypeName::DoublePrecision
                } else {
                    self.expect_keyword("COMPLEX")?;
                    TypeName::DoubleComplex
                }
            }
            "TYPE" => {
                self.expect(TokenKind::LParen)?;
                let derived = self.expect_identifier()?;
                self.expect(TokenKind::RParen)?;
                TypeName::Derived(derived)
            }
            _ => {
                return Err(CompileError::parser(
                    format!("unknown type '{}'", name),
                    self.prev_span(),
                ));
            }
        })
    }

    fn parse_star_kind(&mut self) -> CompileResult<Option<u32>> {
        if !self.match_token(&TokenKind::Star) {
            return Ok(None);
        }
        match self.current().kind {
            TokenKind::IntLiteral(value) if value > 0 && value <= i64::from(u32::MAX) => {
                self.advance();
                Ok(Some(value as u32))
            }
            _ => Err(self.unexpected("positive size after '*'")),
        }
    }

    fn parse_type_params(&mut self) -> CompileResult<Vec<TypeParam>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        loop {
            let start_span = self.current().span;
            let name = if matches!(self.current().kind, TokenKind::Identifier(_))
                && matches!(self.peek_kind(1), TokenKind::Assign)
            {
                let name = self.expect_identifier()?;
                self.advance();
                Some(name)
            } else {
                None
            };
            let value = self.parse_expr()?;
            params.push(TypeParam {
                name,
                value,
                span: start_span.merge(self.prev_span()),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_decl_attrs(&mut self) -> CompileResult<DeclAttrs> {
        let mut attrs = DeclAttrs::default();
        while self.match_token(&TokenKind::Comma) {
            let attr = self.expect_identifier()?;
            match attr.as_str() {
                "SAVE" | "STATIC" => attrs.is_static = true,
                "AUTOMATIC" => attrs.is_automatic = true,
                "VOLATILE" => attrs.is_volatile = true,
                "POINTER" => attrs.is_pointer = true,
                "PARAMETER" => attrs.is_parameter = true,
                "DIMENSION" => attrs.dimension = Some(self.parse_array_index()?),
                _ => {
                    return Err(CompileError::parser(
                        format!("unknown attribute '{}'", attr),
                        self.prev_span(),
                    ));
                }
            }
        }
        Ok(attrs)
    }

    fn parse_type_decl(&mut self) -> CompileResult<TypeDecl> {
        let start_span = self.current().span;

        let name = self.parse_type_name()?;
        let kind = self.parse_star_kind()?;
        let params = if !matches!(name, TypeName::Derived(_)) && self.check(&TokenKind::LParen) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let attrs = self.parse_decl_attrs()?;
        let ty = TypeSpec {
            name,
            kind,
            params,
            attrs,
            span: start_span.merge(self.prev_span()),
        };

        self.match_token(&TokenKind::DoubleColon);

        let mut entities = vec![self.parse_entity_decl()?];
        while self.match_token(&TokenKind::Comma) {
            entities.push(self.parse_entity_decl()?);
        }

        Ok(TypeDecl {
            ty,
            entities,
            span: start_span.merge(self.prev_span()),
        })
    }

    fn parse_entity_decl(&mut self) -> CompileResult<EntityDecl> {
        let start_span = self.current().span;
        let name = self.expect_identifier()?;
        let dims = if self.check(&TokenKind::LParen) {
            Some(self.parse_array_index()?)
        } else {
            None
        };
        let kind = self.parse_star_kind()?;
        let init = if self.match_token(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(EntityDecl {
            name,
            dims,
            kind,
            init,
            span: start_span.merge(self.prev_span()),
        })
    }

    /// `TYPE name` ... `END TYPE [name]`, leaving the final terminator
    fn parse_derived_type(&mut self) -> CompileResult<DerivedTypeDef> {
        let start_span = self.current().span;
        self.expect_keyword("TYPE")?;
        self.match_token(&TokenKind::DoubleColon);
        let name = self.expect_identifier()?;
        self.expect_terminator()?;

        let mut members = Vec::new();
        loop {
            self.skip_terminators();
            if self.at_end() {
                return Err(CompileError::parser(
                    format!("missing END TYPE for {}", name),
                    start_span,
                ));
            }

            if self.match_end_type() {
                if let TokenKind::Identifier(end_name) = self.current().kind.clone() {
                    if end_name != name {
                        return Err(CompileError::parser(
                            format!("END TYPE {} does not match TYPE {}", end_name, name),
                            self.current().span,
                        ));
                    }
                    self.advance();
                }
                break;
            }

            members.push(self.parse_type_decl()?);
            self.expect_terminator()?;
        }

        Ok(DerivedTypeDef {
            name,
            members,
            span: start_span.merge(self.prev_span()),
        })
    }

    fn match_end_type(&mut self) -> bool {
        if self.current().kind.is_keyword("END") && self.peek_kind(1).is_keyword("TYPE") {
            self.advance();
            self.advance();
            return true;
        }
        self.match_keyword("ENDTYPE")
    }

    // =========================================================================
    // References
    // =========================================================================

    fn parse_lhs(&mut self) -> CompileResult<Lhs> {
        let start_span = self.current().span;
        let name = self.expect_identifier()?;
        let mut lhs = Lhs::new(LhsKind::Variable(name), start_span);

        loop {
            if self.check(&TokenKind::LParen) {
                let index = self.parse_array_index()?;
                lhs = Lhs::new(
                    LhsKind::Array {
                        parent: Box::new(lhs),
                        index,
                    },
                    start_span.merge(self.prev_span()),
                );
            } else if self.match_token(&TokenKind::Percent) {
                let name = self.expect_identifier()?;
                lhs = Lhs::new(
                    LhsKind::Member {
                        parent: Box::new(lhs),
                        name,
                    },
                    start_span.merge(self.prev_span()),
                );
            } else {
                return Ok(lhs);
            }
        }
    }

    /// `( range, ... )`, possibly empty
    fn parse_array_index(&mut self) -> CompileResult<Vec<ArrayRange>> {
        self.expect(TokenKind::LParen)?;
        let mut index = Vec::new();
        if self.match_token(&TokenKind::RParen) {
            return Ok(index);
        }

        loop {
            index.push(self.parse_array_range()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(index)
    }

    fn at_range_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Comma | TokenKind::RParen | TokenKind::Colon
        )
    }

    fn parse_array_range(&mut self) -> CompileResult<ArrayRange> {
        let start_span = self.current().span;

        let first = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        if !self.match_token(&TokenKind::Colon) {
            return match first {
                Some(expr) => Ok(ArrayRange::single(expr)),
                None => Err(self.unexpected("subscript")),
            };
        }

        let last = if self.at_range_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let stride = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(ArrayRange {
            is_slice: true,
            first,
            last,
            stride,
            span: start_span.merge(self.prev_span()),
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        self.parse_equivalence()
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    fn unary(op: UnaryOp, operand: Expr, span: Span) -> Expr {
        let span = span.merge(operand.span);
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    fn parse_equivalence(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_or()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Eqv => BinaryOp::Eqv,
                TokenKind::Neqv => BinaryOp::Neqv,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_or()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_or(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_and()?;
        while self.match_token(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_not()?;
        while self.match_token(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> CompileResult<Expr> {
        if self.check(&TokenKind::Not) {
            let span = self.advance().span;
            let operand = self.parse_not()?;
            return Ok(Self::unary(UnaryOp::Not, operand, span));
        }
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> CompileResult<Expr> {
        let left = self.parse_concat()?;
        let op = match self.current().kind {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_concat()?;
        Ok(Self::binary(op, left, right))
    }

    fn parse_concat(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_additive()?;
        while self.match_token(&TokenKind::Concat) {
            let right = self.parse_additive()?;
            left = Self::binary(BinaryOp::Concat, left, right);
        }
        Ok(left)
    }

    /// A leading sign applies to the whole first term: `-A*B` is `-(A*B)`
    fn parse_additive(&mut self) -> CompileResult<Expr> {
        let sign = match self.current().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };

        let mut left = match sign {
            Some(op) => {
                let span = self.advance().span;
                let operand = self.parse_multiplicative()?;
                Self::unary(op, operand, span)
            }
            None => self.parse_multiplicative()?,
        };

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_power()?;
            left = Self::binary(op, left, right);
        }
    }

    /// `**` is right associative
    fn parse_power(&mut self) -> CompileResult<Expr> {
        let base = self.parse_primary()?;
        if self.match_token(&TokenKind::Power) {
            let exponent = self.parse_power()?;
            return Ok(Self::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let span = self.current().span;
        let kind = match self.current().kind.clone() {
            TokenKind::IntLiteral(value) => ExprKind::IntLiteral(value),
            TokenKind::RealLiteral(text) => {
                let double = text.contains(['d', 'D']);
                let value = text.replace(['d', 'D'], "E").parse::<f64>().map_err(|_| {
                    CompileError::parser(format!("invalid real literal '{}'", text), span)
                })?;
                ExprKind::RealLiteral { value, double }
            }
            TokenKind::CharLiteral(text) => ExprKind::CharLiteral(text),
            TokenKind::LogicalLiteral(value) => ExprKind::LogicalLiteral(value),
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                inner.span = span.merge(self.prev_span());
                return Ok(inner);
            }
            TokenKind::Identifier(_) => {
                let lhs = self.parse_lhs()?;
                let span = lhs.span;
                return Ok(Expr::new(ExprKind::Lhs(lhs), span));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::new(kind, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn statement(source: &str) -> Stmt {
        Parser::new(source).unwrap().parse_statement().unwrap()
    }

    #[test]
    fn test_parse_program_unit() {
        let program = parse("PROGRAM demo\n  X = 1\nEND PROGRAM demo\n");
        assert_eq!(program.name.as_deref(), Some("DEMO"));
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_missing_end_is_an_error() {
        let err = Parser::new("X = 1\n").unwrap().parse().unwrap_err();
        assert!(err.message().contains("missing END"));
    }

    #[test]
    fn test_if_statement_leaves_terminator() {
        let mut parser = Parser::new("IF (X) GOTO 10\nY = 1\n").unwrap();
        let stmt = parser.parse_statement().unwrap();
        match stmt.kind {
            StmtKind::IfStatement { stmt, .. } => assert_eq!(stmt.kind, StmtKind::Goto(10)),
            other => panic!("expected IF statement, got {:?}", other),
        }
        assert_eq!(parser.remaining()[0].kind, TokenKind::Newline);
    }

    #[test]
    fn test_if_statement_nests_in_statement_list() {
        let program = parse("10 CONTINUE\nIF (X) GOTO 10\nY = 1\nEND\n");
        assert_eq!(program.body.len(), 3);
        assert_eq!(program.body[0].label, Some(10));
        assert!(matches!(program.body[1].kind, StmtKind::IfStatement { .. }));
        assert!(matches!(program.body[2].kind, StmtKind::Assignment(_)));
    }

    #[test]
    fn test_if_with_nested_assignment() {
        let stmt = statement("IF (A .GT. 0) B = A");
        match stmt.kind {
            StmtKind::IfStatement { stmt, .. } => {
                assert!(matches!(stmt.kind, StmtKind::Assignment(_)));
            }
            other => panic!("expected IF statement, got {:?}", other),
        }
    }

    #[test]
    fn test_if_computed_labels() {
        let stmt = statement("IF (I - 1) 10, 20, 30");
        match stmt.kind {
            StmtKind::IfComputed { labels, .. } => assert_eq!(labels, vec![10, 20, 30]),
            other => panic!("expected computed IF, got {:?}", other),
        }
    }

    #[test]
    fn test_if_computed_stops_at_bad_label() {
        let mut parser = Parser::new("IF (I) 10, 20, X\n").unwrap();
        let stmt = parser.parse_statement().unwrap();
        match stmt.kind {
            StmtKind::IfComputed { labels, .. } => assert_eq!(labels, vec![10, 20]),
            other => panic!("expected computed IF, got {:?}", other),
        }
        assert_eq!(parser.remaining()[0].kind, TokenKind::Comma);

        let err = Parser::new("IF (I) 10, 20, X\nEND\n").unwrap().parse().unwrap_err();
        assert!(err.message().contains("end of statement"));
    }

    #[test]
    fn test_if_without_action_is_an_error() {
        assert!(Parser::new("IF (X)\n").unwrap().parse_statement().is_err());
    }

    #[test]
    fn test_goto_spellings() {
        assert_eq!(statement("GOTO 20").kind, StmtKind::Goto(20));
        assert_eq!(statement("GO TO 30").kind, StmtKind::Goto(30));
    }

    #[test]
    fn test_array_element_assignment() {
        let stmt = statement("A(I, 2:3) = 0");
        let StmtKind::Assignment(assignment) = stmt.kind else {
            panic!("expected assignment");
        };
        let LhsKind::Array { parent, index } = assignment.name.kind else {
            panic!("expected array reference");
        };
        assert_eq!(parent.kind, LhsKind::Variable("A".to_string()));
        assert_eq!(index.len(), 2);
        assert!(index[0].is_trivial());
        assert!(index[1].is_slice);
        assert!(index[1].last.is_some());
    }

    #[test]
    fn test_member_assignment() {
        let stmt = statement("P%X = 1.5");
        let StmtKind::Assignment(assignment) = stmt.kind else {
            panic!("expected assignment");
        };
        assert_eq!(assignment.name.base_name(), "P");
        assert!(matches!(assignment.name.kind, LhsKind::Member { ref name, .. } if name == "X"));
        assert_eq!(
            assignment.init.kind,
            ExprKind::RealLiteral { value: 1.5, double: false }
        );
    }

    #[test]
    fn test_expression_precedence() {
        let stmt = statement("X = -A + B * C ** 2 ** 3");
        let StmtKind::Assignment(assignment) = stmt.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op, left, right } = assignment.init.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
        let ExprKind::Binary { op, right: power, .. } = right.kind else {
            panic!("expected product");
        };
        assert_eq!(op, BinaryOp::Mul);
        let ExprKind::Binary { op, right: exponent, .. } = power.kind else {
            panic!("expected power");
        };
        assert_eq!(op, BinaryOp::Pow);
        assert!(matches!(exponent.kind, ExprKind::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_logical_precedence() {
        let stmt = statement("L = A .LT. B .AND. .NOT. C .OR. D");
        let StmtKind::Assignment(assignment) = stmt.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op, left, .. } = assignment.init.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_type_declaration() {
        let stmt = statement("INTEGER*2, DIMENSION(10), SAVE :: A, B(5) = 1");
        let StmtKind::Declaration(decl) = stmt.kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.ty.name, TypeName::Integer);
        assert_eq!(decl.ty.kind, Some(2));
        assert!(decl.ty.attrs.is_static);
        assert_eq!(decl.ty.attrs.dimension.as_ref().map(Vec::len), Some(1));
        assert_eq!(decl.entities.len(), 2);
        assert_eq!(decl.entities[1].name, "B");
        assert!(decl.entities[1].dims.is_some());
        assert!(decl.entities[1].init.is_some());
    }

    #[test]
    fn test_kind_parameters_and_double_precision() {
        let StmtKind::Declaration(decl) = statement("REAL(KIND=8) X").kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.ty.params.len(), 1);
        assert_eq!(decl.ty.params[0].name.as_deref(), Some("KIND"));

        let StmtKind::Declaration(decl) = statement("DOUBLE PRECISION D, E").kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.ty.name, TypeName::DoublePrecision);
        assert_eq!(decl.entities.len(), 2);

        let StmtKind::Declaration(decl) = statement("CHARACTER*10 NAME, INITIAL*1").kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.ty.kind, Some(10));
        assert_eq!(decl.entities[1].kind, Some(1));
    }

    #[test]
    fn test_assignment_to_keyword_named_variable() {
        let stmt = statement("INTEGER = 5");
        assert!(matches!(stmt.kind, StmtKind::Assignment(_)));
    }

    #[test]
    fn test_derived_type_definition() {
        let program = parse("TYPE POINT\n  REAL X, Y\nEND TYPE POINT\nTYPE(POINT) :: P\nEND\n");
        assert_eq!(program.body.len(), 2);
        let StmtKind::DerivedType(def) = &program.body[0].kind else {
            panic!("expected derived type");
        };
        assert_eq!(def.name, "POINT");
        assert_eq!(def.members.len(), 1);
        let StmtKind::Declaration(decl) = &program.body[1].kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.ty.name, TypeName::Derived("POINT".to_string()));
    }

    #[test]
    fn test_parameter_and_intrinsic() {
        let stmt = statement("PARAMETER (N = 10, M = N * 2)");
        let StmtKind::Parameter(constants) = stmt.kind else {
            panic!("expected PARAMETER");
        };
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[1].0, "M");

        assert_eq!(
            statement("INTRINSIC SIN, COS").kind,
            StmtKind::Intrinsic(vec!["SIN".to_string(), "COS".to_string()])
        );
        assert_eq!(statement("IMPLICIT NONE").kind, StmtKind::ImplicitNone);
    }

    #[test]
    fn test_statement_function_shape() {
        let stmt = statement("F(X, Y) = X + Y");
        let StmtKind::Assignment(assignment) = stmt.kind else {
            panic!("expected assignment");
        };
        let LhsKind::Array { index, .. } = assignment.name.kind else {
            panic!("expected array reference");
        };
        assert!(index.iter().all(ArrayRange::is_trivial));
        assert_eq!(index[1].first.as_ref().and_then(Expr::as_name), Some("Y"));
    }

    #[test]
    fn test_bad_expression_reports_position() {
        let err = Parser::new("X = 1 +\nEND\n").unwrap().parse().unwrap_err();
        assert!(matches!(err, CompileError::Parser { .. }));
        assert!(err.message().contains("expected expression"));
    }
}
