//! Recursive-descent grammar: tokens → generic CST.
//!
//! The tree follows the HCL2 production names. Punctuation is dropped, newlines
//! are kept inside `new_line_or_comment` nodes. Two shapes matter downstream:
//!
//! - A block whose body holds no statements gets no `body` child.
//! - `binary_op` is `operand binary_term` where the term's right side is a full
//!   expression, so operator chains nest to the right.

use crate::error::{Error, ErrorCode};
use crate::syntax::cst::{Cst, Rule};
use crate::syntax::token::{Token, TokenKind};

/// Deepest nesting of expressions and blocks accepted.
pub const MAX_NESTING: usize = 128;

/// Tallest CST an expression term may grow to through projections.
pub const MAX_TERM_HEIGHT: usize = 512;

pub struct Grammar {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Grammar {
    /// A missing trailing `Eof` is synthesized after the last token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, line, column));
        }
        Self { tokens, pos: 0, depth: 0 }
    }

    /// `start : body`
    pub fn parse(mut self) -> Result<Cst, Vec<Error>> {
        let line = self.peek().line;
        let mut errors = Vec::new();
        let mut children = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            if let Some(nl) = self.new_lines() {
                children.push(nl);
                continue;
            }
            match self.parse_stmt(None) {
                Ok(stmt) => children.push(stmt),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        let body = if children.iter().any(is_stmt) {
            vec![Cst::rule(Rule::Body, line, children)]
        } else {
            Vec::new()
        };
        Ok(Cst::rule(Rule::Start, line, body))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    /// `attribute | block`, followed by a newline or the end of the enclosing body.
    fn parse_stmt(&mut self, closing: Option<TokenKind>) -> Result<Cst, Error> {
        let stmt = if self.peek_next_is(TokenKind::Eq) {
            self.parse_attribute()?
        } else {
            self.parse_block()?
        };
        let at_close = closing.is_some_and(|c| self.check(c));
        if !(self.check(TokenKind::Newline) || self.is_at_end() || at_close) {
            return Err(self.unexpected("newline after statement"));
        }
        Ok(stmt)
    }

    /// `attribute : identifier "=" expression`
    fn parse_attribute(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let key = self.parse_identifier()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        Ok(Cst::rule(Rule::Attribute, line, vec![key, value]))
    }

    /// `block : identifier (identifier | string_lit)* "{" body? "}"`
    fn parse_block(&mut self) -> Result<Cst, Error> {
        self.nested(Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let mut children = vec![self.parse_identifier()?];
        loop {
            match self.peek_kind() {
                TokenKind::Ident(_) => children.push(self.parse_identifier()?),
                TokenKind::StringLit(_) => children.push(self.parse_string_lit()),
                _ => break,
            }
        }
        self.expect(TokenKind::LBrace)?;

        let body_line = self.peek().line;
        let mut inner = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.new_lines() {
                Some(nl) => inner.push(nl),
                None => inner.push(self.parse_stmt(Some(TokenKind::RBrace))?),
            }
        }
        self.expect(TokenKind::RBrace)?;

        if inner.iter().any(is_stmt) {
            children.push(Cst::rule(Rule::Body, body_line, inner));
        } else {
            children.extend(inner);
        }
        Ok(Cst::rule(Rule::Block, line, children))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    /// `expression : operand binary_term?` with `operand : unary_op | expr_term`.
    fn parse_expression(&mut self) -> Result<Cst, Error> {
        self.nested(Self::parse_expression_inner)
    }

    fn parse_expression_inner(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let operand = if matches!(self.peek_kind(), TokenKind::Minus | TokenKind::Bang) {
            let op = Cst::Token(self.advance());
            let term = self.parse_expr_term()?;
            Cst::rule(Rule::UnaryOp, line, vec![op, term])
        } else {
            self.parse_expr_term()?
        };

        if !self.peek_kind().is_binary_operator() {
            return Ok(operand);
        }
        let op_line = self.peek().line;
        let op = Cst::rule(Rule::BinaryOperator, op_line, vec![Cst::Token(self.advance())]);
        let mut term = vec![op];
        term.extend(self.new_lines());
        term.push(self.parse_expression()?);
        let term = Cst::rule(Rule::BinaryTerm, op_line, term);
        Ok(Cst::rule(Rule::BinaryOp, line, vec![operand, term]))
    }

    /// A primary term followed by any number of projections.
    fn parse_expr_term(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let mut term = self.parse_primary()?;
        let mut height = term.height();

        loop {
            // each projection adds two levels
            if height + 2 > MAX_TERM_HEIGHT && matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
                return Err(self.too_deep());
            }
            height += 2;
            let (rule, projection) = match self.peek_kind() {
                TokenKind::Dot => {
                    let dot_line = self.advance().line;
                    match self.peek_kind() {
                        TokenKind::Star => {
                            self.advance();
                            (Rule::AttrSplatExprTerm, Cst::rule(Rule::AttrSplat, dot_line, Vec::new()))
                        }
                        TokenKind::Int(_) => {
                            let index = self.parse_int_lit();
                            (Rule::IndexExprTerm, Cst::rule(Rule::Index, dot_line, vec![index]))
                        }
                        _ => {
                            let name = self.parse_identifier()?;
                            (Rule::GetAttrExprTerm, Cst::rule(Rule::GetAttr, dot_line, vec![name]))
                        }
                    }
                }
                TokenKind::LBracket => {
                    let bracket_line = self.advance().line;
                    let projection = match self.peek_kind() {
                        TokenKind::Star => {
                            self.advance();
                            (Rule::FullSplatExprTerm, Cst::rule(Rule::FullSplat, bracket_line, Vec::new()))
                        }
                        TokenKind::Int(_) => {
                            let index = self.parse_int_lit();
                            (Rule::IndexExprTerm, Cst::rule(Rule::Index, bracket_line, vec![index]))
                        }
                        TokenKind::StringLit(_) => {
                            let index = self.parse_string_lit();
                            (Rule::IndexExprTerm, Cst::rule(Rule::Index, bracket_line, vec![index]))
                        }
                        _ => return Err(self.unexpected("int or string index, or `*`")),
                    };
                    self.expect(TokenKind::RBracket)?;
                    projection
                }
                _ => break,
            };
            let wrapped = Cst::rule(rule, line, vec![term, projection]);
            term = Cst::rule(Rule::ExprTerm, line, vec![wrapped]);
        }

        Ok(term)
    }

    fn parse_primary(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let inner = match self.peek_kind() {
            TokenKind::Int(_) => self.parse_int_lit(),
            TokenKind::Float(_) => Cst::rule(Rule::FloatLit, line, vec![Cst::Token(self.advance())]),
            TokenKind::StringLit(_) => self.parse_string_lit(),
            TokenKind::LBracket => self.parse_tuple()?,
            TokenKind::LBrace => self.parse_object()?,
            TokenKind::Ident(_) if self.peek_next_is(TokenKind::LParen) => self.parse_function_call()?,
            TokenKind::Ident(_) => self.parse_identifier()?,

            // grouped expression keeps its newlines for the lowering to strip
            TokenKind::LParen => {
                self.advance();
                let mut children = Vec::new();
                children.extend(self.new_lines());
                children.push(self.parse_expression()?);
                children.extend(self.new_lines());
                self.expect(TokenKind::RParen)?;
                return Ok(Cst::rule(Rule::ExprTerm, line, children));
            }

            _ => return Err(self.unexpected("expression")),
        };
        Ok(Cst::rule(Rule::ExprTerm, line, vec![inner]))
    }

    /// `tuple : "[" (expression ("," expression)* ","?)? "]"`, newlines anywhere.
    fn parse_tuple(&mut self) -> Result<Cst, Error> {
        let line = self.expect(TokenKind::LBracket)?.line;
        let mut children = Vec::new();
        loop {
            children.extend(self.new_lines());
            if self.check(TokenKind::RBracket) { break; }
            children.push(self.parse_expression()?);
            children.extend(self.new_lines());
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Cst::rule(Rule::Tuple, line, children))
    }

    /// `object : "{" (object_elem (sep object_elem)* sep?)? "}"` where a separator
    /// is a comma, a newline, or both.
    fn parse_object(&mut self) -> Result<Cst, Error> {
        let line = self.expect(TokenKind::LBrace)?.line;
        let mut children = Vec::new();
        children.extend(self.new_lines());
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            children.push(self.parse_object_elem()?);
            let comma = self.matches(TokenKind::Comma);
            let nl = self.new_lines();
            let separated = comma || nl.is_some();
            children.extend(nl);
            if !separated { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Cst::rule(Rule::Object, line, children))
    }

    /// `object_elem : (identifier | string_lit) ("=" | ":") expression`
    fn parse_object_elem(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let key = match self.peek_kind() {
            TokenKind::Ident(_) => self.parse_identifier()?,
            TokenKind::StringLit(_) => self.parse_string_lit(),
            _ => return Err(self.unexpected("object key")),
        };
        if !(self.matches(TokenKind::Eq) || self.matches(TokenKind::Colon)) {
            return Err(self.unexpected("`=` or `:`"));
        }
        let value = self.parse_expression()?;
        Ok(Cst::rule(Rule::ObjectElem, line, vec![key, value]))
    }

    /// `function_call : identifier "(" arguments? ")"`
    fn parse_function_call(&mut self) -> Result<Cst, Error> {
        let line = self.peek().line;
        let mut children = vec![self.parse_identifier()?];
        self.expect(TokenKind::LParen)?;
        children.extend(self.new_lines());
        if !self.check(TokenKind::RParen) {
            let args_line = self.peek().line;
            let mut args = Vec::new();
            loop {
                args.push(self.parse_expression()?);
                args.extend(self.new_lines());
                if !self.matches(TokenKind::Comma) { break; }
                args.extend(self.new_lines());
                if self.check(TokenKind::RParen) { break; }
            }
            children.push(Cst::rule(Rule::Arguments, args_line, args));
        }
        self.expect(TokenKind::RParen)?;
        Ok(Cst::rule(Rule::FunctionCall, line, children))
    }

    // ─── Leaves ──────────────────────────────────────────────────────────────

    fn parse_identifier(&mut self) -> Result<Cst, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(_) => Ok(Cst::rule(Rule::Identifier, tok.line, vec![Cst::Token(tok)])),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    fn parse_string_lit(&mut self) -> Cst {
        let tok = self.advance();
        Cst::rule(Rule::StringLit, tok.line, vec![Cst::Token(tok)])
    }

    fn parse_int_lit(&mut self) -> Cst {
        let tok = self.advance();
        Cst::rule(Rule::IntLit, tok.line, vec![Cst::Token(tok)])
    }

    /// Runs `parse` one nesting level deeper, failing past `MAX_NESTING`.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Cst, Error>) -> Result<Cst, Error> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn too_deep(&self) -> Error {
        let tok = self.peek();
        Error::new(ErrorCode::P003, tok.line, tok.column,
            "expression or block nested too deeply")
    }

    /// Consecutive newline tokens as one `new_line_or_comment` node.
    fn new_lines(&mut self) -> Option<Cst> {
        let line = self.peek().line;
        let mut tokens = Vec::new();
        while self.check(TokenKind::Newline) {
            tokens.push(Cst::Token(self.advance()));
        }
        (!tokens.is_empty()).then(|| Cst::rule(Rule::NewLineOrComment, line, tokens))
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        if self.pos + 1 < self.tokens.len() {
            self.tokens[self.pos + 1].kind == kind
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip to the next newline outside any brackets.
    /// Used after a parse error to attempt recovery.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Newline if depth == 0 => break,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }
}

fn is_stmt(node: &Cst) -> bool {
    matches!(node, Cst::Rule(r) if matches!(r.rule, Rule::Attribute | Rule::Block))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
