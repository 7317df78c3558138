use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

pub struct Lexer<'a> {
    text: &'a str,
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    after_dot: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { text: source, source: source.as_bytes(), pos: 0, line: 1, column: 1, after_dot: false }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => {
                    self.after_dot = tok.kind == TokenKind::Dot;
                    tokens.push(tok);
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'\n' => TokenKind::Newline,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'%' => TokenKind::Percent,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else if self.peek() == b'*' {
                    // a block comment spanning lines still separates statements
                    return Ok(self.skip_block_comment(line, col)?.then(|| Token::new(TokenKind::Newline, line, col)));
                }
                else { TokenKind::Slash }
            }
            b'#' => { self.skip_line(); return Ok(None); }
            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            b'!' => {
                if self.peek() == b'=' { self.advance(); TokenKind::BangEq }
                else { TokenKind::Bang }
            }
            b'<' => {
                if self.peek() == b'=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            b'>' => {
                if self.peek() == b'=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }
            b'&' if self.peek() == b'&' => { self.advance(); TokenKind::AndAnd }
            b'|' if self.peek() == b'|' => { self.advance(); TokenKind::OrOr }

            b'"' => TokenKind::StringLit(self.read_string(line, col)?),
            b'0'..=b'9' => self.read_number(line, col)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => TokenKind::Ident(self.read_ident()),

            other => {
                // report a multi-byte character once, not per byte
                let ch = self.text.get(self.pos - 1..).and_then(|s| s.chars().next()).unwrap_or(other as char);
                self.pos += ch.len_utf8().saturating_sub(1);
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{ch}`")));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Newlines are tokens, so only horizontal whitespace is skipped.
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    /// Returns true when the comment contained a line break.
    fn skip_block_comment(&mut self, start_line: usize, start_col: usize) -> Result<bool, Error> {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance(); // *
                self.advance(); // /
                return Ok(self.line != start_line);
            }
            self.advance();
        }
        Err(Error::new(ErrorCode::L006, start_line, start_col, "unterminated block comment"))
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let mut error: Option<Error> = None;
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let (ch_line, ch_col) = (self.line, self.column);
            let ch = self.advance();
            if ch == b'"' { break; }
            if matches!(ch, b'$' | b'%') && self.peek() == b'{' {
                error.get_or_insert_with(|| Error::new(ErrorCode::L005, ch_line, ch_col,
                    format!("template sequence `{}{{` is not supported", ch as char)));
            }
            if ch == b'\\' {
                let esc_line = self.line;
                let esc_col = self.column;
                if self.is_at_end() { continue; }
                match self.advance() {
                    b'n'  => bytes.push(b'\n'),
                    b't'  => bytes.push(b'\t'),
                    b'r'  => bytes.push(b'\r'),
                    b'\\' => bytes.push(b'\\'),
                    b'"'  => bytes.push(b'"'),
                    b'$'  => bytes.push(b'$'),
                    other => {
                        // keep scanning so the whole literal is consumed
                        error.get_or_insert_with(|| Error::new(ErrorCode::L003, esc_line, esc_col,
                            format!("invalid escape sequence `\\{}`", other as char)));
                    }
                }
                continue;
            }
            bytes.push(ch);
        }
        match error {
            Some(e) => Err(e),
            None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Reads an int or float literal. Directly after a `.` only the integer
    /// part is read, so `list.0.1` stays two legacy index steps.
    fn read_number(&mut self, line: usize, col: usize) -> Result<TokenKind, Error> {
        let start = self.pos - 1;
        let mut is_float = false;
        while self.peek().is_ascii_digit() { self.advance(); }

        if !self.after_dot {
            if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
                is_float = true;
                self.advance();
                while self.peek().is_ascii_digit() { self.advance(); }
            }
            if matches!(self.peek(), b'e' | b'E') {
                let sign = matches!(self.peek_next(), b'+' | b'-');
                let digit_at = if sign { self.pos + 2 } else { self.pos + 1 };
                if self.source.get(digit_at).is_some_and(u8::is_ascii_digit) {
                    is_float = true;
                    self.advance();
                    if sign { self.advance(); }
                    while self.peek().is_ascii_digit() { self.advance(); }
                }
            }
        }

        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| Error::new(ErrorCode::L001, line, col, format!("invalid number `{text}`")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| Error::new(ErrorCode::L004, line, col,
                    format!("integer literal `{text}` is out of range")))
        }
    }

    /// Identifiers may contain `-` after the first character (`foo-bar`).
    fn read_ident(&mut self) -> String {
        let start = self.pos - 1;
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-') {
            self.advance();
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
