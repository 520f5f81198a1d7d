// src/parser.rs
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidSyntax(String),
}

/// Byte cursor over a `&str`, shared by the expression parser and the directive scanner.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn is_ident_start(c: char) -> bool {
        c == '_' || c == '$' || c.is_ascii_alphabetic()
    }

    pub fn is_ident_char(c: char) -> bool {
        c == '_' || c == '$' || c.is_ascii_alphanumeric()
    }

    pub fn parse_identifier(&mut self) -> Result<&'a str, ParseError> {
        let start = self.i;
        match self.peek_char() {
            Some(c) if Self::is_ident_start(c) => self.i += c.len_utf8(),
            _ => return Err(ParseError::InvalidSyntax("identifier expected".into())),
        }
        while let Some(c) = self.peek_char() {
            if Self::is_ident_char(c) {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(&self.s[start..self.i])
    }

    pub fn parse_number_literal(&mut self) -> Result<Value, ParseError> {
        let start = self.i;
        if self.peek_char() == Some('-') {
            self.i += 1;
        }
        self.skip_digits();
        if self.peek_char() == Some('.') {
            self.i += 1;
            self.skip_digits();
        }
        let s = &self.s[start..self.i];
        if s.is_empty() || s == "-" {
            return Err(ParseError::InvalidSyntax("number expected".into()));
        }
        if s.contains('.') {
            let f: f64 = s
                .parse()
                .map_err(|_| ParseError::InvalidSyntax(format!("bad number `{s}`")))?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| ParseError::InvalidSyntax(format!("bad number `{s}`")))
        } else {
            let i: i64 = s
                .parse()
                .map_err(|_| ParseError::InvalidSyntax(format!("bad number `{s}`")))?;
            Ok(Value::from(i))
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    pub fn parse_quoted_string(&mut self) -> Result<String, ParseError> {
        let quote = self
            .peek_char()
            .ok_or_else(|| ParseError::InvalidSyntax("string".into()))?;
        if quote != '\'' && quote != '"' {
            return Err(ParseError::InvalidSyntax("expected quoted string".into()));
        }
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        '\'' => out.push('\''),
                        _ => {
                            out.push('\\');
                            out.push(nc);
                        }
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        Err(ParseError::InvalidSyntax("unterminated string".into()))
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!("expected '{}'", c)))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    /// Like `consume_str`, but only when `word` is not followed by an identifier character.
    pub fn consume_keyword(&mut self, word: &str) -> bool {
        let after = self.s[self.i..].strip_prefix(word);
        match after {
            Some(rest) if !rest.chars().next().is_some_and(Self::is_ident_char) => {
                self.i += word.len();
                true
            }
            _ => false,
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}
