//! Byte-oriented lexer: raw text to a flat token stream.
//!
//! Only boundary detection happens here. Quoted regions and backslash pairs
//! are skipped over as opaque spans; their meaning is decided later by
//! [`split_word_into_parts`](super::word::split_word_into_parts).

use serde::Serialize;

use super::types::Span;

/// What follows the `>` of an fd-prefixed redirection like `2>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum FdForm {
    /// `N>`
    Write,
    /// `N>>`
    Append,
    /// `N>&M`; `None` when the digits after `&` were missing.
    Dup(Option<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Word,
    /// `|`
    Pipe,
    /// `>`
    Gt,
    /// `>>`
    GtGt,
    /// `<`
    Lt,
    /// `&>`
    AmpGt,
    /// `N>`, `N>>`, `N>&M`
    FdGt { fd: u32, form: FdForm },
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Exact source slice, quotes and backslashes included.
    pub text: &'a str,
    pub span: Span,
}

pub struct Lexer<'a> {
    input: &'a str,
    src: &'a [u8],
    pos: usize,
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            src: input.as_bytes(),
            pos: 0,
        }
    }

    /// Lex the whole input. The result always ends with exactly one
    /// [`TokenKind::EndOfInput`] spanning `[len, len]`.
    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::EndOfInput;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        while self.src.get(self.pos).is_some_and(|&b| is_blank(b)) {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(&b) = self.src.get(self.pos) else {
            return self.token(TokenKind::EndOfInput, start);
        };

        let kind = match b {
            b'|' => {
                self.pos += 1;
                TokenKind::Pipe
            }
            b'&' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                TokenKind::AmpGt
            }
            b'0'..=b'9' => match self.fd_redirect() {
                Some(kind) => kind,
                None => self.word(),
            },
            b'>' => {
                self.pos += 1;
                if self.eat(b'>') {
                    TokenKind::GtGt
                } else {
                    TokenKind::Gt
                }
            }
            b'<' => {
                self.pos += 1;
                TokenKind::Lt
            }
            _ => self.word(),
        };
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.input[start..self.pos],
            span: Span::new(start, self.pos),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.src.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn digit_run_end(&self, from: usize) -> usize {
        let len = self.src[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        from + len
    }

    /// Try `N>`, `N>>`, `N>&M`. Leaves the cursor untouched and returns
    /// `None` when the digits are not immediately followed by `>`, so they
    /// lex as an ordinary word.
    fn fd_redirect(&mut self) -> Option<TokenKind> {
        let digits_end = self.digit_run_end(self.pos);
        if self.src.get(digits_end) != Some(&b'>') {
            return None;
        }
        let fd: u32 = self.input[self.pos..digits_end].parse().ok()?;
        self.pos = digits_end + 1;

        let form = if self.eat(b'>') {
            FdForm::Append
        } else if self.eat(b'&') {
            let target_end = self.digit_run_end(self.pos);
            let target = self.input[self.pos..target_end].parse().ok();
            self.pos = target_end;
            FdForm::Dup(target)
        } else {
            FdForm::Write
        };
        Some(TokenKind::FdGt { fd, form })
    }

    /// Scan a word up to blank space or an unquoted `|`, `<`, `>`, `&>`.
    fn word(&mut self) -> TokenKind {
        while let Some(&b) = self.src.get(self.pos) {
            match b {
                b'|' | b'<' | b'>' => break,
                b'&' if self.peek_at(1) == Some(b'>') => break,
                b if is_blank(b) => break,
                b'\\' => {
                    self.pos += 1;
                    self.skip_char();
                }
                b'\'' => {
                    self.pos += 1;
                    self.pos = match self.src[self.pos..].iter().position(|&c| c == b'\'') {
                        Some(i) => self.pos + i + 1,
                        None => self.src.len(),
                    };
                }
                b'"' => {
                    self.pos += 1;
                    self.skip_double_quoted();
                }
                _ => self.pos += 1,
            }
        }
        TokenKind::Word
    }

    fn skip_char(&mut self) {
        if let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_double_quoted(&mut self) {
        while let Some(&b) = self.src.get(self.pos) {
            self.pos += 1;
            match b {
                b'"' => return,
                b'\\' => self.skip_char(),
                _ => {}
            }
        }
    }
}

/// Lex `input` into tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).tokenize()
}
