//! Quote- and escape-aware decomposition of a raw word into parts.

use super::types::{Diagnostic, DiagnosticKind, Part, Span, TextPart, VarPart};

/// Accumulates word parts, merging each literal run into the preceding
/// text part.
#[derive(Debug, Default)]
pub struct WordBuilder {
    parts: Vec<Part>,
}

impl WordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: &str, span: Span) {
        if text.is_empty() {
            return;
        }
        if let Some(Part::Text(last)) = self.parts.last_mut() {
            last.value.push_str(text);
            last.span = last.span.to(span);
            return;
        }
        self.parts.push(Part::Text(TextPart {
            value: text.to_string(),
            span,
        }));
    }

    pub fn push_char(&mut self, c: char, span: Span) {
        let mut buf = [0u8; 4];
        self.push_text(c.encode_utf8(&mut buf), span);
    }

    pub fn push_variable(&mut self, name: &str, braced: bool, span: Span) {
        self.parts.push(Part::Var(VarPart {
            name: name.to_string(),
            braced,
            span,
        }));
    }

    pub fn finish(self) -> Vec<Part> {
        self.parts
    }
}

/// Single left-to-right scan over one raw word. Offsets are local to `raw`
/// and shifted by `base` when recorded.
struct Splitter<'a> {
    raw: &'a str,
    base: usize,
    pos: usize,
    builder: WordBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Splitter<'a> {
    fn new(raw: &'a str, base: usize) -> Self {
        Self {
            raw,
            base,
            pos: 0,
            builder: WordBuilder::new(),
            diagnostics: Vec::new(),
        }
    }

    fn span(&self, start: usize) -> Span {
        Span::new(self.base + start, self.base + self.pos)
    }

    fn peek(&self) -> Option<char> {
        self.raw[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn note(&mut self, kind: DiagnosticKind, start: usize) {
        let span = self.span(start);
        self.diagnostics.push(Diagnostic::new(kind, span));
    }

    fn run(mut self) -> (Vec<Part>, Vec<Diagnostic>) {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '\'' => self.single_quoted(),
                '"' => self.double_quoted(),
                '$' => self.dollar(),
                '\\' => {
                    self.bump();
                    // A trailing backslash stands for itself.
                    let escaped = self.bump().unwrap_or('\\');
                    let span = self.span(start);
                    self.builder.push_char(escaped, span);
                }
                _ => {
                    self.bump();
                    let span = self.span(start);
                    self.builder.push_char(c, span);
                }
            }
        }
        (self.builder.finish(), self.diagnostics)
    }

    fn single_quoted(&mut self) {
        let raw = self.raw;
        let open = self.pos;
        self.bump();
        let content_start = self.pos;
        match raw[content_start..].find('\'') {
            Some(len) => {
                self.pos = content_start + len;
                let span = self.span(content_start);
                self.builder.push_text(&raw[content_start..self.pos], span);
                self.pos += 1;
            }
            None => {
                self.pos = raw.len();
                let span = self.span(content_start);
                self.builder.push_text(&raw[content_start..], span);
                self.note(DiagnosticKind::UnterminatedSingleQuote, open);
            }
        }
    }

    fn double_quoted(&mut self) {
        let open = self.pos;
        self.bump();
        loop {
            let start = self.pos;
            match self.peek() {
                None => {
                    self.note(DiagnosticKind::UnterminatedDoubleQuote, open);
                    return;
                }
                Some('"') => {
                    self.bump();
                    return;
                }
                Some('\\') => {
                    self.bump();
                    let c = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(c) => c,
                        None => '\\',
                    };
                    let span = self.span(start);
                    self.builder.push_char(c, span);
                }
                Some('$') => self.dollar(),
                Some(c) => {
                    self.bump();
                    let span = self.span(start);
                    self.builder.push_char(c, span);
                }
            }
        }
    }

    /// `${name}`, `$name`, or a literal `$`.
    fn dollar(&mut self) {
        let raw = self.raw;
        let start = self.pos;
        self.bump();
        match self.peek() {
            Some('{') => {
                self.bump();
                let name_start = self.pos;
                let name = match raw[name_start..].find('}') {
                    Some(len) => {
                        self.pos = name_start + len + 1;
                        &raw[name_start..name_start + len]
                    }
                    None => {
                        self.pos = raw.len();
                        self.note(DiagnosticKind::UnterminatedBrace, start);
                        &raw[name_start..]
                    }
                };
                let span = self.span(start);
                self.builder.push_variable(name, true, span);
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let name_start = self.pos;
                let len = raw[name_start..]
                    .bytes()
                    .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                    .count();
                self.pos = name_start + len;
                let span = self.span(start);
                self.builder
                    .push_variable(&raw[name_start..self.pos], false, span);
            }
            _ => {
                let span = self.span(start);
                self.builder.push_text("$", span);
            }
        }
    }
}

/// Decompose the raw text of one word token into literal and variable parts.
///
/// `raw` is the exact source slice with quotes and backslashes still
/// present; `base_offset` is its position in the full input so that part
/// spans refer to the original text.
pub fn split_word_into_parts(raw: &str, base_offset: usize) -> Vec<Part> {
    split_word(raw, base_offset).0
}

/// Like [`split_word_into_parts`], also reporting unterminated quotes and
/// braces.
pub fn split_word(raw: &str, base_offset: usize) -> (Vec<Part>, Vec<Diagnostic>) {
    Splitter::new(raw, base_offset).run()
}
