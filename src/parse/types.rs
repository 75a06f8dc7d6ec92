//! Types produced by the parser and consumed by the expansion layer.

use std::fmt;

use serde::Serialize;

/// Half-open byte range `[start, end)` into the parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-length span at `at`.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Literal text contributed to a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPart {
    pub value: String,
    pub span: Span,
}

/// A variable reference contributed to a word (`$name` or `${name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarPart {
    pub name: String,
    pub braced: bool,
    pub span: Span,
}

/// One piece of a word, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text(TextPart),
    Var(VarPart),
}

impl Part {
    pub fn span(&self) -> Span {
        match self {
            Part::Text(t) => t.span,
            Part::Var(v) => v.span,
        }
    }
}

/// A single argv slot.
///
/// Adjacent literal runs are always merged, so no two neighbouring parts
/// are both [`Part::Text`]. A word with no parts expands to `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word {
    pub parts: Vec<Part>,
    pub span: Span,
}

impl Word {
    /// Zero-length placeholder used when a word is required but absent.
    pub fn placeholder(at: usize) -> Self {
        Self {
            parts: Vec::new(),
            span: Span::empty(at),
        }
    }

    /// The word's value when it contains no variable references.
    pub fn as_literal(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(t) => out.push_str(&t.value),
                Part::Var(_) => return None,
            }
        }
        Some(out)
    }

    pub fn has_variables(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Var(_)))
    }
}

/// Source fds retargeted by `&>`.
pub const CLOBBER_FDS: [u32; 2] = [1, 2];

/// Redirection operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RedirectOp {
    /// `<`
    #[serde(rename = "<")]
    Input,
    /// `>`, `N>`
    #[serde(rename = ">")]
    Output,
    /// `>>`, `N>>`
    #[serde(rename = ">>")]
    Append,
    /// `&>`: stdout and stderr to one file
    #[serde(rename = "clobber")]
    Clobber,
    /// `N>&M`: alias one fd to another
    #[serde(rename = "dup")]
    Dup,
}

impl RedirectOp {
    /// The operator's shell syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::Output => ">",
            RedirectOp::Append => ">>",
            RedirectOp::Clobber => "&>",
            RedirectOp::Dup => ">&",
        }
    }
}

/// A file-descriptor retargeting directive attached to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirection {
    pub op: RedirectOp,
    /// Source fd. `None` only for [`RedirectOp::Clobber`], which covers
    /// [`CLOBBER_FDS`].
    pub fd: Option<u32>,
    /// File target. A zero-length placeholder for dups and for operators
    /// that had no following word.
    pub target: Word,
    /// Set only for [`RedirectOp::Dup`]; `None` when the digits were missing.
    pub dup_target_fd: Option<u32>,
    pub span: Span,
}

impl Redirection {
    /// Every fd this redirection retargets.
    pub fn source_fds(&self) -> Vec<u32> {
        match self.fd {
            Some(fd) => vec![fd],
            None => CLOBBER_FDS.to_vec(),
        }
    }
}

/// One executable invocation: argv words plus redirections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub words: Vec<Word>,
    pub redirections: Vec<Redirection>,
    pub span: Span,
}

/// A word or redirection, borrowed from a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element<'a> {
    Word(&'a Word),
    Redirection(&'a Redirection),
}

impl Element<'_> {
    pub fn span(&self) -> Span {
        match self {
            Element::Word(w) => w.span,
            Element::Redirection(r) => r.span,
        }
    }
}

impl Command {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.redirections.is_empty()
    }

    /// Words and redirections merged back into source order.
    pub fn elements(&self) -> Vec<Element<'_>> {
        let mut out: Vec<Element<'_>> = self
            .words
            .iter()
            .map(Element::Word)
            .chain(self.redirections.iter().map(Element::Redirection))
            .collect();
        out.sort_by_key(|e| e.span().start);
        out
    }
}

/// Commands connected by `|`. Always holds at least one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub span: Span,
}

/// Kind of recoverable anomaly found while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Redirection operator with no following word.
    MissingRedirectTarget,
    /// `N>&` with no target digits.
    MissingDupTarget,
    /// `N>&M` where `M` does not fit an fd number.
    InvalidDupTarget,
    /// `'` never closed; scanning ran to end of input.
    UnterminatedSingleQuote,
    /// `"` never closed; scanning ran to end of input.
    UnterminatedDoubleQuote,
    /// `${` never closed; the name ran to end of input.
    UnterminatedBrace,
    /// Pipeline stage with neither words nor redirections.
    EmptyCommand,
}

impl DiagnosticKind {
    pub fn message(self) -> &'static str {
        match self {
            DiagnosticKind::MissingRedirectTarget => "missing redirection target",
            DiagnosticKind::MissingDupTarget => "missing fd after >&",
            DiagnosticKind::InvalidDupTarget => "fd after >& out of range",
            DiagnosticKind::UnterminatedSingleQuote => "unterminated single quote",
            DiagnosticKind::UnterminatedDoubleQuote => "unterminated double quote",
            DiagnosticKind::UnterminatedBrace => "unterminated ${",
            DiagnosticKind::EmptyCommand => "empty command in pipeline",
        }
    }
}

/// A recoverable anomaly. Never changes the shape of the parsed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind.message(), self.span)
    }
}

/// A parsed pipeline together with whatever the parser had to recover from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseOutput {
    pub pipeline: Pipeline,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    /// True when parsing needed no recovery.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
