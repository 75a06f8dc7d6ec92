//! Recursive-descent parser over the token stream.
//!
//! ```text
//! pipeline    := command ('|' command)*
//! command     := (word | redirection)*
//! redirection := redir-op word
//! ```
//!
//! Parsing never fails. Missing redirection targets get a zero-length
//! placeholder word and every recovery is recorded as a [`Diagnostic`].

use super::lexer::{FdForm, Lexer, Token, TokenKind};
use super::types::{
    Command, Diagnostic, DiagnosticKind, ParseOutput, Pipeline, RedirectOp, Redirection, Span,
    Word,
};
use super::word::split_word;

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: Lexer::new(input).tokenize(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseOutput {
        let pipeline = self.parse_pipeline();
        ParseOutput {
            pipeline,
            diagnostics: self.diagnostics,
        }
    }

    /// Current token. The stream always ends in `EndOfInput` and the cursor
    /// never moves past it.
    fn peek(&self) -> Token<'a> {
        self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::EndOfInput {
            self.pos += 1;
        }
        token
    }

    fn parse_pipeline(&mut self) -> Pipeline {
        let mut commands = vec![self.parse_command()];
        while self.peek().kind == TokenKind::Pipe {
            self.advance();
            commands.push(self.parse_command());
        }

        if commands.len() > 1 {
            for command in commands.iter().filter(|c| c.is_empty()) {
                log::debug!("empty pipeline stage at {}", command.span);
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::EmptyCommand, command.span));
            }
        }

        let start = self.tokens.first().map_or(0, |t| t.span.start);
        let end = self
            .tokens
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::EndOfInput)
            .map_or(start, |t| t.span.end);
        Pipeline {
            commands,
            span: Span::new(start, end),
        }
    }

    fn parse_command(&mut self) -> Command {
        let mut words = Vec::new();
        let mut redirections = Vec::new();
        let mut span: Option<Span> = None;

        loop {
            let token = self.peek();
            let redirection = match token.kind {
                TokenKind::Pipe | TokenKind::EndOfInput => break,
                TokenKind::Word => {
                    self.advance();
                    let word = self.word(token);
                    span = Some(span.map_or(word.span, |s| s.to(word.span)));
                    words.push(word);
                    continue;
                }
                TokenKind::Lt => self.parse_redirection(RedirectOp::Input, Some(0)),
                TokenKind::Gt => self.parse_redirection(RedirectOp::Output, Some(1)),
                TokenKind::GtGt => self.parse_redirection(RedirectOp::Append, Some(1)),
                TokenKind::AmpGt => self.parse_redirection(RedirectOp::Clobber, None),
                TokenKind::FdGt { fd, form } => match form {
                    FdForm::Write => self.parse_redirection(RedirectOp::Output, Some(fd)),
                    FdForm::Append => self.parse_redirection(RedirectOp::Append, Some(fd)),
                    FdForm::Dup(target) => self.dup_redirection(fd, target),
                },
            };
            span = Some(span.map_or(redirection.span, |s| s.to(redirection.span)));
            redirections.push(redirection);
        }

        Command {
            words,
            redirections,
            span: span.unwrap_or_else(|| Span::empty(self.peek().span.start)),
        }
    }

    /// The operator token under the cursor followed by its mandatory
    /// target word.
    fn parse_redirection(&mut self, op: RedirectOp, fd: Option<u32>) -> Redirection {
        let op_token = self.advance();
        let target = if self.peek().kind == TokenKind::Word {
            let token = self.advance();
            self.word(token)
        } else {
            log::debug!(
                "{} at {} has no target word, using placeholder",
                op.as_str(),
                op_token.span
            );
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingRedirectTarget,
                op_token.span,
            ));
            Word::placeholder(op_token.span.end)
        };

        Redirection {
            op,
            fd,
            span: op_token.span.to(target.span),
            target,
            dup_target_fd: None,
        }
    }

    /// `N>&M` carries its target in the operator token, so no word is consumed.
    fn dup_redirection(&mut self, fd: u32, target: Option<u32>) -> Redirection {
        let op_token = self.advance();
        if target.is_none() {
            let kind = if op_token.text.ends_with(|c: char| c.is_ascii_digit()) {
                DiagnosticKind::InvalidDupTarget
            } else {
                DiagnosticKind::MissingDupTarget
            };
            log::debug!("{} at {}: {}", op_token.text, op_token.span, kind.message());
            self.diagnostics.push(Diagnostic::new(kind, op_token.span));
        }
        Redirection {
            op: RedirectOp::Dup,
            fd: Some(fd),
            target: Word::placeholder(op_token.span.end),
            dup_target_fd: target,
            span: op_token.span,
        }
    }

    fn word(&mut self, token: Token<'a>) -> Word {
        let (parts, diagnostics) = split_word(token.text, token.span.start);
        for d in &diagnostics {
            log::trace!("{d} in word {:?}", token.text);
        }
        self.diagnostics.extend(diagnostics);
        Word {
            parts,
            span: token.span,
        }
    }
}

/// Parse one line into a pipeline and the diagnostics recorded on the way.
///
/// This is the main entry point for callers that want to inspect anomalies.
pub fn parse_with_diagnostics(input: &str) -> ParseOutput {
    Parser::new(input).parse()
}

/// Parse one line into a pipeline, discarding diagnostics.
pub fn parse(input: &str) -> Pipeline {
    parse_with_diagnostics(input).pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::Part;

    fn literal(word: &Word) -> String {
        word.as_literal().expect("word has variables")
    }

    fn argv(command: &Command) -> Vec<String> {
        command.words.iter().map(literal).collect()
    }

    #[test]
    fn simple_command() {
        let p = parse("ls -la /tmp");
        assert_eq!(p.commands.len(), 1);
        assert_eq!(argv(&p.commands[0]), vec!["ls", "-la", "/tmp"]);
        assert!(p.commands[0].redirections.is_empty());
        assert_eq!(p.commands[0].span, Span::new(0, 11));
    }

    #[test]
    fn pipeline_order() {
        let p = parse("a | b | c");
        let names: Vec<String> = p.commands.iter().map(|c| literal(&c.words[0])).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(p.span, Span::new(0, 9));
    }

    #[test]
    fn output_redirection() {
        let p = parse("a > out.txt");
        let r = &p.commands[0].redirections[0];
        assert_eq!(r.op, RedirectOp::Output);
        assert_eq!(r.fd, Some(1));
        assert_eq!(literal(&r.target), "out.txt");
        assert_eq!(r.span, Span::new(2, 11));
        assert_eq!(argv(&p.commands[0]), vec!["a"]);
    }

    #[test]
    fn input_and_append() {
        let p = parse("sort < in >> out");
        let rs = &p.commands[0].redirections;
        assert_eq!(rs[0].op, RedirectOp::Input);
        assert_eq!(rs[0].fd, Some(0));
        assert_eq!(rs[1].op, RedirectOp::Append);
        assert_eq!(rs[1].fd, Some(1));
        assert_eq!(literal(&rs[1].target), "out");
    }

    #[test]
    fn fd_prefixed_forms() {
        let p = parse("cmd 2> err 3>> log");
        let rs = &p.commands[0].redirections;
        assert_eq!((rs[0].op, rs[0].fd), (RedirectOp::Output, Some(2)));
        assert_eq!((rs[1].op, rs[1].fd), (RedirectOp::Append, Some(3)));
        assert_eq!(literal(&rs[1].target), "log");
    }

    #[test]
    fn dup_redirection() {
        let out = parse_with_diagnostics("cat f 2>&1");
        let cmd = &out.pipeline.commands[0];
        assert_eq!(argv(cmd), vec!["cat", "f"]);
        assert_eq!(cmd.redirections.len(), 1);
        let r = &cmd.redirections[0];
        assert_eq!(r.op, RedirectOp::Dup);
        assert_eq!(r.fd, Some(2));
        assert_eq!(r.dup_target_fd, Some(1));
        assert!(r.target.parts.is_empty());
        assert!(out.is_clean());
    }

    #[test]
    fn dup_does_not_consume_following_word() {
        let p = parse("cmd 2>&1 more");
        assert_eq!(argv(&p.commands[0]), vec!["cmd", "more"]);
    }

    #[test]
    fn dup_missing_target() {
        let out = parse_with_diagnostics("cmd 2>&");
        let r = &out.pipeline.commands[0].redirections[0];
        assert_eq!(r.op, RedirectOp::Dup);
        assert_eq!(r.dup_target_fd, None);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MissingDupTarget);
    }

    #[test]
    fn dup_target_out_of_range() {
        let out = parse_with_diagnostics("cmd 2>&99999999999 x");
        let cmd = &out.pipeline.commands[0];
        assert_eq!(argv(cmd), vec!["cmd", "x"]);
        assert_eq!(cmd.redirections[0].dup_target_fd, None);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::InvalidDupTarget);
        assert_eq!(out.diagnostics[0].span, Span::new(4, 18));
    }

    #[test]
    fn clobber() {
        let p = parse("make &> build.log");
        let r = &p.commands[0].redirections[0];
        assert_eq!(r.op, RedirectOp::Clobber);
        assert_eq!(r.fd, None);
        assert_eq!(r.source_fds(), vec![1, 2]);
        assert_eq!(literal(&r.target), "build.log");
    }

    #[test]
    fn missing_target_at_end() {
        let out = parse_with_diagnostics("echo hi >");
        let r = &out.pipeline.commands[0].redirections[0];
        assert!(r.target.parts.is_empty());
        assert_eq!(r.target.span, Span::empty(9));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MissingRedirectTarget);
        assert_eq!(out.diagnostics[0].span, Span::new(8, 9));
    }

    #[test]
    fn missing_target_before_pipe() {
        let out = parse_with_diagnostics("a > | b");
        assert_eq!(out.pipeline.commands.len(), 2);
        assert_eq!(out.pipeline.commands[0].redirections.len(), 1);
        assert_eq!(literal(&out.pipeline.commands[1].words[0]), "b");
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MissingRedirectTarget);
    }

    #[test]
    fn redirection_followed_by_redirection() {
        let out = parse_with_diagnostics("a > < in");
        let rs = &out.pipeline.commands[0].redirections;
        assert_eq!(rs.len(), 2);
        assert!(rs[0].target.parts.is_empty());
        assert_eq!(literal(&rs[1].target), "in");
    }

    #[test]
    fn consecutive_pipes_keep_empty_command() {
        let out = parse_with_diagnostics("a||b");
        assert_eq!(out.pipeline.commands.len(), 3);
        assert!(out.pipeline.commands[1].is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::EmptyCommand);
    }

    #[test]
    fn trailing_pipe() {
        let p = parse("ls |");
        assert_eq!(p.commands.len(), 2);
        assert!(p.commands[1].is_empty());
    }

    #[test]
    fn empty_input_is_one_empty_command() {
        let out = parse_with_diagnostics("   ");
        assert_eq!(out.pipeline.commands.len(), 1);
        assert!(out.pipeline.commands[0].is_empty());
        assert!(out.is_clean());
    }

    #[test]
    fn redirection_only_command() {
        let p = parse("> out");
        assert!(p.commands[0].words.is_empty());
        assert_eq!(p.commands[0].redirections.len(), 1);
    }

    #[test]
    fn flags_are_opaque_words() {
        let p = parse("mkdir --parents --mode=0755 dir");
        assert_eq!(p.commands[0].words.len(), 4);
        assert!(p.commands[0].redirections.is_empty());
    }

    #[test]
    fn word_spans_are_absolute() {
        let p = parse("echo $HOME");
        let Part::Var(v) = &p.commands[0].words[1].parts[0] else {
            panic!("expected variable");
        };
        assert_eq!(v.name, "HOME");
        assert_eq!(v.span, Span::new(5, 10));
    }

    #[test]
    fn unterminated_quote_is_diagnosed() {
        let out = parse_with_diagnostics("echo 'oops | wc");
        assert_eq!(out.pipeline.commands.len(), 1);
        assert_eq!(literal(&out.pipeline.commands[0].words[1]), "oops | wc");
        assert_eq!(
            out.diagnostics[0].kind,
            DiagnosticKind::UnterminatedSingleQuote
        );
    }

    #[test]
    fn elements_interleave() {
        let p = parse("a > f b");
        let cmd = &p.commands[0];
        let spans: Vec<Span> = cmd.elements().iter().map(|e| e.span()).collect();
        assert_eq!(spans, vec![Span::new(0, 1), Span::new(2, 5), Span::new(6, 7)]);
    }
}
