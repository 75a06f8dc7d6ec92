pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod types;
pub mod word;

pub use lexer::{FdForm, Lexer, Token, TokenKind, lex};
pub use parser::{Parser, parse, parse_with_diagnostics};
pub use pretty::{dump, dump_output};
pub use types::{
    CLOBBER_FDS, Command, Diagnostic, DiagnosticKind, Element, ParseOutput, Part, Pipeline,
    RedirectOp, Redirection, Span, TextPart, VarPart, Word,
};
pub use word::{WordBuilder, split_word, split_word_into_parts};
