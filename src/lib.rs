//! shline: a single-line shell pipeline front end.
//!
//! Turns one line of shell-like command text into a structured
//! [`Pipeline`](parse::Pipeline) of commands, each with ordered words and
//! redirections, and expands variable references in those words against a
//! caller-supplied context to produce argument vectors.
//!
//! Parsing never fails: malformed input is recovered locally and the
//! anomalies are reported as [`Diagnostic`](parse::Diagnostic)s alongside
//! the tree. Nothing here executes commands.
//!
//! # Architecture
//!
//! - **[`parse`]**: Lexer, quote-aware word splitter, recursive-descent parser, AST types, pretty dump.
//! - **[`expand`]**: Variable expansion: contexts, `expand_word`, `build_argv`, redirection resolution.
//! - **[`config`]**: CLI configuration: embedded defaults + user overlay merge.
//! - **[`logging`]**: `simplelog` setup for the CLI.

/// CLI configuration types, loading, and overlay merge logic.
pub mod config;
/// Variable expansion against a name → value context.
pub mod expand;
/// Logger installation and per-line parse records.
pub mod logging;
/// Lexer, word splitter, parser, and AST types.
pub mod parse;

pub use expand::{Context, Value, build_argv, expand_word};
pub use parse::{ParseOutput, Pipeline, parse, parse_with_diagnostics};
