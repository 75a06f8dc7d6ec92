//! Variable expansion: parsed words plus a context to concrete strings.
//!
//! One word always yields exactly one string. There is no field splitting,
//! globbing, or command substitution.

pub mod context;

pub use context::{Context, EnvContext, Layered, Value};

use serde::Serialize;

use crate::parse::{Command, Part, Pipeline, RedirectOp, Word};

/// Expand `word` against `ctx`. Unset and null variables contribute `""`.
pub fn expand_word<C: Context + ?Sized>(word: &Word, ctx: &C) -> String {
    let mut out = String::new();
    for part in &word.parts {
        match part {
            Part::Text(t) => out.push_str(&t.value),
            Part::Var(v) => match ctx.lookup(&v.name) {
                Some(value) => out.push_str(&value),
                None => log::trace!("${} is unset", v.name),
            },
        }
    }
    out
}

/// Expand every word of `command` into a process argument vector.
/// The command name is simply `argv[0]`.
pub fn build_argv<C: Context + ?Sized>(command: &Command, ctx: &C) -> Vec<String> {
    command.words.iter().map(|w| expand_word(w, ctx)).collect()
}

/// Where a resolved redirection points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectTarget {
    /// An expanded file path.
    Path(String),
    /// Another fd; `None` when the source omitted it.
    Fd(Option<u32>),
}

/// A redirection with its target expanded, ready for an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRedirection {
    pub op: RedirectOp,
    pub fds: Vec<u32>,
    pub target: RedirectTarget,
}

/// Expand the targets of every redirection on `command`, in source order.
pub fn resolve_redirections<C: Context + ?Sized>(
    command: &Command,
    ctx: &C,
) -> Vec<ResolvedRedirection> {
    command
        .redirections
        .iter()
        .map(|r| {
            let target = match r.op {
                RedirectOp::Dup => RedirectTarget::Fd(r.dup_target_fd),
                RedirectOp::Input
                | RedirectOp::Output
                | RedirectOp::Append
                | RedirectOp::Clobber => RedirectTarget::Path(expand_word(&r.target, ctx)),
            };
            ResolvedRedirection {
                op: r.op,
                fds: r.source_fds(),
                target,
            }
        })
        .collect()
}

/// Argv and redirections for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedCommand {
    pub argv: Vec<String>,
    pub redirections: Vec<ResolvedRedirection>,
}

/// Expand every stage of `pipeline`.
pub fn expand_pipeline<C: Context + ?Sized>(pipeline: &Pipeline, ctx: &C) -> Vec<ExpandedCommand> {
    pipeline
        .commands
        .iter()
        .map(|c| ExpandedCommand {
            argv: build_argv(c, ctx),
            redirections: resolve_redirections(c, ctx),
        })
        .collect()
}
