//! Deterministic human-readable dump of a parsed pipeline.

use std::fmt::{self, Write};

use super::types::{Element, ParseOutput, Part, Pipeline, RedirectOp, Redirection, Word};

fn write_word(out: &mut String, word: &Word) {
    if word.parts.is_empty() {
        out.push_str("\"\"");
        return;
    }
    for (i, part) in word.parts.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match part {
            Part::Text(t) => {
                let _ = write!(out, "{:?}", t.value);
            }
            Part::Var(v) if v.braced => {
                let _ = write!(out, "${{{}}}", v.name);
            }
            Part::Var(v) => {
                let _ = write!(out, "${}", v.name);
            }
        }
    }
}

fn write_redirection(out: &mut String, r: &Redirection) {
    let fds: Vec<String> = r.source_fds().iter().map(u32::to_string).collect();
    let _ = write!(out, "redirect {}: fd={} {}", r.span, fds.join(","), r.op.as_str());
    match r.op {
        RedirectOp::Dup => match r.dup_target_fd {
            Some(fd) => {
                let _ = write!(out, " {fd}");
            }
            None => out.push_str(" <missing>"),
        },
        RedirectOp::Input | RedirectOp::Output | RedirectOp::Append | RedirectOp::Clobber => {
            out.push(' ');
            write_word(out, &r.target);
        }
    }
}

/// Render `pipeline` one element per line, words and redirections in
/// source order.
pub fn dump(pipeline: &Pipeline) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "pipeline {} ({} command{})",
        pipeline.span,
        pipeline.commands.len(),
        if pipeline.commands.len() == 1 { "" } else { "s" }
    );
    for (i, command) in pipeline.commands.iter().enumerate() {
        let _ = writeln!(out, "  command {i} {}", command.span);
        for element in command.elements() {
            out.push_str("    ");
            match element {
                Element::Word(w) => {
                    let _ = write!(out, "word {}: ", w.span);
                    write_word(&mut out, w);
                }
                Element::Redirection(r) => write_redirection(&mut out, r),
            }
            out.push('\n');
        }
    }
    out
}

/// [`dump`] followed by one line per diagnostic.
pub fn dump_output(output: &ParseOutput) -> String {
    let mut out = dump(&output.pipeline);
    for d in &output.diagnostics {
        let _ = writeln!(out, "  diagnostic {}: {}", d.span, d.kind.message());
    }
    out
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dump(self))
    }
}
