//! shline: parse shell-like command lines into pipelines.
//!
//! Parses the command given as arguments, or each line of stdin, and prints
//! the result in the configured format:
//!   - tree: indented dump of commands, words, redirections, diagnostics
//!   - json: one JSON object per input line
//!   - argv: expanded argument vectors and resolved redirections
//!   - tokens: the raw lexer stream as a JSON array

use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use shline::config::{self, Config, OutputFormat};
use shline::expand::{
    self, Context, EnvContext, Layered, RedirectTarget, ResolvedRedirection, Value,
};
use shline::logging;
use shline::parse::{self, ParseOutput, RedirectOp};

const USAGE: &str = "\
usage: shline [OPTIONS] [--] [COMMAND...]

Parses COMMAND (joined with spaces), or each line of stdin.

options:
  --config PATH        merge PATH over the defaults instead of ~/.config/shline/config.toml
  --format FORMAT      tree | json | argv | tokens
  --json               same as --format json
  --strict             exit 1 if any line needed parser recovery
  --set NAME=VALUE     define a variable for argv expansion (repeatable)
  --dump-config        print the merged configuration and exit
  -h, --help           print this help";

// ─── Arguments ───────────────────────────────────────

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    format: Option<OutputFormat>,
    strict: bool,
    vars: Vec<(String, String)>,
    dump_config: bool,
    help: bool,
    command: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut out = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                out.config = Some(config::expand_path(&path));
            }
            "--format" => {
                let name = args.next().ok_or("--format needs a value")?;
                let format =
                    OutputFormat::parse(&name).ok_or_else(|| format!("unknown format: {name}"))?;
                out.format = Some(format);
            }
            "--json" => out.format = Some(OutputFormat::Json),
            "--strict" => out.strict = true,
            "--set" => {
                let pair = args.next().ok_or("--set needs NAME=VALUE")?;
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("--set expects NAME=VALUE, got {pair}"))?;
                out.vars.push((name.to_string(), value.to_string()));
            }
            "--dump-config" => out.dump_config = true,
            "-h" | "--help" => out.help = true,
            "--" => {
                out.command.extend(args.by_ref());
                break;
            }
            s if s.starts_with("--") => return Err(format!("unknown option: {s}")),
            _ => {
                out.command.push(arg);
                out.command.extend(args.by_ref());
                break;
            }
        }
    }
    Ok(out)
}

// ─── Rendering ───────────────────────────────────────

fn quote(arg: &str) -> Cow<'_, str> {
    shlex::try_quote(arg).unwrap_or_else(|_| Cow::Owned(format!("{arg:?}")))
}

fn render_redirection(r: &ResolvedRedirection) -> String {
    let fds: Vec<String> = r.fds.iter().map(u32::to_string).collect();
    let fds = fds.join(",");
    match &r.target {
        RedirectTarget::Path(path) if r.op == RedirectOp::Clobber => {
            format!("&> {}", quote(path))
        }
        RedirectTarget::Path(path) => format!("{fds}{} {}", r.op.as_str(), quote(path)),
        RedirectTarget::Fd(Some(target)) => format!("{fds}>&{target}"),
        RedirectTarget::Fd(None) => format!("{fds}>&?"),
    }
}

fn render(
    line: &str,
    output: &ParseOutput,
    format: OutputFormat,
    ctx: &dyn Context,
    out: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Tree => write!(out, "{}", parse::dump_output(output)),
        OutputFormat::Json => {
            let json = serde_json::to_string(output).map_err(io::Error::from)?;
            writeln!(out, "{json}")
        }
        OutputFormat::Argv => {
            for d in &output.diagnostics {
                log::warn!("{line}: {d}");
            }
            for (i, stage) in expand::expand_pipeline(&output.pipeline, ctx)
                .iter()
                .enumerate()
            {
                let argv: Vec<Cow<'_, str>> = stage.argv.iter().map(|a| quote(a)).collect();
                write!(out, "{i}: {}", argv.join(" "))?;
                for r in &stage.redirections {
                    write!(out, " {}", render_redirection(r))?;
                }
                writeln!(out)?;
            }
            Ok(())
        }
        OutputFormat::Tokens => {
            let json = serde_json::to_string(&parse::lex(line)).map_err(io::Error::from)?;
            writeln!(out, "{json}")
        }
    }
}

// ─── Driver ──────────────────────────────────────────

/// Variables for argv expansion: `--set` over `[context.vars]` over the
/// process environment.
fn build_context(config: &Config, overrides: &[(String, String)]) -> Box<dyn Context> {
    let mut vars = config.context.vars.clone();
    for (name, value) in overrides {
        vars.insert(name.clone(), Value::from(value.as_str()));
    }
    if config.context.inherit_env {
        Box::new(Layered::new(vars, EnvContext))
    } else {
        Box::new(vars)
    }
}

/// Parse and render every non-blank line. Returns whether any line
/// produced diagnostics.
fn run(
    lines: impl Iterator<Item = io::Result<String>>,
    format: OutputFormat,
    ctx: &dyn Context,
    out: &mut impl Write,
) -> io::Result<bool> {
    let mut any_diagnostics = false;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let output = parse::parse_with_diagnostics(&line);
        logging::log_parse(&line, &output);
        any_diagnostics |= !output.is_clean();
        render(&line, &output, format, ctx, out)?;
    }
    out.flush()?;
    Ok(any_diagnostics)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("shline: {e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = Config::load(args.config.as_deref());
    logging::init(&config.settings);

    if args.dump_config {
        return match config.to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("shline: cannot render config: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let format = args.format.unwrap_or(config.settings.format);
    let strict = args.strict || config.settings.strict;
    let ctx = build_context(&config, &args.vars);
    let mut out = io::stdout().lock();

    let result = if args.command.is_empty() {
        run(io::stdin().lock().lines(), format, ctx.as_ref(), &mut out)
    } else {
        let line = args.command.join(" ");
        run(std::iter::once(Ok(line)), format, ctx.as_ref(), &mut out)
    };

    match result {
        Ok(true) if strict => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("shline: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ───────────────────────────────────────────
