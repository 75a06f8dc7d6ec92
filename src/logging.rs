use std::str::FromStr;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::config::{Settings, expand_path};
use crate::parse::ParseOutput;

/// Parse a level name, falling back to `Warn` for anything unrecognized.
pub fn level_from_str(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(LevelFilter::Warn)
}

/// Install the global logger: stderr at the configured level, plus an
/// append-only file sink when `log_file` is set.
/// Best-effort: a file that cannot be opened or a logger that is already
/// installed is silently skipped.
pub fn init(settings: &Settings) {
    let level = level_from_str(&settings.log_level);
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if !settings.log_file.is_empty() {
        let path = expand_path(&settings.log_file);
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            loggers.push(WriteLogger::new(level, config, file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}

/// Record one parsed line at info level.
pub fn log_parse(input: &str, output: &ParseOutput) {
    let input_truncated: String = input.chars().take(200).collect();
    let diagnostics: Vec<String> = output.diagnostics.iter().map(ToString::to_string).collect();
    log::info!(
        "{input}\t{commands} command(s)\t{diagnostics}",
        input = input_truncated,
        commands = output.pipeline.commands.len(),
        diagnostics = if diagnostics.is_empty() {
            "clean".to_string()
        } else {
            diagnostics.join("; ")
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(level_from_str("debug"), LevelFilter::Debug);
        assert_eq!(level_from_str("OFF"), LevelFilter::Off);
        assert_eq!(level_from_str(" info "), LevelFilter::Info);
        assert_eq!(level_from_str("loud"), LevelFilter::Warn);
    }
}
