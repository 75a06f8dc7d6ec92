use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::expand::Value;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay when `--config` is not given.
pub const USER_CONFIG_PATH: &str = "~/.config/shline/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub context: ContextConfig,
}

/// How the CLI renders each parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented pretty dump.
    #[default]
    Tree,
    /// One JSON object per line.
    Json,
    /// Expanded argv and resolved redirections per command.
    Argv,
    /// Raw lexer tokens as a JSON array.
    Tokens,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(Self::Tree),
            "json" => Some(Self::Json),
            "argv" => Some(Self::Argv),
            "tokens" => Some(Self::Tokens),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Empty disables the file sink.
    #[serde(default)]
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            strict: false,
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

/// Variables available to expansion.
#[derive(Debug, Deserialize, Serialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub inherit_env: bool,
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            inherit_env: true,
            vars: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    context: ContextOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    format: Option<OutputFormat>,
    strict: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ContextOverlay {
    #[serde(default)]
    replace: bool,
    inherit_env: Option<bool>,
    #[serde(default)]
    vars: BTreeMap<String, Value>,
    #[serde(default)]
    remove_vars: Vec<String>,
}

// ── Merge logic ──

/// Merge user variables into the defaults.
/// In replace mode: user map replaces defaults entirely.
/// In merge mode: remove names first, then insert additions (user wins).
fn merge_vars(
    base: &mut BTreeMap<String, Value>,
    add: BTreeMap<String, Value>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
    } else {
        base.retain(|name, _| !remove.contains(name));
        base.extend(add);
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or at [`USER_CONFIG_PATH`] when `None`
    ///
    /// A missing overlay file is not an error. A malformed one is reported on
    /// stderr and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default_config();
        let path = path.map_or_else(user_config_path, Path::to_path_buf);
        if let Some(overlay) = Self::load_overlay(&path) {
            config.apply_overlay(overlay);
        }
        config
    }

    fn load_overlay(path: &Path) -> Option<ConfigOverlay> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("shline: config parse error in {}: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.format {
            self.settings.format = v;
        }
        if let Some(v) = s.strict {
            self.settings.strict = v;
        }
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }
        if let Some(v) = s.log_file {
            self.settings.log_file = v;
        }

        // Context
        let c = overlay.context;
        if let Some(v) = c.inherit_env {
            self.context.inherit_env = v;
        }
        merge_vars(&mut self.context.vars, c.vars, &c.remove_vars, c.replace);
    }

    /// Render the merged configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

/// Tilde-expand a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn user_config_path() -> PathBuf {
    expand_path(USER_CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.settings.format, OutputFormat::Tree);
        assert!(!config.settings.strict);
        assert_eq!(config.settings.log_level, "warn");
        assert!(config.settings.log_file.is_empty());
        assert!(config.context.inherit_env);
        assert!(config.context.vars.is_empty());
    }

    #[test]
    fn output_format_names() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("tokens"), Some(OutputFormat::Tokens));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_overrides_settings() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            format = "argv"
            strict = true
        "#,
        );
        assert_eq!(config.settings.format, OutputFormat::Argv);
        assert!(config.settings.strict);
        // Untouched scalars keep defaults
        assert_eq!(config.settings.log_level, "warn");
    }

    #[test]
    fn overlay_extends_vars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [context.vars]
            PREFIX = "/opt"
            JOBS = 4
        "#,
        );
        assert_eq!(config.context.vars["PREFIX"], Value::Str("/opt".into()));
        assert_eq!(config.context.vars["JOBS"], Value::Int(4));
    }

    #[test]
    fn overlay_removes_vars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [context.vars]
            A = "1"
            B = "2"
        "#,
        );
        config.apply_overlay_str(
            r#"
            [context]
            remove_vars = ["A"]
        "#,
        );
        assert!(!config.context.vars.contains_key("A"));
        assert!(config.context.vars.contains_key("B"));
    }

    #[test]
    fn overlay_replace_vars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [context.vars]
            A = "1"
        "#,
        );
        config.apply_overlay_str(
            r#"
            [context]
            replace = true
            [context.vars]
            B = "2"
        "#,
        );
        assert_eq!(config.context.vars.len(), 1);
        assert!(config.context.vars.contains_key("B"));
    }

    #[test]
    fn overlay_disables_env() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [context]
            inherit_env = false
        "#,
        );
        assert!(!config.context.inherit_env);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.settings.format, OutputFormat::Tree);
        assert!(config.context.inherit_env);
        assert!(config.context.vars.is_empty());
    }

    #[test]
    fn missing_overlay_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/shline/config.toml")));
        assert_eq!(config.settings.format, OutputFormat::Tree);
    }

    #[test]
    fn dumped_config_round_trips() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [context.vars]
            NAME = "x"
        "#,
        );
        let text = config.to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.context.vars["NAME"], Value::Str("x".into()));
    }

    #[test]
    fn plain_path_is_not_rewritten() {
        assert_eq!(expand_path("/etc/shline.toml"), PathBuf::from("/etc/shline.toml"));
    }
}
