//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::CalloutType;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".booknotes/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    callout: Option<CalloutType>,
}

impl Defaults {
    pub fn callout(&self) -> CalloutType {
        self.callout.unwrap_or_default()
    }
}

/// Unset fields fall back to the accessor defaults, so an omitted section never masks an earlier layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Export {
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    fallback_name: Option<String>,
    #[serde(default)]
    copy_to_clipboard: Option<bool>,
}

impl Export {
    fn default_suffix() -> &'static str {
        "-converted"
    }

    fn default_fallback_name() -> &'static str {
        "converted-notes.md"
    }

    pub fn suffix(&self) -> String {
        self.suffix
            .clone()
            .unwrap_or_else(|| Self::default_suffix().to_owned())
    }

    pub fn fallback_name(&self) -> String {
        self.fallback_name
            .clone()
            .unwrap_or_else(|| Self::default_fallback_name().to_owned())
    }

    pub fn copy_to_clipboard(&self) -> bool {
        self.copy_to_clipboard.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Progress {
    #[serde(default)]
    embed: Option<bool>,
    #[serde(default)]
    restore: Option<bool>,
}

impl Progress {
    pub fn embed(&self) -> bool {
        self.embed.unwrap_or(true)
    }

    pub fn restore(&self) -> bool {
        self.restore.unwrap_or(true)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    callout: Option<String>,
    copy_to_clipboard: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            callout: env::var("BOOKNOTES_CALLOUT").ok(),
            copy_to_clipboard: env::var("BOOKNOTES_COPY").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(callout: &str, copy: &str) -> Self {
        Self {
            callout: Some(callout.to_owned()),
            copy_to_clipboard: Some(copy.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_toml(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            export: merge_export(self.export, other.export),
            progress: merge_progress(self.progress, other.progress),
        }
    }
}

fn merge_defaults(mut base: Defaults, overlay: Defaults) -> Defaults {
    if let Some(value) = overlay.callout {
        base.callout = Some(value);
    }
    base
}

fn merge_export(mut base: Export, overlay: Export) -> Export {
    if let Some(value) = overlay.suffix {
        base.suffix = Some(value);
    }
    if let Some(value) = overlay.fallback_name {
        base.fallback_name = Some(value);
    }
    if let Some(value) = overlay.copy_to_clipboard {
        base.copy_to_clipboard = Some(value);
    }
    base
}

fn merge_progress(mut base: Progress, overlay: Progress) -> Progress {
    if let Some(value) = overlay.embed {
        base.embed = Some(value);
    }
    if let Some(value) = overlay.restore {
        base.restore = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("booknotes/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(callout) = env.callout {
        match callout.parse::<CalloutType>() {
            Ok(parsed) => config.defaults.callout = Some(parsed),
            Err(err) => tracing::warn!(%err, "ignoring BOOKNOTES_CALLOUT"),
        }
    }
    if let Some(copy) = env.copy_to_clipboard {
        let enabled = matches!(
            copy.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
        config.export.copy_to_clipboard = Some(enabled);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.defaults.callout(), CalloutType::Note);
        assert_eq!(config.export.suffix(), "-converted");
        assert_eq!(config.export.fallback_name(), "converted-notes.md");
        assert!(!config.export.copy_to_clipboard());
        assert!(config.progress.embed());
        assert!(config.progress.restore());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[defaults]
callout = "tip"
[export]
suffix = "-callouts"
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".booknotes"))?;
        fs::write(
            workspace_dir.join(".booknotes/config.toml"),
            r#"
[progress]
embed = false
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".booknotes/config.toml")),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.defaults.callout(), CalloutType::Tip);
        assert_eq!(config.export.suffix(), "-callouts");
        assert_eq!(config.export.fallback_name(), "converted-notes.md");
        assert!(!config.progress.embed());
        assert!(config.progress.restore());

        Ok(())
    }

    #[test]
    fn later_layer_can_restore_builtin_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(
            &global,
            r#"
[defaults]
callout = "tip"
[progress]
restore = false
"#,
        )?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(
            &workspace,
            r#"
[defaults]
callout = "note"
"#,
        )?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.defaults.callout(), CalloutType::Note);
        assert!(!config.progress.restore());
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("warning", "true");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.defaults.callout(), CalloutType::Warning);
        assert!(config.export.copy_to_clipboard());
        Ok(())
    }

    #[test]
    fn unknown_env_callout_is_ignored() -> Result<()> {
        let overrides = EnvOverrides::for_tests("sparkles", "0");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.defaults.callout(), CalloutType::Note);
        assert!(!config.export.copy_to_clipboard());
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn repo_root_is_found_from_nested_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested)?;
        fs::create_dir_all(temp.path().join(".git"))?;
        assert_eq!(find_repo_root(&nested), Some(temp.path().to_path_buf()));
        Ok(())
    }
}
