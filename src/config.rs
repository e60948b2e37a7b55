use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay, tilde-expanded at load time.
const USER_CONFIG_PATH: &str = "~/.config/deploy-gate/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub tool: ToolConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Branch permitted to deploy when the provider names no branches itself.
    #[serde(default)]
    pub default_branch: String,
}

/// How the deploy tool is reached from the build's shell.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RuntimeConfig {
    /// Version-selector prefix, e.g. `rvm 1.9.3 --fuzzy do ruby -S`.
    #[serde(default)]
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ToolConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub installer: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub terminate_code: i32,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    runtime: RuntimeOverlay,
    #[serde(default)]
    tool: ToolOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RuntimeOverlay {
    selector: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ToolOverlay {
    #[serde(default)]
    replace: bool,
    name: Option<String>,
    installer: Option<String>,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    remove_flags: Vec<String>,
    terminate_code: Option<i32>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/deploy-gate/config.toml (if exists)
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load the user overlay. A missing file is not an error; a broken one is logged.
    fn load_overlay() -> Option<ConfigOverlay> {
        let path = shellexpand::tilde(USER_CONFIG_PATH);
        let content = std::fs::read_to_string(path.as_ref()).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("ignoring {path}: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.settings.default_branch {
            self.settings.default_branch = v;
        }

        if let Some(v) = overlay.runtime.selector {
            self.runtime.selector = v;
        }

        let t = overlay.tool;
        merge_list(&mut self.tool.flags, t.flags, &t.remove_flags, t.replace);
        if let Some(v) = t.name {
            self.tool.name = v;
        }
        if let Some(v) = t.installer {
            self.tool.installer = v;
        }
        if let Some(v) = t.terminate_code {
            self.tool.terminate_code = v;
        }
    }

    /// Render the merged configuration as TOML (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    pub(crate) fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
