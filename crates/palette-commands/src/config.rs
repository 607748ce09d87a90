//! Palette settings and their loader

use palette_hotkeys::{parse_modifiers, HotkeyDisplay, KeyCombo, Platform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::category::{CategoryRegistry, DEFAULT_CATEGORY};
use crate::error::{CommandError, Result};
use crate::namespace::NamespaceRegistry;
use crate::session::{DEFAULT_EMPTY_MESSAGE, DEFAULT_PLACEHOLDER};
use crate::types::NamespaceConfig;

/// Which modifier conventions to display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSetting {
    /// Detect from the build target
    #[default]
    Auto,
    Mac,
    Other,
}

impl PlatformSetting {
    pub fn resolve(&self) -> Platform {
        match self {
            PlatformSetting::Auto => Platform::detect(),
            PlatformSetting::Mac => Platform::Mac,
            PlatformSetting::Other => Platform::Other,
        }
    }
}

/// A namespace marker and its setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSetting {
    pub marker: String,
    #[serde(flatten)]
    pub config: NamespaceConfig,
}

/// Command palette settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteSettings {
    /// Global hotkey opening the main palette
    pub palette_hotkey: String,
    /// Modifier(s) that trigger overlay hotkeys, e.g. `"alt"` or `"alt+control"`
    pub overlay_modifier: String,
    pub platform: PlatformSetting,
    pub placeholder: String,
    pub empty_message: String,
    /// Category ids in display order
    pub categories: Vec<String>,
    pub namespaces: Vec<NamespaceSetting>,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            palette_hotkey: "control+k".to_string(),
            overlay_modifier: "alt".to_string(),
            platform: PlatformSetting::Auto,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            categories: vec![DEFAULT_CATEGORY.to_string()],
            namespaces: Vec::new(),
        }
    }
}

impl PaletteSettings {
    pub fn with_platform(mut self, platform: PlatformSetting) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_overlay_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.overlay_modifier = modifier.into();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_namespace(mut self, marker: impl Into<String>, config: NamespaceConfig) -> Self {
        self.namespaces.push(NamespaceSetting {
            marker: marker.into(),
            config,
        });
        self
    }

    pub fn palette_combo(&self) -> Result<KeyCombo> {
        Ok(self.palette_hotkey.parse()?)
    }

    pub fn display(&self) -> Result<HotkeyDisplay> {
        let overlay = parse_modifiers(&self.overlay_modifier)?;
        Ok(HotkeyDisplay::new(self.platform.resolve(), overlay))
    }

    pub fn category_registry(&self) -> CategoryRegistry {
        CategoryRegistry::with_categories(self.categories.iter().cloned())
    }

    pub fn namespace_registry(&self) -> NamespaceRegistry {
        let mut registry = NamespaceRegistry::new();
        for setting in &self.namespaces {
            registry.add(setting.marker.clone(), setting.config.clone());
        }
        registry
    }

    /// Check every field that must parse
    pub fn validate(&self) -> Result<()> {
        self.palette_combo()?;
        self.display()?;
        if let Some(empty) = self.namespaces.iter().find(|n| n.marker.is_empty()) {
            return Err(CommandError::Config(format!(
                "Namespace marker cannot be empty (name: {:?})",
                empty.config.name
            )));
        }
        Ok(())
    }
}

/// Reads and writes [`PaletteSettings`] files
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<PaletteSettings> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| CommandError::Config(format!("Failed to read settings file: {}", e)))?;
        let settings: PaletteSettings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        info!(path = %path.as_ref().display(), "Palette settings loaded");
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<PaletteSettings> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| CommandError::Config(format!("Failed to read settings file: {}", e)))?;
        let settings: PaletteSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        info!(path = %path.as_ref().display(), "Palette settings loaded");
        Ok(settings)
    }

    /// Load settings from a file (auto-detect format)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<PaletteSettings> {
        let path = path.as_ref();
        match extension(path) {
            "yaml" | "yml" => Self::load_from_yaml(path),
            "json" => Self::load_from_json(path),
            _ => Err(unsupported()),
        }
    }

    pub fn save_to_yaml<P: AsRef<Path>>(settings: &PaletteSettings, path: P) -> Result<()> {
        let content = serde_yaml::to_string(settings)?;
        fs::write(path, content)
            .map_err(|e| CommandError::Config(format!("Failed to write settings file: {}", e)))?;
        Ok(())
    }

    pub fn save_to_json<P: AsRef<Path>>(settings: &PaletteSettings, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)
            .map_err(|e| CommandError::Config(format!("Failed to write settings file: {}", e)))?;
        Ok(())
    }

    /// Save settings to a file (auto-detect format)
    pub fn save_to_file<P: AsRef<Path>>(settings: &PaletteSettings, path: P) -> Result<()> {
        let path = path.as_ref();
        match extension(path) {
            "yaml" | "yml" => Self::save_to_yaml(settings, path),
            "json" => Self::save_to_json(settings, path),
            _ => Err(unsupported()),
        }
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

fn unsupported() -> CommandError {
    CommandError::Config("Unsupported file format. Use .yaml, .yml, or .json".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> PaletteSettings {
        PaletteSettings::default()
            .with_platform(PlatformSetting::Mac)
            .with_overlay_modifier("alt+control")
            .with_categories(["app", "actions"])
            .with_namespace("@", NamespaceConfig::named("Users"))
            .with_namespace("#", NamespaceConfig::default().with_empty_message("No tag"))
    }

    #[test]
    fn test_save_and_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.yaml");
        SettingsLoader::save_to_file(&sample(), &path).unwrap();
        assert_eq!(SettingsLoader::load_from_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        SettingsLoader::save_to_file(&sample(), &path).unwrap();
        assert_eq!(SettingsLoader::load_from_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.toml");
        assert!(matches!(
            SettingsLoader::save_to_file(&sample(), &path),
            Err(CommandError::Config(_))
        ));
        assert!(matches!(
            SettingsLoader::load_from_file(&path),
            Err(CommandError::Config(_))
        ));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: PaletteSettings = serde_yaml::from_str(
            "platform: other\nnamespaces:\n  - marker: \"@\"\n    name: Users\n",
        )
        .unwrap();
        assert_eq!(settings.palette_hotkey, "control+k");
        assert_eq!(settings.placeholder, DEFAULT_PLACEHOLDER);
        assert_eq!(settings.namespaces[0].config, NamespaceConfig::named("Users"));
        assert_eq!(settings.display().unwrap().platform(), Platform::Other);
    }

    #[test]
    fn test_derived_registries() {
        let settings = sample();
        let ids: Vec<String> = settings
            .category_registry()
            .categories()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, vec!["app", "actions", "default"]);
        assert_eq!(
            settings.namespace_registry().footer_text().as_deref(),
            Some("TIP — search for @Users")
        );
    }

    #[test]
    fn test_invalid_hotkey_fails_validation() {
        let settings = PaletteSettings {
            palette_hotkey: "hyper+k".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(CommandError::Hotkey(_))));
    }
}
