use crate::domain::models::InteractionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "nearby_accessory".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Parameters of the in-process accessory and ranging engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "default_accessory_name")]
    pub accessory_name: String,
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default = "default_start_distance")]
    pub start_distance_m: f32,
    #[serde(default = "default_end_distance")]
    pub end_distance_m: f32,
    /// Time to walk from start to end distance
    #[serde(default = "default_approach_seconds")]
    pub approach_seconds: f32,
    /// Zero runs until Ctrl-C
    #[serde(default = "default_run_seconds")]
    pub run_seconds: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            accessory_name: default_accessory_name(),
            update_interval_ms: default_update_interval_ms(),
            start_distance_m: default_start_distance(),
            end_distance_m: default_end_distance(),
            approach_seconds: default_approach_seconds(),
            run_seconds: default_run_seconds(),
        }
    }
}

fn default_accessory_name() -> String {
    "DWM3001CDK".to_string()
}
fn default_update_interval_ms() -> u64 {
    100
}
fn default_start_distance() -> f32 {
    6.0
}
fn default_end_distance() -> f32 {
    0.5
}
fn default_approach_seconds() -> f32 {
    15.0
}
fn default_run_seconds() -> u64 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub feedback_enabled: bool,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
    #[serde(default = "default_tick_interval_ms")]
    pub feedback_tick_interval_ms: u64,
    #[serde(default = "default_true")]
    pub feedback_sound_enabled: bool,
    #[serde(default = "default_true")]
    pub feedback_haptics_enabled: bool,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feedback_enabled: true,
            interaction_mode: InteractionMode::default(),
            feedback_tick_interval_ms: default_tick_interval_ms(),
            feedback_sound_enabled: true,
            feedback_haptics_enabled: true,
            log_settings: LogSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    crate::domain::feedback::TICK_PERIOD.as_millis() as u64
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::from_path(settings_path))
    }

    /// Load from `path`, falling back to defaults when it is missing or malformed
    pub fn from_path(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(
                    "Using default settings ({}): {}",
                    settings_path.display(),
                    e
                );
                Settings::default()
            }
        };

        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("NearbyAccessory");
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.settings_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.settings_path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
