use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FFMPEG, DEFAULT_FRAMERATE, DEFAULT_VIDEO_PRESET};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub recording: RecordingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordingConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_encoder")]
    pub encoder: String,
    /// Free-text device target matched against the catalog; empty means
    /// auto-pick a virtual/loopback device.
    #[serde(default)]
    pub audio_device: Option<String>,
    #[serde(default)]
    pub monitor_index: u32,
    #[serde(default)]
    pub audio_delay_ms: i64,
    #[serde(default)]
    pub video_delay_ms: i64,
    /// "none" or "resample".
    #[serde(default = "default_sync_filter")]
    pub sync_filter: String,
}

fn default_ffmpeg_path() -> String {
    DEFAULT_FFMPEG.to_string()
}

fn default_output_dir() -> String {
    if let Some(mut path) = dirs::video_dir().or_else(dirs::home_dir) {
        path.push("recordings");
        return path.to_string_lossy().to_string();
    }
    "recordings".to_string()
}

fn default_framerate() -> u32 {
    DEFAULT_FRAMERATE
}

fn default_preset() -> String {
    DEFAULT_VIDEO_PRESET.to_string()
}

fn default_encoder() -> String {
    "libx264".to_string()
}

fn default_sync_filter() -> String {
    "none".to_string()
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            output_dir: default_output_dir(),
            framerate: default_framerate(),
            preset: default_preset(),
            encoder: default_encoder(),
            audio_device: None,
            monitor_index: 0,
            audio_delay_ms: 0,
            video_delay_ms: 0,
            sync_filter: default_sync_filter(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { recording: RecordingConfig::default() }
    }
}

impl AppConfig {
    /// Loads the config file, falling back to defaults (and writing them out
    /// so the user has a file to edit) when it is missing or unparsable.
    pub fn load() -> Self {
        let config_path = get_config_path();

        if let Some(path) = &config_path {
            if path.exists() {
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => log::error!("failed to parse config file: {e}"),
                    },
                    Err(e) => log::error!("failed to read config file: {e}"),
                }
            }
        }

        let default_config = Self::default();
        if let Some(path) = &config_path {
            let _ = default_config.save_to_path(path);
        }
        default_config
    }

    pub fn save(&self) -> Result<(), String> {
        let config_path = get_config_path().ok_or("could not resolve config path")?;
        self.save_to_path(&config_path)
    }

    fn save_to_path(&self, path: &PathBuf) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(path, content).map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("segrec").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.recording.framerate, 30);
        assert_eq!(config.recording.preset, "veryfast");
        assert_eq!(config.recording.encoder, "libx264");
        assert_eq!(config.recording.audio_device, None);
        assert_eq!(config.recording.audio_delay_ms, 0);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config.recording.framerate, deserialized.recording.framerate);
        assert_eq!(config.recording.output_dir, deserialized.recording.output_dir);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let config: AppConfig = toml::from_str("[recording]\nframerate = 60\n").unwrap();
        assert_eq!(config.recording.framerate, 60);
        assert_eq!(config.recording.preset, "veryfast");
        assert_eq!(config.recording.sync_filter, "none");
    }
}
