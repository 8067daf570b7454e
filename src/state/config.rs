//! Configuration management

use crate::speech::Prosody;
use crate::voices::DEFAULT_VOICE_ID;
use crate::{Result, SpeechClipError};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".speechclip.cfg";

/// Persistent studio settings
///
/// Holds the starting voice and slider values, whether playback is
/// recorded, and where downloads go.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.speechclip.cfg)
    path: PathBuf,
}

impl Config {
    /// Load configuration from the home directory, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, writing the defaults there if the
    /// file does not exist yet
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| SpeechClipError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| SpeechClipError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Defaults only, never touching disk
    pub fn in_memory() -> Self {
        Self {
            ini: Self::default_config(),
            path: PathBuf::from(CONFIG_FILE),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| SpeechClipError::Config(format!("Failed to save config: {}", e)))
    }

    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();
        let prosody = Prosody::default();

        ini.with_section(Some("speech"))
            .set("voice", DEFAULT_VOICE_ID)
            .set("rate", prosody.rate().to_string())
            .set("pitch", prosody.pitch().to_string())
            .set("volume", prosody.volume().to_string());

        ini.with_section(Some("capture"))
            .set("enabled", "true")
            .set("waveform_window", "2048")
            .set("waveform_rate_hz", "30");

        ini.with_section(Some("export"))
            .set("label", "voiceover")
            .set("directory", ".");

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    // Studio settings

    /// Persona selected at startup
    pub fn voice_id(&self) -> String {
        self.get_string("speech", "voice", DEFAULT_VOICE_ID)
    }

    /// Starting slider values, clamped into range
    pub fn prosody(&self) -> Prosody {
        let defaults = Prosody::default();
        Prosody::new(
            self.get_float("speech", "rate", defaults.rate()),
            self.get_float("speech", "pitch", defaults.pitch()),
            self.get_float("speech", "volume", defaults.volume()),
        )
    }

    /// Record playback so it can be downloaded
    pub fn capture_enabled(&self) -> bool {
        self.get_bool("capture", "enabled", true)
    }

    /// Samples kept for the live waveform
    pub fn waveform_window(&self) -> usize {
        self.get_int("capture", "waveform_window", 2048)
            .try_into()
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(2048)
    }

    /// Waveform refreshes per second
    pub fn waveform_rate_hz(&self) -> u32 {
        self.get_int("capture", "waveform_rate_hz", 30)
            .try_into()
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(30)
    }

    /// First part of downloaded file names
    pub fn export_label(&self) -> String {
        self.get_string("export", "label", "voiceover")
    }

    /// Where downloads are written
    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(self.get_string("export", "directory", "."))
    }
}
