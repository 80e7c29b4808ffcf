use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

use log::{LevelFilter, warn};

pub const CONFIG_PATH: &str = "lanesync.ini";

static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub const fn as_level_filter(&self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub autoplay: bool,
    pub music_volume: f64,
    /// Zero silences the per-tick hit sound entirely.
    pub hitsound_volume: f64,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autoplay: false,
            music_volume: 0.8,
            hitsound_volume: 0.8,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    fn from_ini(sections: &HashMap<String, HashMap<String, String>>) -> Self {
        let mut config = Self::default();
        let get = |section: &str, key: &str| -> Option<&String> {
            sections.get(section).and_then(|s| s.get(key))
        };

        if let Some(v) = get("Game", "Autoplay") {
            config.autoplay = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Some(v) = get("Audio", "MusicVolume")
            && let Ok(vol) = v.parse::<f64>()
        {
            config.music_volume = vol.clamp(0.0, 1.0);
        }
        if let Some(v) = get("Audio", "HitSoundVolume")
            && let Ok(vol) = v.parse::<f64>()
        {
            config.hitsound_volume = vol.clamp(0.0, 1.0);
        }
        if let Some(v) = get("Debug", "LogLevel") {
            match v.parse::<LogLevel>() {
                Ok(level) => config.log_level = level,
                Err(()) => warn!("Unknown LogLevel {v:?} in config, keeping default"),
            }
        }
        config
    }

    fn to_ini_string(self) -> String {
        format!(
            "[Game]\nAutoplay={}\n\n[Audio]\nMusicVolume={}\nHitSoundVolume={}\n\n[Debug]\nLogLevel={}\n",
            self.autoplay,
            self.music_volume,
            self.hitsound_volume,
            self.log_level.as_str()
        )
    }
}

/// Minimal INI reader: `[Section]` headers, `key=value` pairs, `;`/`#`
/// comments. Unknown sections and keys are retained and simply ignored by
/// `Config::from_ini`.
fn parse_ini(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current = String::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = name.trim().to_string();
            sections.entry(current.clone()).or_default();
        } else if let Some((key, value)) = line.split_once('=') {
            sections
                .entry(current.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    sections
}

/// Loads `lanesync.ini` from the working directory into the global config.
/// A missing or unreadable file leaves the defaults in place.
pub fn load() {
    load_from(Path::new(CONFIG_PATH));
}

pub fn load_from(path: &Path) {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => Config::from_ini(&parse_ini(&content)),
        Err(e) => {
            warn!("Could not read config {}: {e}, using defaults", path.display());
            Config::default()
        }
    };
    *CONFIG.lock().unwrap() = config;
}

pub fn get() -> Config {
    *CONFIG.lock().unwrap()
}

pub fn update(f: impl FnOnce(&mut Config)) {
    f(&mut CONFIG.lock().unwrap());
}

pub fn save() -> std::io::Result<()> {
    save_to(Path::new(CONFIG_PATH))
}

pub fn save_to(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, get().to_ini_string())
}
