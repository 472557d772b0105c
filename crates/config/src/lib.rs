use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "parley.toml",
    "config/parley.toml",
    "crates/config/parley.toml",
    "../parley.toml",
    "../config/parley.toml",
    "../crates/config/parley.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub realtime: RealtimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7080,
        }
    }
}

/// Tunables for the live-sync engine.
///
/// ```
/// use parley_config::RealtimeConfig;
///
/// let realtime = RealtimeConfig::default();
/// assert_eq!(realtime.typing_idle_ms, 3_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// How long a typist may stay quiet before the indicator is retired.
    #[serde(default = "RealtimeConfig::default_typing_idle_ms")]
    pub typing_idle_ms: u64,
}

impl RealtimeConfig {
    const fn default_typing_idle_ms() -> u64 {
        3_000
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            typing_idle_ms: Self::default_typing_idle_ms(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use parley_config::load;
///
/// std::env::remove_var("PARLEY_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let typing_idle = defaults.realtime.typing_idle_ms;
    let typing_idle_i64 = if typing_idle > i64::MAX as u64 {
        i64::MAX
    } else {
        typing_idle as i64
    };

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("realtime.typing_idle_ms", typing_idle_i64)
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("PARLEY").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PARLEY_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
