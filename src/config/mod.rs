//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::util::time::DEFAULT_RENDER_FPS;
use crate::ws::codec::CodecBackend;
use crate::ws::transport::ReconnectPolicy;

const MAX_RENDER_FPS: u32 = 240;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Client configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Relay websocket URL
    pub server_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Preferred MessagePack backend
    pub codec_backend: CodecBackend,
    /// Render and interpolation rate
    pub render_fps: u32,
    /// Integrate peers locally between their updates
    pub peer_dead_reckoning: bool,

    pub reconnect: ReconnectPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            codec_backend: CodecBackend::Native,
            render_fps: DEFAULT_RENDER_FPS,
            peer_dead_reckoning: false,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source; unset keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = lookup("SERVER_URL").unwrap_or(defaults.server_url);
        if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(server_url));
        }

        let render_fps = parse(&lookup, "RENDER_FPS", defaults.render_fps)?;
        if !(1..=MAX_RENDER_FPS).contains(&render_fps) {
            return Err(ConfigError::Invalid {
                var: "RENDER_FPS",
                value: render_fps.to_string(),
            });
        }

        let reconnect = ReconnectPolicy {
            initial_delay: Duration::from_millis(parse(
                &lookup,
                "RECONNECT_INITIAL_MS",
                defaults.reconnect.initial_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse(
                &lookup,
                "RECONNECT_MAX_MS",
                defaults.reconnect.max_delay.as_millis() as u64,
            )?),
            max_attempts: parse(&lookup, "RECONNECT_MAX_ATTEMPTS", defaults.reconnect.max_attempts)?,
        };
        if reconnect.initial_delay.is_zero() {
            return Err(ConfigError::Invalid {
                var: "RECONNECT_INITIAL_MS",
                value: reconnect.initial_delay.as_millis().to_string(),
            });
        }
        if reconnect.max_delay < reconnect.initial_delay {
            return Err(ConfigError::Invalid {
                var: "RECONNECT_MAX_MS",
                value: reconnect.max_delay.as_millis().to_string(),
            });
        }

        Ok(Self {
            server_url,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT", defaults.log_format)?,
            codec_backend: parse(&lookup, "CODEC_BACKEND", defaults.codec_backend)?,
            render_fps,
            peer_dead_reckoning: parse_bool(&lookup, "PEER_DEAD_RECKONING", defaults.peer_dead_reckoning)?,
            reconnect,
        })
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { var, value }),
        },
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Server URL must start with ws:// or wss://, got {0:?}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(load(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = load(&[
            ("SERVER_URL", "wss://relay.example:9000/game"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
            ("CODEC_BACKEND", "fallback"),
            ("RENDER_FPS", "144"),
            ("PEER_DEAD_RECKONING", "yes"),
            ("RECONNECT_INITIAL_MS", "250"),
            ("RECONNECT_MAX_MS", "4000"),
            ("RECONNECT_MAX_ATTEMPTS", "5"),
        ])
        .unwrap();

        assert_eq!(config.server_url, "wss://relay.example:9000/game");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.codec_backend, CodecBackend::Fallback);
        assert_eq!(config.render_fps, 144);
        assert!(config.peer_dead_reckoning);
        assert_eq!(config.reconnect.initial_delay, Duration::from_millis(250));
        assert_eq!(config.reconnect.max_delay, Duration::from_millis(4000));
        assert_eq!(config.reconnect.max_attempts, 5);
    }

    #[test]
    fn rejects_non_websocket_url() {
        assert_eq!(
            load(&[("SERVER_URL", "http://localhost")]),
            Err(ConfigError::InvalidUrl("http://localhost".to_string()))
        );
    }

    #[test]
    fn rejects_out_of_range_fps() {
        for fps in ["0", "241", "sixty"] {
            assert!(matches!(
                load(&[("RENDER_FPS", fps)]),
                Err(ConfigError::Invalid { var: "RENDER_FPS", .. })
            ));
        }
    }

    #[test]
    fn rejects_unknown_enums_and_flags() {
        assert!(load(&[("CODEC_BACKEND", "wasm")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[("PEER_DEAD_RECKONING", "maybe")]).is_err());
    }

    #[test]
    fn rejects_inverted_backoff_bounds() {
        assert_eq!(
            load(&[("RECONNECT_INITIAL_MS", "5000"), ("RECONNECT_MAX_MS", "100")]),
            Err(ConfigError::Invalid { var: "RECONNECT_MAX_MS", value: "100".to_string() })
        );
        assert_eq!(
            load(&[("RECONNECT_INITIAL_MS", "0")]),
            Err(ConfigError::Invalid { var: "RECONNECT_INITIAL_MS", value: "0".to_string() })
        );
    }
}
