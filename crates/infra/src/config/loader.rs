//! Configuration loader.
//!
//! Precedence: environment variables override values from a config file,
//! which overrides built-in defaults. A missing file is not an error.
//!
//! ## Environment variables
//! - `MENTORBOOK_DB_PATH`, `MENTORBOOK_DB_POOL_SIZE`
//! - `MENTORBOOK_BIND_ADDR`
//! - `MENTORBOOK_SCHEDULING_URL`, `MENTORBOOK_SCHEDULING_API_KEY`,
//!   `MENTORBOOK_SCHEDULING_ENABLED`, `MENTORBOOK_SCHEDULING_TIMEOUT_SECS`
//! - `MENTORBOOK_PAYMENT_URL`, `MENTORBOOK_PAYMENT_API_KEY`,
//!   `MENTORBOOK_PAYMENT_CURRENCY`
//! - `MENTORBOOK_MIN_LEAD_TIME_MINUTES`,
//!   `MENTORBOOK_ACCEPTANCE_WINDOW_MINUTES`,
//!   `MENTORBOOK_REQUIRE_ACCEPTANCE`
//!
//! ## File locations
//! `./config.toml`, then `./mentorbook.toml`, then the same two names next
//! to the executable.

use std::path::{Path, PathBuf};

use mentorbook_domain::{BookingError, Config, Result};
use tracing::{debug, info};

pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(&path)?,
        None => {
            debug!("no config file found, starting from defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

pub fn load_from_file(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "loading configuration file");
    let contents = std::fs::read_to_string(path)
        .map_err(|e| BookingError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&contents)
        .map_err(|e| BookingError::Config(format!("invalid TOML in {}: {e}", path.display())))
}

fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config.toml"));
        candidates.push(cwd.join("mentorbook.toml"));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("config.toml"));
            candidates.push(dir.join("mentorbook.toml"));
        }
    }
    candidates.into_iter().find(|path| path.exists())
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(path) = env_opt("MENTORBOOK_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_parse::<u32>("MENTORBOOK_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(addr) = env_opt("MENTORBOOK_BIND_ADDR") {
        config.server.bind_addr = addr;
    }

    if let Some(url) = env_opt("MENTORBOOK_SCHEDULING_URL") {
        config.scheduling.base_url = url;
    }
    if let Some(key) = env_opt("MENTORBOOK_SCHEDULING_API_KEY") {
        config.scheduling.api_key = Some(key);
    }
    if let Some(enabled) = env_bool("MENTORBOOK_SCHEDULING_ENABLED") {
        config.scheduling.enabled = enabled;
    }
    if let Some(timeout) = env_parse::<u64>("MENTORBOOK_SCHEDULING_TIMEOUT_SECS")? {
        config.scheduling.timeout_secs = timeout;
    }

    if let Some(url) = env_opt("MENTORBOOK_PAYMENT_URL") {
        config.payment.base_url = url;
    }
    if let Some(key) = env_opt("MENTORBOOK_PAYMENT_API_KEY") {
        config.payment.api_key = Some(key);
    }
    if let Some(currency) = env_opt("MENTORBOOK_PAYMENT_CURRENCY") {
        config.payment.currency = currency;
    }

    if let Some(minutes) = env_parse::<i64>("MENTORBOOK_MIN_LEAD_TIME_MINUTES")? {
        config.booking.min_lead_time_minutes = minutes;
    }
    if let Some(minutes) = env_parse::<i64>("MENTORBOOK_ACCEPTANCE_WINDOW_MINUTES")? {
        config.booking.acceptance_window_minutes = minutes;
    }
    if let Some(required) = env_bool("MENTORBOOK_REQUIRE_ACCEPTANCE") {
        config.booking.require_mentor_acceptance = required;
    }

    Ok(())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| BookingError::Config(format!("invalid {key}={value}: {e}"))),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`, case-insensitive.
fn env_bool(key: &str) -> Option<bool> {
    env_opt(key)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn toml_file_round_trips() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[database]
path = "/tmp/mb.db"
pool_size = 4

[server]
bind_addr = "0.0.0.0:9000"

[scheduling]
base_url = "https://sched.example/v1"
enabled = true
timeout_secs = 5

[payment]
base_url = "https://pay.example"
currency = "eur"

[booking]
min_lead_time_minutes = 60
acceptance_window_minutes = 720
require_mentor_acceptance = false
"#
        )
        .unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.database.path, "/tmp/mb.db");
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert!(config.scheduling.enabled);
        assert_eq!(config.payment.currency, "eur");
        assert_eq!(config.booking.min_lead_time_minutes, 60);
        assert!(!config.booking.require_mentor_acceptance);
    }

    #[test]
    fn partial_toml_layers_over_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[database]
path = "/tmp/partial.db"
"#
        )
        .unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.database.path, "/tmp/partial.db");

        // Everything the file does not mention keeps its default.
        let defaults = Config::default();
        assert_eq!(config.database.pool_size, defaults.database.pool_size);
        assert_eq!(config.server.bind_addr, defaults.server.bind_addr);
        assert_eq!(config.payment.currency, defaults.payment.currency);
        assert_eq!(
            config.booking.min_lead_time_minutes,
            defaults.booking.min_lead_time_minutes
        );
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(file, "not [valid toml").unwrap();
        let err = load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("MENTORBOOK_DB_PATH", "/var/db/mb.db");
        std::env::set_var("MENTORBOOK_SCHEDULING_ENABLED", "yes");
        std::env::set_var("MENTORBOOK_DB_POOL_SIZE", "2");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.database.path, "/var/db/mb.db");
        assert!(config.scheduling.enabled);
        assert_eq!(config.database.pool_size, 2);

        std::env::remove_var("MENTORBOOK_DB_PATH");
        std::env::remove_var("MENTORBOOK_SCHEDULING_ENABLED");
        std::env::remove_var("MENTORBOOK_DB_POOL_SIZE");
    }

    #[test]
    fn malformed_numeric_env_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("MENTORBOOK_DB_POOL_SIZE", "many");
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));

        std::env::remove_var("MENTORBOOK_DB_POOL_SIZE");
    }
}
