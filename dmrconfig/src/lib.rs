//! # DMRInfo Configuration Module
//!
//! This module provides configuration management for DMRInfo:
//! - Embedded default configuration
//! - Optional `config.yaml` merged over the defaults
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//!
//! The configuration is read-only on disk: setters only change the loaded
//! values (command line overrides), nothing is ever written back.
//!
//! ## Usage
//!
//! ```no_run
//! use dmrconfig::Config;
//!
//! let config = Config::load_config("")?;
//! let window = config.get_discovery_window();
//! config.set_keep_going(true);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("dmrinfo.yaml");

const CONFIG_FILE: &str = "config.yaml";
const CONFIG_DIR_NAME: &str = ".dmrinfo";

const ENV_CONFIG_DIR: &str = "DMRINFO_CONFIG";
const ENV_PREFIX: &str = "DMRINFO_CONFIG__";

// Default values for configuration
const DEFAULT_WINDOW_SECS: u64 = 2;
const DEFAULT_DESCRIPTION_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SOAP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_KEEP_GOING: bool = false;
const DEFAULT_PRETTY_PRINT: bool = false;

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse::<u64>().unwrap_or_else(|_| {
                    warn!(
                        "Invalid value '{}' for {}, using default {}",
                        s,
                        $path.join("."),
                        $default
                    );
                    $default
                }),
                Ok(other) => {
                    warn!(
                        "Invalid value {:?} for {}, using default {}",
                        other,
                        $path.join("."),
                        $default
                    );
                    $default
                }
                Err(_) => $default,
            }
        }

        pub fn $setter(&self, value: u64) {
            self.set_value($path, Value::Number(Number::from(value)));
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) {
            self.set_value($path, Value::Bool(value));
        }
    };
}

/// Configuration manager for DMRInfo
#[derive(Debug)]
pub struct Config {
    config_dir: Option<String>,
    path: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `DMRINFO_CONFIG` environment variable
    /// 3. `.dmrinfo` in the current directory
    /// 4. `.dmrinfo` in the user's home directory
    fn find_config_dir(directory: &str) -> Option<String> {
        if !directory.is_empty() {
            return Some(directory.to_string());
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return Some(env_path);
        }

        if Path::new(CONFIG_DIR_NAME).is_dir() {
            return Some(CONFIG_DIR_NAME.to_string());
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.is_dir() {
                return Some(home_config.to_string_lossy().to_string());
            }
        }

        None
    }

    /// Loads the configuration
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    ///
    /// An explicit `directory` that does not exist is an error; a directory
    /// found by the search without a `config.yaml` is not.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);

        if let Some(dir) = &config_dir {
            if !Path::new(dir).is_dir() {
                bail!("Configuration directory {} does not exist", dir);
            }
            info!(config_dir=%dir, "Using config directory");
        }

        let path = config_dir
            .as_ref()
            .map(|dir| Path::new(dir).join(CONFIG_FILE))
            .filter(|p| p.is_file());

        let external = match &path {
            Some(p) => {
                info!(config_file=%p.display(), "Loaded config file");
                Some(
                    fs::read_to_string(p)
                        .with_context(|| format!("Cannot read {}", p.display()))?,
                )
            }
            None => {
                info!("Config file not found, using default embedded config");
                None
            }
        };

        let mut config = Self::from_yaml(external.as_deref(), env::vars())?;
        config.config_dir = config_dir;
        config.path = path;
        Ok(config)
    }

    /// Builds a configuration from an optional YAML document merged over the
    /// embedded defaults, then applies `DMRINFO_CONFIG__*` overrides taken
    /// from `vars`.
    pub fn from_yaml<I>(external: Option<&str>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(yaml) = external {
            let external_value: Value =
                serde_yaml::from_str(yaml).context("Invalid configuration YAML")?;
            // An empty file parses as null
            if !external_value.is_null() {
                let external_value = Self::lower_keys_value(external_value);
                default_value = Self::lower_keys_value(default_value);
                merge_yaml(&mut default_value, &external_value);
            }
        }

        let mut config_value = Self::lower_keys_value(default_value);
        Self::apply_env_overrides(&mut config_value, vars);

        Ok(Config {
            config_dir: None,
            path: None,
            data: Mutex::new(config_value),
        })
    }

    /// Directory the configuration was searched in, if any
    pub fn config_dir(&self) -> Option<&str> {
        self.config_dir.as_deref()
    }

    /// The `config.yaml` that was merged, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["discovery", "window_secs"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) {
        let mut data = self.data();
        if let Err(err) = Self::set_value_internal(&mut data, path, value) {
            warn!("Cannot set {}: {}", path.join("."), err);
        }
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                if let Some(next) = map.get(&Value::String(key.to_lowercase())) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                info!(variable=%key, "Configuration override from environment");
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!("Ignoring {}: {}", key, err);
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_u64_config!(
        get_discovery_window_secs,
        set_discovery_window_secs,
        &["discovery", "window_secs"],
        DEFAULT_WINDOW_SECS
    );

    impl_u64_config!(
        get_description_timeout_secs,
        set_description_timeout_secs,
        &["http", "description_timeout_secs"],
        DEFAULT_DESCRIPTION_TIMEOUT_SECS
    );

    impl_u64_config!(
        get_soap_timeout_secs,
        set_soap_timeout_secs,
        &["http", "soap_timeout_secs"],
        DEFAULT_SOAP_TIMEOUT_SECS
    );

    impl_bool_config!(
        get_keep_going,
        set_keep_going,
        &["report", "keep_going"],
        DEFAULT_KEEP_GOING
    );

    impl_bool_config!(
        get_pretty_print,
        set_pretty_print,
        &["report", "pretty_print"],
        DEFAULT_PRETTY_PRINT
    );

    /// SSDP discovery window
    pub fn get_discovery_window(&self) -> Duration {
        Duration::from_secs(self.get_discovery_window_secs())
    }

    /// Timeout of the description GET
    pub fn get_description_timeout(&self) -> Duration {
        Duration::from_secs(self.get_description_timeout_secs())
    }

    /// Timeout of each SOAP POST
    pub fn get_soap_timeout(&self) -> Duration {
        Duration::from_secs(self.get_soap_timeout_secs())
    }
}

fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}
