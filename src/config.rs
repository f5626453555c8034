use json_comments::StripComments;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use tracing::{info, warn};

pub const SERVER_CONFIG_JSON: &str = "./server_config.json";
pub const SERVER_CONFIG_TOML: &str = "./server_config.toml";

/// Reads a config file as toml, or as json with comments. `path` wins over
/// `defaults`; the first default that opens is used. Any failure falls back
/// to `T::default()`.
pub fn load_config<T>(path: Option<&str>, defaults: &[&str]) -> T
where
    T: DeserializeOwned + Default,
{
    let opened = match path {
        Some(path) => File::open(path).ok().map(|file| (path, file)),
        None => defaults
            .iter()
            .find_map(|path| File::open(path).ok().map(|file| (*path, file))),
    };
    let Some((config_path_show, mut file)) = opened else {
        warn!(path = ?path.or(defaults.first().copied()), "config file read fail, use default config");
        return T::default();
    };

    let mut config_string = String::new();
    if let Err(e) = file.read_to_string(&mut config_string) {
        warn!(path = config_path_show, error = %e, "config file read fail, use default config");
        return T::default();
    }
    info!(path = config_path_show, "config file");
    if let Ok(config) = toml::from_str(&config_string) {
        return config;
    }
    let config_string = StripComments::new(config_string.as_bytes());
    match serde_json::from_reader(config_string) {
        Ok(data) => data,
        Err(e) => {
            warn!(path = config_path_show, error = %e, "config file parse fail, use default config");
            T::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub db_num: usize,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            db_num: crate::DB_SIZE,
            max_connections: 250,
        }
    }
}

impl ServerConfig {
    pub fn new(path: Option<&str>) -> Self {
        load_config(path, &[SERVER_CONFIG_JSON, SERVER_CONFIG_TOML])
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
