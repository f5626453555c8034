use crate::config::load_config;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_TOML: &str = "./config.toml";
pub const CONFIG_PATH_JSON: &str = "./config.json";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "server_ip")]
    pub server_ip: String,
    #[serde(default = "server_port")]
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: server_port(),
            server_ip: server_ip(),
        }
    }
}

impl Config {
    pub fn new(config_path: Option<&str>) -> Self {
        load_config(config_path, &[CONFIG_PATH_JSON, CONFIG_PATH_TOML])
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.server_ip, self.server_port)
    }
}

fn server_ip() -> String {
    "127.0.0.1".to_string()
}

fn server_port() -> u16 {
    crate::DEFAULT_PORT
}
