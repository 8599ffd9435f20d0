use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    /// Base for share links, without a trailing slash.
    pub public_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let public_url = lookup("APP_PUBLIC_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Self {
            port,
            data_path,
            public_url,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
