use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_UPSTREAM_URL: &str = "https://jsonplaceholder.typicode.com/posts/1";
pub const DEFAULT_HEADING: &str = "Server-Side Rendering in Rust";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub page: PageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Absent means the fetch waits as long as the upstream takes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { url: default_upstream_url(), timeout_secs: None, user_agent: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_heading")]
    pub heading: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { heading: default_heading() }
    }
}

fn default_upstream_url() -> String { DEFAULT_UPSTREAM_URL.to_string() }
fn default_heading() -> String { DEFAULT_HEADING.to_string() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// Defaults overlaid with `SERVER_HOST`, `SERVER_PORT` and
/// `TOKIO_WORKER_THREADS`, for running without a config file.
pub fn from_env() -> AppConfig {
    from_lookup(env_var)
}

/// Like [`from_env`], reading variables through `get`.
pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> AppConfig {
    let mut cfg = AppConfig::default();
    if let Some(host) = get("SERVER_HOST") {
        cfg.server.host = host;
    }
    if let Some(port) = get("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
        cfg.server.port = port;
    }
    if let Some(w) = get("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
        cfg.server.worker_threads = Some(w);
    }
    cfg
}

impl AppConfig {
    /// Load from `$CONFIG_PATH`, falling back to the environment only when
    /// the file does not exist, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        Self::load_and_validate_from(&config_path(), env_var)
    }

    pub fn load_and_validate_from<F: Fn(&str) -> Option<String>>(path: &str, get: F) -> Result<Self> {
        let mut cfg = match load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => from_lookup(&get),
            Err(e) => return Err(e.context(format!("cannot load config file {path}"))),
        };
        cfg.normalize_and_validate_with(&get)?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_and_validate_with(env_var)
    }

    fn normalize_and_validate_with<F: Fn(&str) -> Option<String>>(&mut self, get: F) -> Result<()> {
        self.server.normalize()?;
        self.upstream.normalize_with(get);
        self.upstream.validate()?;
        self.page.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl UpstreamConfig {
    pub fn normalize_from_env(&mut self) {
        self.normalize_with(env_var);
    }

    fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, get: F) {
        if let Some(url) = get("UPSTREAM_URL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
        self.url = self.url.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(anyhow!("upstream.url is empty; set it in config.toml or UPSTREAM_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("upstream.url must start with http:// or https://"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("upstream.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}

impl PageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.heading.trim().is_empty() {
            return Err(anyhow!("page.heading must not be blank"));
        }
        Ok(())
    }
}
