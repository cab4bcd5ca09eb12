use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base configuration file, looked up in the configuration directory
pub const CONFIG_FILE: &str = "identity-mcp.toml";

pub const DEFAULT_PORT: u16 = 8080;

/// Command line options shared by both binaries
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory holding identity-mcp.toml (defaults to the working directory)
    #[arg(long, env = "CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Environment name; identity-mcp.<environment>.toml is merged on top
    #[arg(long, env = "IDENTITY_MCP_ENV")]
    pub environment: Option<String>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ServerConfig> {
        let dir = resolve_config_dir(self.config_path.as_deref());
        ServerConfig::load(&dir, self.environment.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub app: AppConfig,
    pub health: HealthConfig,
    pub authentication: AuthenticationConfig,
    pub identity_storage_api: IdentityStorageApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// Listen URL of the MCP endpoints, e.g. `http://localhost:5100`
    pub url: String,
    /// Route prefix of the MCP endpoints, e.g. `/identity/mcp`
    pub map_mcp_pattern: String,
    /// Reported by the health endpoints
    pub client_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "???".to_string(),
            version: "?.?".to_string(),
            url: String::new(),
            map_mcp_pattern: String::new(),
            client_id: String::new(),
        }
    }
}

impl AppConfig {
    /// Address the application port binds to. `localhost` binds loopback,
    /// an IP literal binds that address, any other host binds all interfaces.
    pub fn listen_addr(&self) -> SocketAddr {
        let Ok(url) = url::Url::parse(self.url.trim()) else {
            return SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT);
        };

        let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);
        let ip = match url.host() {
            Some(url::Host::Domain(host)) if host.eq_ignore_ascii_case("localhost") => {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
            Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip),
            _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, port)
    }

    /// MCP route prefix with a leading slash and no trailing slash; empty
    /// means the endpoints are mounted at the root.
    pub fn mcp_base_path(&self) -> String {
        let trimmed = self.map_mcp_pattern.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub live_path: String,
    pub ready_path: String,
    /// Serve health on this port only, instead of the application port
    pub port: Option<u16>,
}

impl HealthConfig {
    /// Liveness route with a leading slash and no trailing slash
    pub fn live_route(&self) -> String {
        normalize_route(&self.live_path)
    }

    pub fn ready_route(&self) -> String {
        normalize_route(&self.ready_path)
    }
}

fn normalize_route(path: &str) -> String {
    format!("/{}", path.trim().trim_matches('/'))
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            live_path: "/health/live".to_string(),
            ready_path: "/health/ready".to_string(),
            port: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    pub scheme: String,
    pub expected_token: String,
    /// Accept any token while `expected_token` is `*`
    pub allow_wildcard_token: bool,
}

pub const WILDCARD_TOKEN: &str = "*";

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            scheme: "Bearer".to_string(),
            expected_token: WILDCARD_TOKEN.to_string(),
            allow_wildcard_token: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityStorageApiConfig {
    pub api_url: String,
    pub api_base_path: String,
    pub timeout_secs: u64,
}

impl Default for IdentityStorageApiConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_base_path: String::new(),
            timeout_secs: 30,
        }
    }
}

impl IdentityStorageApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    /// Load `identity-mcp.toml` from `dir` and merge the environment overlay
    /// on top. Missing files fall back to defaults.
    pub fn load(dir: &Path, environment: Option<&str>) -> Result<Self> {
        let mut merged = read_toml(&dir.join(CONFIG_FILE))?
            .unwrap_or_else(|| {
                tracing::info!(dir = %dir.display(), "Configuration file not found, using defaults");
                toml::Value::Table(Default::default())
            });

        if let Some(environment) = environment.map(str::trim).filter(|e| !e.is_empty()) {
            let overlay_path = dir.join(format!("identity-mcp.{environment}.toml"));
            if let Some(overlay) = read_toml(&overlay_path)? {
                tracing::info!(path = %overlay_path.display(), "Applying configuration overlay");
                merge(&mut merged, overlay);
            }
        }

        let config: Self = merged
            .try_into()
            .context("Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject route settings that would collide once mounted.
    pub fn validate(&self) -> Result<()> {
        if !self.health.enabled {
            return Ok(());
        }

        let live = self.health.live_route();
        let ready = self.health.ready_route();
        if live == ready {
            bail!("health.live_path and health.ready_path must differ (both are {live})");
        }

        // Health on its own port never shares a router with MCP
        let shared_port = match self.health.port {
            Some(port) => port == self.app.listen_addr().port(),
            None => true,
        };
        if shared_port {
            let base = self.app.mcp_base_path();
            let mcp_routes = [
                if base.is_empty() { "/".to_string() } else { base.clone() },
                format!("{base}/sse"),
                format!("{base}/message"),
            ];
            for route in [&live, &ready] {
                if mcp_routes.contains(route) {
                    bail!("health path {route} collides with the MCP routes under app.map_mcp_pattern");
                }
            }
        }

        Ok(())
    }
}

fn read_toml(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let value = toml::from_str(&content)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
    Ok(Some(value))
}

/// Tables merge key by key; any other value in `overlay` replaces `base`.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Resolve the configuration directory. Relative paths are tried against the
/// working directory first, then against the executable's directory.
pub fn resolve_config_dir(config_path: Option<&Path>) -> PathBuf {
    let Some(config_path) = config_path.filter(|p| !p.as_os_str().is_empty()) else {
        return PathBuf::from(".");
    };

    if config_path.is_absolute() {
        return config_path.to_path_buf();
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(config_path);
        if candidate.is_dir() {
            return candidate;
        }
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let candidate = exe_dir.join(config_path);
        if candidate.is_dir() {
            tracing::debug!(dir = %candidate.display(), "Resolved configuration directory next to executable");
            return candidate;
        }
    }

    config_path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(dir.path(), None).unwrap();

        assert_eq!(config.app.version, "?.?");
        assert!(config.health.enabled);
        assert_eq!(config.health.live_path, "/health/live");
        assert_eq!(config.authentication.scheme, "Bearer");
        assert_eq!(config.authentication.expected_token, "*");
        assert!(!config.authentication.allow_wildcard_token);
        assert_eq!(config.identity_storage_api.timeout_secs, 30);
    }

    #[test]
    fn test_load_with_environment_overlay() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CONFIG_FILE,
            r#"
[app]
name = "identity-mcp"
version = "1.2.0"
url = "http://localhost:5100"
map_mcp_pattern = "/identity/mcp"

[identity_storage_api]
api_url = "http://localhost:5005"
api_base_path = "/api/v1"
"#,
        );
        write(
            dir.path(),
            "identity-mcp.staging.toml",
            r#"
[identity_storage_api]
api_url = "http://storage.internal"

[authentication]
expected_token = "secret"
"#,
        );

        let config = ServerConfig::load(dir.path(), Some("staging")).unwrap();
        assert_eq!(config.app.name, "identity-mcp");
        assert_eq!(config.identity_storage_api.api_url, "http://storage.internal");
        assert_eq!(config.identity_storage_api.api_base_path, "/api/v1");
        assert_eq!(config.authentication.expected_token, "secret");
        assert_eq!(config.authentication.scheme, "Bearer");
    }

    #[test]
    fn test_missing_overlay_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CONFIG_FILE, "[app]\nversion = \"2.0\"\n");

        let config = ServerConfig::load(dir.path(), Some("production")).unwrap();
        assert_eq!(config.app.version, "2.0");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CONFIG_FILE, "[app\nname = ");

        assert!(ServerConfig::load(dir.path(), None).is_err());
    }

    #[test]
    fn test_health_paths_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CONFIG_FILE,
            "[health]\nlive_path = \"health/live/\"\nready_path = \" /health/ready\"\n",
        );

        let config = ServerConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.health.live_route(), "/health/live");
        assert_eq!(config.health.ready_route(), "/health/ready");
    }

    #[test]
    fn test_identical_health_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CONFIG_FILE,
            "[health]\nlive_path = \"/health\"\nready_path = \"health/\"\n",
        );

        let err = ServerConfig::load(dir.path(), None).unwrap_err();
        assert!(format!("{err:#}").contains("must differ"));
    }

    #[test]
    fn test_health_path_colliding_with_mcp_is_rejected() {
        let mut config = ServerConfig::default();
        config.app.map_mcp_pattern = "/identity/mcp".to_string();
        config.health.ready_path = "/identity/mcp/sse".to_string();
        assert!(config.validate().is_err());

        config.health.port = Some(9000);
        assert!(config.validate().is_ok());

        config.health.port = None;
        config.health.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listen_addr() {
        let mut app = AppConfig::default();
        assert_eq!(app.listen_addr().port(), DEFAULT_PORT);
        assert!(app.listen_addr().ip().is_unspecified());

        app.url = "http://localhost:5100".to_string();
        assert_eq!(app.listen_addr(), "127.0.0.1:5100".parse().unwrap());

        app.url = "http://10.0.0.5:7000".to_string();
        assert_eq!(app.listen_addr(), "10.0.0.5:7000".parse().unwrap());

        app.url = "http://identity.example.com:9000".to_string();
        assert_eq!(app.listen_addr(), "0.0.0.0:9000".parse().unwrap());

        app.url = "not a url".to_string();
        assert_eq!(app.listen_addr().port(), DEFAULT_PORT);
    }

    #[test]
    fn test_mcp_base_path() {
        let mut app = AppConfig::default();
        assert_eq!(app.mcp_base_path(), "");

        app.map_mcp_pattern = "identity/mcp/".to_string();
        assert_eq!(app.mcp_base_path(), "/identity/mcp");
    }

    #[test]
    fn test_resolve_config_dir() {
        assert_eq!(resolve_config_dir(None), PathBuf::from("."));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_config_dir(Some(dir.path())), dir.path());
    }
}
