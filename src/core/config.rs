use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub app_env: String,
    /// Base URL of the web client, used to build invitation and reset links
    pub frontend_url: String,
    pub security_enabled: bool,
    pub api_allowed_ips: Vec<String>,
    pub api_allowed_domains: Vec<String>,
    pub login_rate_per_minute: u32,
    pub register_rate_per_minute: u32,
    pub password_reset_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://zigzag.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            max_connections: 16,
            connection_lifetime_secs: 1800,
            app_env: "development".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            security_enabled: false,
            api_allowed_ips: Vec::new(),
            api_allowed_domains: Vec::new(),
            login_rate_per_minute: 10,
            register_rate_per_minute: 5,
            password_reset_ttl_minutes: 60,
        }
    }
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            defaults.jwt_secret
        });

        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);

        let server_port = parse_var("SERVER_PORT", defaults.server_port)
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = parse_var("MAX_DB_CONNECTIONS", defaults.max_connections)
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let connection_lifetime_secs =
            parse_var("DB_CONNECTION_LIFETIME_SECS", defaults.connection_lifetime_secs).map_err(
                |_| "Invalid DB_CONNECTION_LIFETIME_SECS: must be a positive number".to_string(),
            )?;

        let app_env = env::var("APP_ENV").unwrap_or(defaults.app_env);

        let frontend_url = env::var("FRONTEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.frontend_url);

        let security_enabled = env::var("SECURITY_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(app_env == "production");

        let login_rate_per_minute = parse_var("LOGIN_RATE_PER_MINUTE", defaults.login_rate_per_minute)
            .map_err(|_| "Invalid LOGIN_RATE_PER_MINUTE: must be a positive number".to_string())?;

        let register_rate_per_minute =
            parse_var("REGISTER_RATE_PER_MINUTE", defaults.register_rate_per_minute).map_err(
                |_| "Invalid REGISTER_RATE_PER_MINUTE: must be a positive number".to_string(),
            )?;

        let password_reset_ttl_minutes =
            parse_var("PASSWORD_RESET_TTL_MINUTES", defaults.password_reset_ttl_minutes).map_err(
                |_| "Invalid PASSWORD_RESET_TTL_MINUTES: must be a number".to_string(),
            )?;

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            app_env,
            frontend_url,
            security_enabled,
            api_allowed_ips: parse_list(&env::var("API_ALLOWED_IPS").unwrap_or_default()),
            api_allowed_domains: parse_list(&env::var("API_ALLOWED_DOMAINS").unwrap_or_default()),
            login_rate_per_minute,
            register_rate_per_minute,
            password_reset_ttl_minutes,
        })
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        info!("   Database: {}", Self::mask_url(&self.database_url));
        info!("   Max DB Connections: {}", self.max_connections);
        info!("   Connection Lifetime: {}s", self.connection_lifetime_secs);
        info!("   Frontend URL: {}", self.frontend_url);
        info!(
            "   Security filtering: {} ({} allowed IPs, {} allowed domains)",
            if self.security_enabled { "enabled" } else { "disabled" },
            self.api_allowed_ips.len(),
            self.api_allowed_domains.len()
        );
        info!(
            "   JWT Secret: {}",
            if self.jwt_secret == DEFAULT_JWT_SECRET {
                "USING DEFAULT (INSECURE!)"
            } else {
                "custom secret configured"
            }
        );
    }

    /// Maschera le credenziali dell'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        url.to_string()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, T::Err> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>(),
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated list, dropping empty items
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
