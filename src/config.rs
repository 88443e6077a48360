/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可、JWT secret / TTL / default claims など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動後は不変 (リクエストごとに読み直さない)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde_json::Value;

use crate::services::token::{Claims, RefreshConfig, refresh::DEFAULT_TTL_SECONDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        let value = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::parse(&value)
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // HS256 shared secret for inbound verification and outbound signing
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub token_leeway_seconds: u64,
    pub default_claims: Claims,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("default_claims", &self.default_claims)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins =
            parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_seconds = match std::env::var("TOKEN_TTL_SECONDS") {
            Ok(v) => parse_ttl(&v)?,
            Err(_) => DEFAULT_TTL_SECONDS,
        };

        let token_leeway_seconds = match std::env::var("TOKEN_LEEWAY_SECONDS") {
            Ok(v) => parse_leeway(&v)?,
            Err(_) => 0,
        };

        let default_claims = match std::env::var("DEFAULT_CLAIMS") {
            Ok(v) => parse_default_claims(&v)?,
            Err(_) => Claims::new(),
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            token_ttl_seconds,
            token_leeway_seconds,
            default_claims,
        })
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            default_claims: self.default_claims.clone(),
            ttl_seconds: self.token_ttl_seconds,
            leeway_seconds: self.token_leeway_seconds,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_ttl(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|ttl| *ttl > 0)
        .ok_or(ConfigError::Invalid("TOKEN_TTL_SECONDS"))
}

fn parse_leeway(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid("TOKEN_LEEWAY_SECONDS"))
}

fn parse_default_claims(raw: &str) -> Result<Claims, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(Claims::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(claims)) => Ok(claims),
        _ => Err(ConfigError::Invalid("DEFAULT_CLAIMS")),
    }
}
