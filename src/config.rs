use std::{env, time::Duration};

use anyhow::{Context, anyhow};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Full connection URL; when set it wins over the individual parts.
    pub url_override: Option<String>,
    pub pool_size: u32,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
    pub allow_empty_password_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub pbkdf2_iterations: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub upload_max_bytes: usize,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let jwt_expires_in = parse_duration(
            &env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "7d".to_string()),
        )?;

        let database = DatabaseConfig {
            host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env_parse("DB_PORT", 3306),
            user: env::var("DB_USER").unwrap_or_else(|_| "root".to_string()),
            password: env::var("DB_PASSWORD").unwrap_or_default(),
            name: env::var("DB_NAME").unwrap_or_else(|_| "codemall".to_string()),
            url_override: env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            pool_size: env_parse("DB_POOL_SIZE", 10),
            connect_attempts: env_parse("DB_CONNECT_ATTEMPTS", 10),
            connect_delay: Duration::from_millis(env_parse("DB_CONNECT_DELAY_MS", 3000)),
            allow_empty_password_fallback: env_parse("DB_ALLOW_EMPTY_PASSWORD_FALLBACK", false),
        };

        Ok(Self {
            host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3333),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            upload_max_bytes: env_parse("UPLOAD_MAX_BYTES", 5 * 1024 * 1024),
            database,
            auth: AuthConfig {
                jwt_secret,
                jwt_expires_in,
                pbkdf2_iterations: env_parse("PBKDF2_ITERATIONS", 310_000),
            },
        })
    }
}

pub fn mysql_url(host: &str, port: u16, user: &str, password: &str, db: Option<&str>) -> String {
    let credentials = if password.is_empty() {
        encode_userinfo(user)
    } else {
        format!("{}:{}", encode_userinfo(user), encode_userinfo(password))
    };
    match db {
        Some(db) => format!("mysql://{credentials}@{host}:{port}/{db}"),
        None => format!("mysql://{credentials}@{host}:{port}"),
    }
}

fn encode_userinfo(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses lifetimes such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow!("invalid duration: {raw}"))?;
    let unit_secs: u64 = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => return Err(anyhow!("invalid duration unit: {raw}")),
    };
    let secs = value
        .checked_mul(unit_secs)
        .ok_or_else(|| anyhow!("duration out of range: {raw}"))?;
    Ok(Duration::from_secs(secs))
}
