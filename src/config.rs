use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub sms: SmsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_session_expires_in")]
    pub session_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_secs: i64,
    pub hash_cost: u32,
    pub max_attempts: i32,
    pub purge_interval_secs: u64,
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            hash_cost: 10,
            max_attempts: 5,
            purge_interval_secs: 300,
            delivery_timeout_ms: default_delivery_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub api_key: String,
    pub base_url: String,
    pub route: String,
    pub timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.fast2sms.com/dev/bulkV2".to_string(),
            route: "otp".to_string(),
            timeout_secs: 15,
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_delivery_timeout_ms() -> u64 {
    15_000
}

fn default_session_expires_in() -> i64 {
    604_800
}

/// `database.url` 取此值时使用进程内存储，不连接数据库
pub const MEMORY_DATABASE_URL: &str = "memory://";

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.trim() == MEMORY_DATABASE_URL
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults()?,
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn from_env_defaults() -> Result<Self, Box<dyn std::error::Error>> {
        // 数据库 URL 在无配置文件时必须提供
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("PORT", 5000u16),
                environment: get_env("APP_ENV").unwrap_or_else(default_environment),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                session_expires_in: get_env_parse(
                    "JWT_SESSION_EXPIRES_IN",
                    default_session_expires_in(),
                ),
            },
            otp: OtpConfig::default(),
            sms: SmsConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("APP_ENV") {
            self.server.environment = v;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_SESSION_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.session_expires_in = n;
        }

        // OTP
        if let Ok(v) = env::var("OTP_TTL_SECS")
            && let Ok(n) = v.parse()
        {
            self.otp.ttl_secs = n;
        }
        if let Ok(v) = env::var("OTP_HASH_COST")
            && let Ok(n) = v.parse()
        {
            self.otp.hash_cost = n;
        }
        if let Ok(v) = env::var("OTP_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.otp.max_attempts = n;
        }
        if let Ok(v) = env::var("OTP_PURGE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.otp.purge_interval_secs = n;
        }
        if let Ok(v) = env::var("OTP_DELIVERY_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.otp.delivery_timeout_ms = n;
        }

        // Fast2SMS
        if let Ok(v) = env::var("FAST2SMS_API_KEY") {
            self.sms.api_key = v;
        }
        if let Ok(v) = env::var("FAST2SMS_BASE_URL") {
            self.sms.base_url = v;
        }
        if let Ok(v) = env::var("FAST2SMS_ROUTE") {
            self.sms.route = v;
        }
        if let Ok(v) = env::var("FAST2SMS_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.sms.timeout_secs = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
