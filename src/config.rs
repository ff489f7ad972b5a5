use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_MODEL_PATH: &str = "./final_model.sav";
pub const DEFAULT_PAYLOAD_LIMIT: usize = 256 * 1024;

/// Which origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

/// How `OPTIONS /predict` is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightMode {
    /// The CORS middleware answers preflight requests itself.
    FrameworkDefault,
    /// The middleware lets preflight through and `/predict` answers it with
    /// fixed allow-origin/methods/headers.
    ManualHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub origins: AllowedOrigins,
    pub preflight: PreflightMode,
}

/// Deployment variant, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    SingleOrigin,
    OriginList,
    Unrestricted,
}

impl Deployment {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Deployment::SingleOrigin),
            "list" => Ok(Deployment::OriginList),
            "any" | "" => Ok(Deployment::Unrestricted),
            other => Err(anyhow!(
                "unknown CORS_MODE '{}', expected one of: single, list, any",
                other
            )),
        }
    }

    fn default_origins(self) -> AllowedOrigins {
        match self {
            Deployment::SingleOrigin => AllowedOrigins::List(vec!["https://vite.dev".into()]),
            Deployment::OriginList => AllowedOrigins::List(vec![
                "https://vite.dev".into(),
                "http://localhost:5173".into(),
            ]),
            Deployment::Unrestricted => AllowedOrigins::Any,
        }
    }

    fn preflight(self) -> PreflightMode {
        match self {
            Deployment::OriginList => PreflightMode::ManualHeaders,
            _ => PreflightMode::FrameworkDefault,
        }
    }

    /// The origin-list variant is the production one and runs quiet.
    fn default_debug(self) -> bool {
        self != Deployment::OriginList
    }

    pub fn cors_policy(self, origins_override: Option<Vec<String>>) -> CorsPolicy {
        let origins = match (self, origins_override) {
            (Deployment::Unrestricted, _) => AllowedOrigins::Any,
            (_, Some(list)) if list.iter().any(|o| o == "*") => AllowedOrigins::Any,
            (_, Some(list)) if !list.is_empty() => AllowedOrigins::List(list),
            _ => self.default_origins(),
        };
        CorsPolicy {
            origins,
            preflight: self.preflight(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub deployment: Deployment,
    pub cors: CorsPolicy,
    pub debug: bool,
    pub payload_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let deployment = Deployment::parse(&lookup("CORS_MODE").unwrap_or_default())?;

        let port: u16 = match lookup("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("invalid PORT '{}'", p))?,
            None => 5000,
        };

        let debug = match lookup("DEBUG") {
            Some(v) => parse_bool(&v).ok_or_else(|| anyhow!("invalid DEBUG '{}'", v))?,
            None => deployment.default_debug(),
        };

        let payload_limit: usize = match lookup("PAYLOAD_LIMIT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("invalid PAYLOAD_LIMIT '{}'", v))?,
            None => DEFAULT_PAYLOAD_LIMIT,
        };

        let origins = lookup("CORS_ORIGINS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            deployment,
            cors: deployment.cors_policy(origins),
            debug,
            payload_limit,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn liveness_route(&self) -> bool {
        self.deployment == Deployment::Unrestricted
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
