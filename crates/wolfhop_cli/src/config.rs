//! Process configuration from flags and environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Dev origins always allowed alongside `FRONTEND_URL`.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5137"];

/// WolfHop journaling backend
#[derive(Parser, Debug, Clone)]
#[command(name = "wolfhop")]
#[command(about = "Social journaling backend: friends, herds, reflections")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "WOLFHOP_DB", default_value = "wolfhop.sqlite3")]
    pub db_path: PathBuf,

    /// HS256 signing secret, at least 32 characters
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Token lifetime in minutes
    #[arg(long, env = "JWT_EXPIRES_IN", default_value_t = 60)]
    pub jwt_expires_in: u64,

    /// Browser origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rotated log files; stderr when unset
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,

    /// Print core ping/version and exit
    #[arg(long)]
    pub ping: bool,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret.as_deref().map(str::trim) {
            None | Some("") => return Err("JWT_SECRET is required".to_string()),
            Some(_) => {}
        }
        if self.jwt_expires_in == 0 {
            return Err("JWT_EXPIRES_IN must be positive".to_string());
        }
        Ok(())
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = Vec::with_capacity(DEV_ORIGINS.len() + 1);
        if let Some(url) = self
            .frontend_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
        {
            origins.push(url.to_string());
        }
        for origin in DEV_ORIGINS {
            if !origins.iter().any(|known| known == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}
