// ============================================================================
// L2.0: ENVIRONMENT CONFIGURATION SUBSYSTEM
// ============================================================================
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use log::info;
use sqlx::mysql::MySqlConnectOptions;
use tiberius::AuthMethod;

use crate::connection_manager::{DestinationEndpoint, SourceEndpoint};
use crate::errors::{AppError, Engine};
use crate::model::TablePair;

const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5000;
const DEFAULT_MAX_DISPLAY_ROWS: usize = 50;

pub struct EnvConfig {
    pub sqlserver_url: String,
    pub sqlserver_user: Option<String>,
    pub sqlserver_pass: Option<String>,
    pub sqlserver_trust_cert: bool,
    pub mysql_url: String,
    pub mysql_user: Option<String>,
    pub mysql_pass: Option<String>,
    pub table_pairs: Option<String>,
    pub refresh_interval_ms: u64,
    pub max_display_rows: usize,
    pub log_level: String,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        dotenv().ok();

        EnvConfig {
            sqlserver_url: var_or(
                "SQLSERVER_URL",
                "jdbc:sqlserver://localhost:1433;databaseName=master",
            ),
            sqlserver_user: std::env::var("SQLSERVER_USER").ok(),
            sqlserver_pass: std::env::var("SQLSERVER_PASSWORD").ok(),
            sqlserver_trust_cert: parse_flag(&var_or("SQLSERVER_TRUST_CERT", "true")),
            mysql_url: var_or("MYSQL_URL", "mysql://localhost:3306/mysql"),
            mysql_user: std::env::var("MYSQL_USER").ok(),
            mysql_pass: std::env::var("MYSQL_PASSWORD").ok(),
            table_pairs: std::env::var("TABLE_PAIRS").ok(),
            refresh_interval_ms: var_or("REFRESH_INTERVAL_MS", "")
                .parse()
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS),
            max_display_rows: var_or("MAX_DISPLAY_ROWS", "")
                .parse()
                .unwrap_or(DEFAULT_MAX_DISPLAY_ROWS),
            log_level: var_or("LOG_LEVEL", "info"),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn table_pairs(&self) -> Result<Vec<TablePair>, AppError> {
        let raw = self
            .table_pairs
            .as_deref()
            .ok_or_else(|| AppError::Config("TABLE_PAIRS is not set".to_string()))?;
        let pairs = parse_table_pairs(raw)?;
        if pairs.is_empty() {
            return Err(AppError::Config("TABLE_PAIRS has no table pairs".to_string()));
        }
        Ok(pairs)
    }

    pub fn build_source_endpoint(&self) -> Result<SourceEndpoint, AppError> {
        let mut config = tiberius::Config::from_jdbc_string(&self.sqlserver_url)
            .map_err(|e| AppError::Config(format!("invalid SQLSERVER_URL: {}", e)))?;
        // Unset user keeps whatever user/password the JDBC string carries.
        if let Some(user) = &self.sqlserver_user {
            config.authentication(AuthMethod::sql_server(
                user,
                self.sqlserver_pass.as_deref().unwrap_or(""),
            ));
        }
        if self.sqlserver_trust_cert {
            config.trust_cert();
        }
        Ok(SourceEndpoint::new(config))
    }

    pub fn build_destination_endpoint(&self) -> Result<DestinationEndpoint, AppError> {
        Ok(DestinationEndpoint::new(self.destination_options()?))
    }

    /// URL credentials apply unless MYSQL_USER / MYSQL_PASSWORD are set.
    fn destination_options(&self) -> Result<MySqlConnectOptions, AppError> {
        let url = normalize_mysql_url(&self.mysql_url);
        let mut options = MySqlConnectOptions::from_str(&url)
            .map_err(|e| AppError::Config(format!("invalid MYSQL_URL: {}", e)))?;
        if let Some(user) = &self.mysql_user {
            options = options.username(user);
        }
        if let Some(pass) = &self.mysql_pass {
            options = options.password(pass);
        }
        Ok(options)
    }

    pub fn log_config(&self) {
        info!("════════════════════════════════════════════════");
        info!("📋 Configuration Loaded:");
        info!("🔵 Source ({}):", Engine::SqlServer);
        info!("   URL: {}", mask_secrets(&self.sqlserver_url));
        info!("   User: {}", self.sqlserver_user.as_deref().unwrap_or("(from URL)"));
        info!("   Trust certificate: {}", self.sqlserver_trust_cert);
        info!("🔴 Destination ({}):", Engine::MySql);
        info!("   URL: {}", mask_secrets(&self.mysql_url));
        info!("   User: {}", self.mysql_user.as_deref().unwrap_or("(from URL)"));
        info!("🔁 Refresh interval: {} ms", self.refresh_interval_ms);
        info!(
            "🗂️ Table pairs: {}",
            self.table_pairs.as_deref().unwrap_or("(not set)")
        );
        info!("════════════════════════════════════════════════");
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Accepts `jdbc:mysql://...` as well as plain `mysql://...`.
pub fn normalize_mysql_url(raw: &str) -> String {
    raw.trim()
        .strip_prefix("jdbc:")
        .unwrap_or(raw.trim())
        .to_string()
}

/// Parses `src1,dst1;src2,dst2`. Empty segments are skipped.
pub fn parse_table_pairs(raw: &str) -> Result<Vec<TablePair>, AppError> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut parts = segment.split(',').map(str::trim);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(src), Some(dst), None) if !src.is_empty() && !dst.is_empty() => {
                    Ok(TablePair {
                        source_table: src.to_string(),
                        destination_table: dst.to_string(),
                    })
                }
                _ => Err(AppError::Config(format!(
                    "invalid table pair '{}', expected 'source,destination'",
                    segment
                ))),
            }
        })
        .collect()
}

/// Hides `password=...` / `pwd=...` properties and URL user-info passwords.
pub fn mask_secrets(url: &str) -> String {
    let masked_props = url
        .split(';')
        .map(|prop| {
            let key = prop.split('=').next().unwrap_or("").trim().to_ascii_lowercase();
            if key == "password" || key == "pwd" {
                format!("{}=***", prop.split('=').next().unwrap_or(""))
            } else {
                prop.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";");

    match (masked_props.find("://"), masked_props.find('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let user_info = &masked_props[scheme_end + 3..at];
            match user_info.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &masked_props[..scheme_end + 3],
                    &user_info[..colon],
                    &masked_props[at..]
                ),
                None => masked_props,
            }
        }
        _ => masked_props,
    }
}
