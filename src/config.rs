use std::net::SocketAddr;

use anyhow::{Context, bail};

/// Costs bcrypt accepts.
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub proxy_rps: u32,
    pub http_connect_timeout_secs: u64,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: "sqlite://moviehub.db?mode=rwc".to_string(),
            db_max_connections: 10,
            jwt_secret: String::new(),
            token_ttl_hours: 24 * 7,
            bcrypt_cost: 10,
            proxy_rps: 8,
            http_connect_timeout_secs: 10,
            seed_demo_data: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults.database_url.clone());

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.db_max_connections);

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();

        let token_ttl_hours: i64 = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.token_ttl_hours);

        let bcrypt_cost: u32 = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bcrypt_cost);

        let proxy_rps: u32 =
            std::env::var("PROXY_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.proxy_rps);

        let http_connect_timeout_secs: u64 = std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_connect_timeout_secs);

        let seed_demo_data = std::env::var("SEED_DEMO_DATA")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            proxy_rps,
            http_connect_timeout_secs,
            seed_demo_data,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would only fail later, at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !BCRYPT_COSTS.contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be between {} and {}, got {}",
                BCRYPT_COSTS.start(),
                BCRYPT_COSTS.end(),
                self.bcrypt_cost
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn bcrypt_cost_out_of_range_is_rejected() {
        for cost in [0, 3, 32] {
            let config = Config { bcrypt_cost: cost, ..Config::default() };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("BCRYPT_COST"), "{err}");
        }
        for cost in [4, 12, 31] {
            Config { bcrypt_cost: cost, ..Config::default() }.validate().unwrap();
        }
    }
}
