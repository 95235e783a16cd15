use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub fixture_path: PathBuf,
    pub payment_latency: Duration,
    pub delete_latency: Duration,
    pub payment_gateway_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "sqlite://learnhub.db?mode=rwc".to_string(),
            fixture_path: PathBuf::from("data/courses.json"),
            payment_latency: Duration::from_millis(2000),
            delete_latency: Duration::from_millis(1000),
            payment_gateway_url: None,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let addr = match env::var("LEARNHUB_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("LEARNHUB_ADDR is not a socket address: {}", raw)))?,
            Err(_) => defaults.addr,
        };
        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let fixture_path = env::var("COURSES_FIXTURE")
            .map(PathBuf::from)
            .unwrap_or(defaults.fixture_path);
        let payment_latency = millis_from_env("PAYMENT_LATENCY_MS")?.unwrap_or(defaults.payment_latency);
        let delete_latency = millis_from_env("DELETE_LATENCY_MS")?.unwrap_or(defaults.delete_latency);
        let payment_gateway_url = env::var("PAYMENT_GATEWAY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            addr,
            database_url,
            fixture_path,
            payment_latency,
            delete_latency,
            payment_gateway_url,
        })
    }
}

fn millis_from_env(key: &str) -> Result<Option<Duration>, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| AppError::Config(format!("{} must be a number of milliseconds: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
