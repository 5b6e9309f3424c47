use rocket::figment::Figment;
use serde::Deserialize;

/// Application keys read from Rocket's figment (`Rocket.toml` / `ROCKET_*`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub db_pool_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: "website/db/diyblog.db".to_string(),
            db_pool_size: 10,
        }
    }
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Self {
        match figment.extract::<AppConfig>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid application config, using defaults: {}", e);
                AppConfig::default()
            }
        }
    }
}
