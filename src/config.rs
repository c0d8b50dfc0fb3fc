use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Pool acquire timeout in seconds; a hung database surfaces as an
    /// error instead of a request stuck busy forever.
    pub db_acquire_timeout_secs: u64,
    /// Origin allowed to call the API from a browser.
    pub web_origin: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    // Store misconfiguration is the one fatal condition: detect it at
    // startup rather than on the first operation.
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        anyhow::anyhow!("DATABASE_URL is not set; point it at the bookings database")
    })?;

    Ok(Config {
        port: std::env::var("EVCHARGE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url,
        db_acquire_timeout_secs: std::env::var("EVCHARGE_DB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5),
        web_origin: std::env::var("EVCHARGE_WEB_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
    })
}
