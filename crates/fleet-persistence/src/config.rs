//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool y reintentos.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Reintentos ante errores transitorios (conflicto de serialización,
    /// pool/IO).
    pub retry_attempts: u32,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(),
               min_connections: DEFAULT_MIN_CONNECTIONS,
               max_connections: DEFAULT_MAX_CONNECTIONS,
               retry_attempts: DEFAULT_RETRY_ATTEMPTS }
    }

    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        Ok(Self { url,
                  min_connections: env_number("DATABASE_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS),
                  max_connections: env_number("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
                  retry_attempts: env_number("DATABASE_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS) })
    }
}

fn env_number(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
