//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `CONFIG`.
use dotenvy::dotenv;
use fleet_core::EngineConfig;
use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

/// Configuración global de la aplicación.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Comportamiento del engine (auditoría de transiciones sin cambio).
    pub engine: EngineConfig,
    /// Parámetros de base de datos; `None` si no hay `DATABASE_URL`.
    #[cfg(feature = "postgres")]
    pub database: Option<fleet_persistence::DbConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self { engine: EngineConfig::from_env(),
               #[cfg(feature = "postgres")]
               database: fleet_persistence::DbConfig::from_env().ok() }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
