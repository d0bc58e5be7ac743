//! Engine del workflow de habilitación
//!
//! Único mutador de las etapas: valida la petición contra la autoridad de
//! roles, aplica la transición, agrega la entrada de auditoría y recalcula el
//! estado agregado, todo dentro de una sola transacción del store.

pub mod builder;
pub mod config;
pub mod core;
pub mod request;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use self::core::WorkflowEngine;
pub use request::{ReadView, TransitionOutcome, TransitionRequest};
