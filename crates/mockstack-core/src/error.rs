use thiserror::Error;

/// Errors raised by the dispatch engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Service already registered: {0}")]
    ServiceAlreadyRegistered(String),

    #[error("Invalid service name: {0:?}")]
    InvalidServiceName(String),
}
