use thiserror::Error;

/// Broad fault categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Configuration,
    Resolution,
    Io,
    Adapter,
    Contract,
    Type,
    Persistence,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacadeError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Locator error at offset {offset}: {message}")]
    Locator { message: String, offset: usize },
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error on '{location}': {message}")]
    Io { location: String, message: String },
    #[error("Malformed content for triplifier '{triplifier}': {message}")]
    Adapter { triplifier: String, message: String },
    #[error("Builder contract violated: {0}")]
    Contract(String),
    #[error("Type error: {0}")]
    Type(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl FacadeError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Config(_) | Self::Locator { .. } => FaultKind::Configuration,
            Self::UnsupportedFormat(_) => FaultKind::Resolution,
            Self::Io { .. } => FaultKind::Io,
            Self::Adapter { .. } => FaultKind::Adapter,
            Self::Contract(_) => FaultKind::Contract,
            Self::Type(_) => FaultKind::Type,
            Self::Persistence(_) => FaultKind::Persistence,
            Self::Lock(_) => FaultKind::Internal,
        }
    }
    pub fn io(location: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            location: location.into(),
            message: message.to_string(),
        }
    }
    pub fn adapter(triplifier: impl Into<String>, message: impl ToString) -> Self {
        Self::Adapter {
            triplifier: triplifier.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FacadeError>;

// Helper conversions
impl From<rusqlite::Error> for FacadeError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
impl From<config::ConfigError> for FacadeError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
impl<T> From<std::sync::PoisonError<T>> for FacadeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
