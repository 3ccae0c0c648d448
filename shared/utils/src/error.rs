use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize)]
pub enum BomError {
    #[error("Duplicate identifier '{identifier}' in {scope}")]
    DuplicateIdentifier { identifier: String, scope: String },

    #[error("No root assembly found: every assembly is used by another one")]
    NoRoot,

    #[error("Ambiguous root: {} assemblies are unused ({})", candidates.len(), candidates.join(", "))]
    AmbiguousRoot { candidates: Vec<String> },

    #[error("Cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("Unknown node: {identifier}")]
    UnknownNode { identifier: String },

    #[error("Failed to load {source_name}: {message}")]
    Load { source_name: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl BomError {
    pub fn duplicate(identifier: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::DuplicateIdentifier {
            identifier: identifier.into(),
            scope: scope.into(),
        }
    }

    pub fn unknown_node(identifier: impl Into<String>) -> Self {
        Self::UnknownNode {
            identifier: identifier.into(),
        }
    }

    pub fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
            Self::NoRoot => "NO_ROOT",
            Self::AmbiguousRoot { .. } => "AMBIGUOUS_ROOT",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::UnknownNode { .. } => "UNKNOWN_NODE",
            Self::Load { .. } => "LOAD_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Process exit status used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Load { .. } | Self::Configuration { .. } => 2,
            Self::UnknownNode { .. } => 3,
            _ => 1,
        }
    }
}

pub type BomResult<T> = Result<T, BomError>;

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}

impl From<&BomError> for ErrorReport {
    fn from(error: &BomError) -> Self {
        let details = match error {
            BomError::AmbiguousRoot { candidates } => Some(serde_json::json!({ "candidates": candidates })),
            BomError::CycleDetected { path } => Some(serde_json::json!({ "path": path })),
            BomError::DuplicateIdentifier { identifier, .. }
            | BomError::UnknownNode { identifier } => Some(serde_json::json!({ "identifier": identifier })),
            _ => None,
        };
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            details,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for BomError {
    fn from(error: std::io::Error) -> Self {
        Self::load("file", error.to_string())
    }
}

impl From<csv::Error> for BomError {
    fn from(error: csv::Error) -> Self {
        Self::load("CSV", error.to_string())
    }
}

impl From<calamine::Error> for BomError {
    fn from(error: calamine::Error) -> Self {
        Self::load("workbook", error.to_string())
    }
}

impl From<quick_xml::Error> for BomError {
    fn from(error: quick_xml::Error) -> Self {
        Self::load("XML", error.to_string())
    }
}

impl From<serde_json::Error> for BomError {
    fn from(error: serde_json::Error) -> Self {
        Self::load("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for BomError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
