use actix_web::{
    HttpRequest, HttpResponse, ResponseError,
    error::JsonPayloadError,
    http::{StatusCode, header},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    /// Any kind of IO errors
    #[error("{0}\ncaused by: {1}")]
    IoError(String, std::io::Error),

    /// None of the configured interfaces could be bound
    #[error("Failed to bind any of the configured interfaces on port {0}")]
    NoBindableInterface(u16),
}

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    /// Port conflicts or invalid port ranges
    #[error("Port {port} is invalid or unavailable.\nSuggestion: {suggestion}")]
    PortError { port: u16, suggestion: String },

    /// Invalid base directory
    #[error("Path '{path}' is invalid: {reason}.\nSuggestion: {suggestion}")]
    PathError {
        path: String,
        reason: String,
        suggestion: String,
    },

    /// Listing suffix that can never match a plain file name
    #[error("Suffix '{suffix}' is invalid: {reason}.\nSuggestion: {suggestion}")]
    SuffixError {
        suffix: String,
        reason: String,
        suggestion: String,
    },

    /// Inconsistent rate limit or request size settings
    #[error("Security configuration error: {reason}.\nSuggestion: {suggestion}")]
    SecurityError { reason: String, suggestion: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A required request field was missing, empty or unparsable
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The configuration name would not resolve to a plain file inside the base directory
    #[error("Invalid configuration name '{name}'\nReason: {reason}")]
    InvalidName { name: String, reason: String },

    /// A configuration with that name is already present
    #[error("Configuration '{0}' already exists")]
    Conflict(String),

    /// No configuration file with that name
    #[error("Configuration '{0}' could not be found")]
    NotFound(String),

    /// Any filesystem failure, together with the message shown to the client
    #[error("I/O operation failed: {message}\nPath: {path}\nCaused by: {source}")]
    IoError {
        message: &'static str,
        path: String,
        source: std::io::Error,
    },

    /// Might occur when trying to access a route that does not exist
    #[error("Route {0} could not be found")]
    RouteNotFound(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuntimeError {
    /// Wraps an IO error with the message the client will see
    pub fn io(message: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message,
            path: path.into(),
            source,
        }
    }

    /// The body sent back to the client; the full chain only goes to the log
    pub fn body(&self) -> ErrorBody {
        use RuntimeError as E;
        match self {
            E::BadRequest(msg) => ErrorBody {
                message: msg.clone(),
                error: None,
            },
            E::InvalidName { reason, .. } => ErrorBody {
                message: format!("Invalid configuration name: {reason}"),
                error: None,
            },
            E::Conflict(_) => ErrorBody {
                message: "Configuration file already exists".to_string(),
                error: None,
            },
            E::NotFound(_) => ErrorBody {
                message: "Configuration not found".to_string(),
                error: None,
            },
            E::IoError {
                message, source, ..
            } => ErrorBody {
                message: message.to_string(),
                error: Some(source.to_string()),
            },
            E::RouteNotFound(route) => ErrorBody {
                message: format!("Route {route} could not be found"),
                error: None,
            },
        }
    }
}

impl ResponseError for RuntimeError {
    fn status_code(&self) -> StatusCode {
        use RuntimeError as E;
        use StatusCode as S;
        match self {
            E::BadRequest(_) => S::BAD_REQUEST,
            E::InvalidName { .. } => S::BAD_REQUEST,
            // Duplicate names are reported as a plain 400, same as missing fields
            E::Conflict(_) => S::BAD_REQUEST,
            E::NotFound(_) => S::NOT_FOUND,
            E::IoError { .. } => S::INTERNAL_SERVER_ERROR,
            E::RouteNotFound(_) => S::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log_error_chain(self.to_string());

        HttpResponse::build(self.status_code())
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(self.body())
    }
}

/// Turns JSON extractor failures into the regular error body
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let reason = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "Request body is too large".to_string()
        }
        JsonPayloadError::ContentType => "Expected a JSON request body".to_string(),
        _ => format!("Malformed request body: {err}"),
    };
    RuntimeError::BadRequest(reason).into()
}

pub fn log_error_chain(description: String) {
    for cause in description.lines() {
        log::error!("{cause}");
    }
}

/// Log configuration validation failures with structured context
pub fn log_validation_failure(error: &ConfigValidationError, context: &str) {
    match error {
        ConfigValidationError::PortError { port, .. } => {
            log::error!(
                "Configuration validation failed in {context}: Port conflict on port {port}"
            );
        }
        ConfigValidationError::PathError { path, reason, .. } => {
            log::error!(
                "Configuration validation failed in {context}: Path error for '{path}' - {reason}"
            );
        }
        ConfigValidationError::SuffixError { suffix, reason, .. } => {
            log::error!(
                "Configuration validation failed in {context}: Suffix error for '{suffix}' - {reason}"
            );
        }
        ConfigValidationError::SecurityError { reason, .. } => {
            log::error!("Configuration validation failed in {context}: Security error - {reason}");
        }
    }
}
