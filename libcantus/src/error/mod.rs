//! Error types for Cantus
//!
//! Every operation in the crate returns a [`CantusError`]. The variants form
//! the taxonomy callers branch on: validation failures that are detected
//! before any network call, upstream failures attributed to the registry that
//! produced them, and protocol violations from otherwise successful
//! responses.
//!
//! Two variants, [`CantusError::Network`] and [`CantusError::Server`], are
//! transient. They are produced by the protocol client and consumed by the
//! retry layer, which either retries them or wraps them into
//! [`CantusError::SourceSystem`] once the retry budget is spent.

use serde::Serialize;
use thiserror::Error;


type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for Cantus operations
#[derive(Error, Debug)]
pub enum CantusError {
    /// The image reference does not have the `registry/group/name[:tag]` shape,
    /// or names a registry that is not allowed.
    #[error("Malformed reference '{reference}': {message}")]
    MalformedReference { reference: String, message: String },

    /// The registry requires a credential and none (or an invalid one) was given
    #[error("Authentication required for registry {registry}: {message}")]
    AuthRequired { registry: String, message: String },

    /// Empty tag list, missing manifest or blob (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// A successful response is missing a mandatory header or field
    #[error("Protocol violation from registry {registry}: {message}")]
    ProtocolViolation { registry: String, message: String },

    /// Upstream failure attributed to a specific registry
    #[error("Error from registry {registry}: {message}")]
    SourceSystem {
        registry: String,
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// The request cannot be performed as given (e.g. a manifest lookup without a tag)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Transport failure (connect, timeout, reset). Transient.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// 5xx response from the registry. Transient.
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    /// Anything that does not fit the taxonomy above
    #[error("Unexpected error: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Result type alias for Cantus operations
pub type Result<T> = std::result::Result<T, CantusError>;

/// Stable, payload-free classification of a [`CantusError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MalformedReference,
    AuthRequired,
    NotFound,
    ProtocolViolation,
    SourceSystem,
    InvalidRequest,
    Network,
    Server,
    Config,
    Unexpected,
}

impl ErrorKind {
    /// Same name as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedReference => "MALFORMED_REFERENCE",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::NotFound => "NOT_FOUND",
            Self::ProtocolViolation => "PROTOCOL_VIOLATION",
            Self::SourceSystem => "SOURCE_SYSTEM",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Network => "NETWORK",
            Self::Server => "SERVER",
            Self::Config => "CONFIG",
            Self::Unexpected => "UNEXPECTED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CantusError {
    /// Creates a new malformed reference error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::error::CantusError;
    ///
    /// let err = CantusError::malformed_reference("docker.com/group", "expected 3 or 4 segments");
    /// assert!(err.to_string().contains("docker.com/group"));
    /// ```
    pub fn malformed_reference<R, M>(reference: R, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        Self::MalformedReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Creates a new authentication error for a registry.
    pub fn auth_required<R, M>(registry: R, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        Self::AuthRequired {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::error::CantusError;
    ///
    /// let err = CantusError::not_found("tags", "group/name");
    /// assert!(matches!(err, CantusError::NotFound { .. }));
    /// ```
    pub fn not_found<T, N>(resource_type: T, name: N) -> Self
    where
        T: Into<String>,
        N: Into<String>,
    {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new protocol violation error.
    pub fn protocol_violation<R, M>(registry: R, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        Self::ProtocolViolation {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new source system error without a cause.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::error::CantusError;
    ///
    /// let err = CantusError::source_system("docker.example.com", "unsupported schema");
    /// assert_eq!(err.registry(), Some("docker.example.com"));
    /// ```
    pub fn source_system<R, M>(registry: R, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        Self::SourceSystem {
            registry: registry.into(),
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Creates a new source system error for a terminal HTTP status.
    pub fn source_system_status<R, M>(registry: R, message: M, status_code: u16) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        Self::SourceSystem {
            registry: registry.into(),
            message: message.into(),
            status_code: Some(status_code),
            source: None,
        }
    }

    /// Creates a new source system error wrapping a cause.
    pub fn source_system_with_source<R, M, E>(registry: R, message: M, source: E) -> Self
    where
        R: Into<String>,
        M: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SourceSystem {
            registry: registry.into(),
            message: message.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new invalid request error.
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::error::CantusError;
    ///
    /// let err = CantusError::network("connection refused");
    /// assert!(err.is_transient());
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new server error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::error::CantusError;
    ///
    /// let err = CantusError::server("internal server error", 500);
    /// assert!(matches!(err, CantusError::Server { .. }));
    /// ```
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new unexpected error with a source error.
    pub fn unexpected_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedReference { .. } => ErrorKind::MalformedReference,
            Self::AuthRequired { .. } => ErrorKind::AuthRequired,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
            Self::SourceSystem { .. } => ErrorKind::SourceSystem,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Config { .. } => ErrorKind::Config,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Returns true for failures worth retrying: 5xx responses and transport errors.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }

    /// Returns the registry this error is attributed to, if any.
    pub fn registry(&self) -> Option<&str> {
        match self {
            Self::AuthRequired { registry, .. }
            | Self::ProtocolViolation { registry, .. }
            | Self::SourceSystem { registry, .. } => Some(registry),
            _ => None,
        }
    }

    /// Wraps a transient error into a [`CantusError::SourceSystem`] attributed
    /// to `registry`. Terminal errors are returned unchanged.
    pub fn into_source_system(self, registry: &str, attempts: u32, context: &str) -> Self {
        match self {
            Self::Server {
                message,
                status_code,
            } => Self::SourceSystem {
                registry: registry.to_string(),
                message: format!(
                    "Retry failed after {} attempts status={} lastError={} {}",
                    attempts, status_code, message, context
                ),
                status_code: Some(status_code),
                source: None,
            },
            err @ Self::Network { .. } => Self::SourceSystem {
                registry: registry.to_string(),
                message: format!(
                    "Retry failed after {} attempts lastError={} {}",
                    attempts, err, context
                ),
                status_code: None,
                source: Some(Box::new(err)),
            },
            other => other,
        }
    }
}

impl From<config::ConfigError> for CantusError {
    fn from(err: config::ConfigError) -> Self {
        CantusError::config_with_source("Configuration error", None, err)
    }
}
