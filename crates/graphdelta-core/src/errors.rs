use graphdelta_core_types::RunId;
use thiserror::Error;

/// Result type alias using GraphDeltaError
pub type Result<T> = std::result::Result<T, GraphDeltaError>;

/// Result type alias using the structured ExError
pub type ExResult<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the encoder, the versioning handler, the delta
/// engine or a store adapter is classified by one of these kinds. Each kind
/// maps to a stable code used by callers to choose skip-or-abort and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input / model
    InvalidInput,
    InvalidRange,
    NotFound,

    // Encoding and identity
    /// Malformed statement; never retried, the containing batch rolls back
    Encoding,
    /// A hash index hit points at a relationship with different endpoints
    HashCollision,

    // Delta
    /// An attribute path cannot be resolved against the record graph
    SchemaResolution,
    /// Live statements were left without a delta mark
    MatchingIncomplete,
    DeterminismViolation,

    // Store
    /// Transient transaction failure; retried once by the engine
    StoreTransaction,
    Persistence,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidRange => "ERR_INVALID_RANGE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Encoding => "ERR_ENCODING",
            ExErrorKind::HashCollision => "ERR_HASH_COLLISION_INVARIANT_VIOLATION",
            ExErrorKind::SchemaResolution => "ERR_SCHEMA_RESOLUTION",
            ExErrorKind::MatchingIncomplete => "ERR_MATCHING_INCOMPLETE",
            ExErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            ExErrorKind::StoreTransaction => "ERR_STORE_TRANSACTION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the graph context (record, data model,
/// run) the failure happened in.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    record_uri: Option<String>,
    data_model: Option<String>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            record_uri: None,
            data_model: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node/relationship/statement id context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add record URI context
    pub fn with_record_uri(mut self, uri: impl Into<String>) -> Self {
        self.record_uri = Some(uri.into());
        self
    }

    /// Add data model context
    pub fn with_data_model(mut self, data_model: impl Into<String>) -> Self {
        self.data_model = Some(data_model.into());
        self
    }

    /// Add run id context
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn record_uri(&self) -> Option<&str> {
        self.record_uri.as_deref()
    }

    pub fn data_model(&self) -> Option<&str> {
        self.data_model.as_deref()
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Whether the engine may retry the failed batch once
    pub fn is_retryable(&self) -> bool {
        self.kind == ExErrorKind::StoreTransaction
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(record_uri) = &self.record_uri {
            write!(f, " (record_uri: {})", record_uri)?;
        }
        if let Some(data_model) = &self.data_model {
            write!(f, " (data_model: {})", data_model)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Typed domain failures raised by the model, encoder and delta engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphDeltaError {
    /// Statement cannot be encoded (missing or contradictory parts)
    #[error("Malformed statement: {reason}")]
    MalformedStatement { reason: String },

    /// Range with from > to
    #[error("Invalid range: from {from} is greater than to {to}")]
    InvalidRange { from: i64, to: i64 },

    /// Attribute path without any attribute
    #[error("Attribute path must contain at least one attribute")]
    EmptyAttributePath,

    /// Unknown node type name
    #[error("Unknown node type: {name}")]
    UnknownNodeType { name: String },

    /// Unknown delta state name
    #[error("Unknown delta state: {name}")]
    UnknownDeltaState { name: String },

    /// Hash index points at a relationship with different content
    #[error("Statement hash {hash} already registered for relationship {existing_rel}")]
    HashCollision { hash: String, existing_rel: String },

    /// Attribute path does not resolve in the record graph
    #[error("Attribute path '{path}' cannot be resolved for record {record_uri}: {reason}")]
    UnresolvablePath {
        path: String,
        record_uri: String,
        reason: String,
    },

    /// Record root node missing for the given data model
    #[error("Record not found: {record_uri} in data model {data_model}")]
    RecordNotFound {
        record_uri: String,
        data_model: String,
    },

    /// Node or relationship id unknown to the store
    #[error("Graph element not found: {element}")]
    ElementNotFound { element: String },

    /// Statements left unmarked after all matchers ran
    #[error("Graph matching incomplete: {unmatched} unmatched statements in record {record_uri}")]
    MatchingIncomplete { record_uri: String, unmatched: usize },

    /// Transaction lifecycle misuse or transient store failure
    #[error("Store transaction failed: {reason}")]
    Transaction { reason: String },

    /// Serialization failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for GraphDeltaError {
    fn from(err: serde_json::Error) -> Self {
        GraphDeltaError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<GraphDeltaError> for ExError {
    fn from(err: GraphDeltaError) -> Self {
        let message = err.to_string();
        match err {
            GraphDeltaError::MalformedStatement { .. } => {
                ExError::new(ExErrorKind::Encoding).with_message(message)
            }
            GraphDeltaError::InvalidRange { .. } => {
                ExError::new(ExErrorKind::InvalidRange).with_message(message)
            }
            GraphDeltaError::EmptyAttributePath
            | GraphDeltaError::UnknownNodeType { .. }
            | GraphDeltaError::UnknownDeltaState { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            GraphDeltaError::HashCollision { hash, .. } => ExError::new(ExErrorKind::HashCollision)
                .with_entity_id(hash)
                .with_message(message),
            GraphDeltaError::UnresolvablePath { record_uri, .. } => {
                ExError::new(ExErrorKind::SchemaResolution)
                    .with_record_uri(record_uri)
                    .with_message(message)
            }
            GraphDeltaError::RecordNotFound {
                record_uri,
                data_model,
            } => ExError::new(ExErrorKind::NotFound)
                .with_record_uri(record_uri)
                .with_data_model(data_model)
                .with_message(message),
            GraphDeltaError::ElementNotFound { element } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(element)
                .with_message(message),
            GraphDeltaError::MatchingIncomplete { record_uri, .. } => {
                ExError::new(ExErrorKind::MatchingIncomplete)
                    .with_record_uri(record_uri)
                    .with_message(message)
            }
            GraphDeltaError::Transaction { .. } => {
                ExError::new(ExErrorKind::StoreTransaction).with_message(message)
            }
            GraphDeltaError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExErrorKind::Encoding.code(), "ERR_ENCODING");
        assert_eq!(
            ExErrorKind::HashCollision.code(),
            "ERR_HASH_COLLISION_INVARIANT_VIOLATION"
        );
        assert_eq!(
            ExErrorKind::SchemaResolution.code(),
            "ERR_SCHEMA_RESOLUTION"
        );
        assert_eq!(
            ExErrorKind::StoreTransaction.code(),
            "ERR_STORE_TRANSACTION"
        );
    }

    #[test]
    fn test_only_store_transaction_is_retryable() {
        assert!(ExError::new(ExErrorKind::StoreTransaction).is_retryable());
        assert!(!ExError::new(ExErrorKind::Encoding).is_retryable());
        assert!(!ExError::new(ExErrorKind::HashCollision).is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::SchemaResolution)
            .with_op("match_entities")
            .with_record_uri("http://example.org/r1")
            .with_message("no anchor");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_SCHEMA_RESOLUTION] in operation 'match_entities'"));
        assert!(text.contains("no anchor"));
        assert!(text.contains("record_uri: http://example.org/r1"));
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: ExError = GraphDeltaError::MalformedStatement {
            reason: "literal subject".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::Encoding);

        let err: ExError = GraphDeltaError::UnresolvablePath {
            path: "a".to_string(),
            record_uri: "r".to_string(),
            reason: "missing".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::SchemaResolution);
        assert_eq!(err.record_uri(), Some("r"));
    }
}
