use thiserror::Error;

/// Failure half of a fetch outcome.
///
/// These are cached alongside successful payloads: a failed fetch or parse is
/// terminal for the owning request scope, and later callers get a clone of the
/// same failure without any new network I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("network error: {details}")]
    Network { details: String },

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("XML parse error: {message}")]
    Parse { message: String },
}

/// Main error type for the WFS validation pipeline.
#[derive(Error, Debug)]
pub enum WfsError {
    /// The capabilities or GetFeature document could not be fetched or parsed.
    #[error("document unavailable: {url} - {failure}")]
    DocumentUnavailable { url: String, failure: FetchFailure },

    /// The capabilities document advertises a version this crate does not
    /// understand (or no version at all).
    #[error("could not determine WFS version (found {found:?})")]
    UnknownProtocolVersion { found: Option<String> },

    /// The requested feature type is not among those the WFS advertises.
    #[error("feature type not advertised by this WFS: {name}")]
    InvalidFeatureType { name: String },

    /// No GetFeature endpoint could be resolved from the capabilities
    /// document for this protocol version.
    #[error("could not determine the GetFeature URL (version {version})")]
    UnresolvableOperation { version: String },

    /// The supplied XSD could not be compiled, or the schema engine failed
    /// internally during validation.
    #[error("schema error: {details}")]
    SchemaParsing { details: String },

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl WfsError {
    /// Distinguishes caller-input errors ("bad request") from transport and
    /// upstream errors ("upstream unavailable") so a presentation layer can
    /// report them differently.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            WfsError::InvalidFeatureType { .. } | WfsError::UnknownProtocolVersion { .. }
        )
    }
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("schema parsing failed: document is not a valid XML Schema")]
    SchemaParseFailed,

    #[error("validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("schema validation internal error: code {code}")]
    InternalError { code: i32 },
}

impl From<LibXml2Error> for WfsError {
    fn from(err: LibXml2Error) -> Self {
        WfsError::SchemaParsing {
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WfsError>;

/// LibXML2 result type alias
pub(crate) type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
