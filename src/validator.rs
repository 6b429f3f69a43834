//! GetFeature fetching and per-element schema validation.
//!
//! A [`FeatureValidator`] fetches a GetFeature document (via the shared
//! [`DocumentFetcher`]), selects every element matching the requested
//! feature type's qualified name, validates each one against a caller-supplied
//! schema, and assembles a [`ValidationReport`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FetchFailure, Result, WfsError};
use crate::fetcher::DocumentFetcher;
use crate::schema::SchemaRef;
use crate::xml::{ValidationResult, XmlDocument};

/// How the report's schema error log is assembled across elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorLogMode {
    /// Capture each element's violations immediately after its validation and
    /// append them in document order, giving a complete audit trail.
    #[default]
    FullAudit,
    /// Overwrite the log after every element, so only the final element's
    /// violations survive. Matches the reports produced by the original
    /// implementation, whose shared engine log was read once at the end.
    LastElementOnly,
}

/// Result of validating a single feature element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementResult {
    /// Label identifying the element: its `id` attribute when present,
    /// otherwise the qualified name with a 1-based document-order index.
    pub element: String,
    pub is_valid: bool,
}

/// Structured outcome of one validation run.
///
/// Created fresh per [`FeatureValidator::validate`] call and owned by the
/// caller; counts always satisfy `valid_count + invalid_count ==
/// total_element_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of elements that matched the requested feature type
    pub total_element_count: usize,
    /// Per-element outcomes in document order
    pub per_element_results: Vec<ElementResult>,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Schema violation messages, assembled per the validator's
    /// [`ErrorLogMode`]
    pub schema_error_log: Vec<String>,
}

impl ValidationReport {
    fn assemble(per_element_results: Vec<ElementResult>, schema_error_log: Vec<String>) -> Self {
        let valid_count = per_element_results.iter().filter(|r| r.is_valid).count();
        let invalid_count = per_element_results.len() - valid_count;
        Self {
            total_element_count: per_element_results.len(),
            per_element_results,
            valid_count,
            invalid_count,
            schema_error_log,
        }
    }

    /// True when every matched element validated.
    pub fn is_valid(&self) -> bool {
        self.invalid_count == 0
    }
}

/// Validates the features returned by a resolved GetFeature URL.
pub struct FeatureValidator {
    url: String,
    feature_type: String,
    fetcher: Arc<DocumentFetcher>,
    error_log_mode: ErrorLogMode,
}

impl FeatureValidator {
    /// `url` should come from
    /// [`CapabilitiesResolver::build_get_feature_url`](crate::CapabilitiesResolver::build_get_feature_url);
    /// `feature_type` is the qualified name whose elements get validated.
    pub fn new(
        url: impl Into<String>,
        feature_type: impl Into<String>,
        fetcher: Arc<DocumentFetcher>,
    ) -> Self {
        Self {
            url: url.into(),
            feature_type: feature_type.into(),
            fetcher,
            error_log_mode: ErrorLogMode::default(),
        }
    }

    pub fn with_error_log_mode(mut self, mode: ErrorLogMode) -> Self {
        self.error_log_mode = mode;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the GetFeature document and validate every matching element.
    ///
    /// Fetch and parse failures surface as [`WfsError::DocumentUnavailable`]
    /// and are terminal for this validator; validation itself is a pure
    /// function of the document and schema.
    pub async fn validate(&self, schema: &SchemaRef) -> Result<ValidationReport> {
        let bytes = self
            .fetcher
            .fetch(&self.url)
            .await
            .into_result()
            .map_err(|failure| WfsError::DocumentUnavailable {
                url: self.url.clone(),
                failure,
            })?;

        // Parsing and validation stay in one synchronous scope; the parsed
        // tree never crosses an await point.
        self.validate_document(&bytes, schema)
    }

    fn validate_document(&self, bytes: &[u8], schema: &SchemaRef) -> Result<ValidationReport> {
        let doc = XmlDocument::parse_from_memory(bytes, &self.url).map_err(|message| {
            WfsError::DocumentUnavailable {
                url: self.url.clone(),
                failure: FetchFailure::Parse { message },
            }
        })?;

        let (prefix, local_name) = split_qualified_name(&self.feature_type);

        // The prefix is resolved against the fetched document's own namespace
        // declarations rather than a fixed mapping.
        let Some(namespace) = doc.lookup_namespace(prefix) else {
            warn!(
                url = %self.url,
                feature_type = %self.feature_type,
                "feature type prefix not declared in GetFeature document"
            );
            return Ok(ValidationReport::assemble(Vec::new(), Vec::new()));
        };

        let expr = format!("//ft:{local_name}");
        let elements = doc.xpath_nodes(&expr, &[("ft", &namespace)]);

        let mut per_element_results = Vec::with_capacity(elements.len());
        let mut schema_error_log = Vec::new();

        for (index, element) in elements.iter().enumerate() {
            let outcome = schema.validate_element(element)?;
            let label = element
                .attribute("id")
                .unwrap_or_else(|| format!("{}[{}]", self.feature_type, index + 1));

            let element_errors = match outcome {
                ValidationResult::Valid => {
                    per_element_results.push(ElementResult {
                        element: label,
                        is_valid: true,
                    });
                    Vec::new()
                }
                ValidationResult::Invalid { errors, .. } => {
                    per_element_results.push(ElementResult {
                        element: label,
                        is_valid: false,
                    });
                    errors
                }
                // validate_element returns Err for internal errors
                ValidationResult::InternalError { .. } => unreachable!(),
            };

            match self.error_log_mode {
                ErrorLogMode::FullAudit => schema_error_log.extend(element_errors),
                ErrorLogMode::LastElementOnly => schema_error_log = element_errors,
            }
        }

        let report = ValidationReport::assemble(per_element_results, schema_error_log);
        debug!(
            url = %self.url,
            feature_type = %self.feature_type,
            total = report.total_element_count,
            invalid = report.invalid_count,
            "feature validation complete"
        );
        Ok(report)
    }
}

/// Split `prefix:local` into its parts; a bare name has no prefix and refers
/// to the document's default namespace.
fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
