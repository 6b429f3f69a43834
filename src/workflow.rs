//! End-to-end validation workflow.
//!
//! Chains the full pipeline for callers that do not need the intermediate
//! steps: resolve capabilities, build the GetFeature URL, fetch the features,
//! and validate them against the supplied schema. Both network fetches go
//! through one shared [`DocumentFetcher`], so the capabilities document is
//! fetched exactly once for the whole run.

use std::sync::Arc;

use crate::capabilities::CapabilitiesResolver;
use crate::error::{Result, WfsError};
use crate::fetcher::{DocumentFetcher, FetcherConfig};
use crate::schema::SchemaRef;
use crate::validator::{ErrorLogMode, FeatureValidator, ValidationReport};

/// Parameters for one validation run.
#[derive(Debug, Clone)]
pub struct WfsValidationRequest {
    /// URL of the WFS GetCapabilities document
    pub capabilities_url: String,
    /// Qualified name of the feature type to validate
    pub feature_type: String,
    /// Maximum number of features to request
    pub max_features: u32,
    /// Error log assembly mode for the report
    pub error_log_mode: ErrorLogMode,
}

impl WfsValidationRequest {
    pub fn new(
        capabilities_url: impl Into<String>,
        feature_type: impl Into<String>,
        max_features: u32,
    ) -> Self {
        Self {
            capabilities_url: capabilities_url.into(),
            feature_type: feature_type.into(),
            max_features,
            error_log_mode: ErrorLogMode::default(),
        }
    }
}

/// Run the whole pipeline with a freshly constructed HTTP fetcher.
pub async fn validate_wfs(
    request: &WfsValidationRequest,
    schema: &SchemaRef,
    config: FetcherConfig,
) -> Result<ValidationReport> {
    let fetcher = Arc::new(DocumentFetcher::new(config)?);
    validate_wfs_with_fetcher(request, schema, fetcher).await
}

/// Run the whole pipeline over a caller-supplied fetcher.
///
/// The fetcher's cache scopes this run: reusing one across runs also reuses
/// its cached documents and terminal failures.
pub async fn validate_wfs_with_fetcher(
    request: &WfsValidationRequest,
    schema: &SchemaRef,
    fetcher: Arc<DocumentFetcher>,
) -> Result<ValidationReport> {
    let resolver = CapabilitiesResolver::new(&request.capabilities_url, Arc::clone(&fetcher));

    let version = resolver.protocol_version().await?;
    if !version.is_known() {
        return Err(WfsError::UnknownProtocolVersion {
            found: resolver.raw_protocol_version().await?,
        });
    }

    let get_feature_url = resolver
        .build_get_feature_url(&request.feature_type, request.max_features)
        .await?;

    let validator = FeatureValidator::new(get_feature_url, &request.feature_type, fetcher)
        .with_error_log_mode(request.error_log_mode);
    validator.validate(schema).await
}
