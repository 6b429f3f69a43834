//! # wfs-validate
//!
//! Capabilities discovery and XSD schema validation for OGC Web Feature
//! Services (WFS).
//!
//! Given a GetCapabilities URL, the crate detects the WFS protocol version
//! (1.0.0, 1.1.0, or 2.0.0), lists the advertised feature types, builds a
//! GetFeature request URL, and validates the returned features against a
//! caller-supplied XML Schema, producing a structured [`ValidationReport`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use wfs_validate::{CapabilitiesResolver, DocumentFetcher, FeatureValidator, FetcherConfig, SchemaRef};
//!
//! # async fn run() -> wfs_validate::Result<()> {
//! let fetcher = Arc::new(DocumentFetcher::new(FetcherConfig::default())?);
//! let resolver = CapabilitiesResolver::new("http://example.com/wfs?request=GetCapabilities", Arc::clone(&fetcher));
//!
//! let feature_types = resolver.feature_type_names().await?;
//! let url = resolver.build_get_feature_url(&feature_types[0], 10).await?;
//!
//! let xsd_bytes: &[u8] = b"..."; // compiled XSD for the content-model version
//! let schema = SchemaRef::from_buffer(xsd_bytes)?;
//! let report = FeatureValidator::new(url, &feature_types[0], fetcher)
//!     .validate(&schema)
//!     .await?;
//! println!("{}/{} valid", report.valid_count, report.total_element_count);
//! # Ok(())
//! # }
//! ```

pub mod capabilities;
pub mod error;
pub mod fetcher;
pub mod schema;
pub mod validator;
pub mod workflow;

mod xml;

pub use capabilities::{CapabilitiesResolver, WfsVersion};
pub use error::{FetchFailure, Result, WfsError};
pub use fetcher::{
    DocumentFetcher, FetchOutcome, FetcherConfig, HttpTransport, Transport, TransportResponse,
};
pub use schema::SchemaRef;
pub use validator::{ElementResult, ErrorLogMode, FeatureValidator, ValidationReport};
pub use workflow::{WfsValidationRequest, validate_wfs, validate_wfs_with_fetcher};
