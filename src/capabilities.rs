//! WFS GetCapabilities resolution.
//!
//! A [`CapabilitiesResolver`] fetches a GetCapabilities document once,
//! classifies its WFS protocol version, lists the advertised feature types,
//! and composes GetFeature request URLs. Fetch and parse happen at most once
//! per resolver; the extracted summary (or the terminal failure) is cached
//! behind a single-flight cell, so repeated and concurrent queries never
//! trigger duplicate network I/O.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{FetchFailure, Result, WfsError};
use crate::fetcher::DocumentFetcher;
use crate::xml::XmlDocument;

const WFS_NS: &str = "http://www.opengis.net/wfs";
const WFS_20_NS: &str = "http://www.opengis.net/wfs/2.0";
const OWS_NS: &str = "http://www.opengis.net/ows";
const OWS_11_NS: &str = "http://www.opengis.net/ows/1.1";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// WFS protocol versions this crate understands.
///
/// Anything else a server advertises classifies as `Unknown`, which degrades
/// gracefully: the feature-type list is empty and no GetFeature URL can be
/// built, but nothing hard-fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WfsVersion {
    V1_0_0,
    V1_1_0,
    V2_0_0,
    Unknown,
}

impl WfsVersion {
    /// Classify a raw `version` attribute value.
    pub fn classify(raw: &str) -> Self {
        match raw.trim() {
            "1.0.0" => WfsVersion::V1_0_0,
            "1.1.0" => WfsVersion::V1_1_0,
            "2.0.0" => WfsVersion::V2_0_0,
            _ => WfsVersion::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WfsVersion::V1_0_0 => "1.0.0",
            WfsVersion::V1_1_0 => "1.1.0",
            WfsVersion::V2_0_0 => "2.0.0",
            WfsVersion::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, WfsVersion::Unknown)
    }
}

impl fmt::Display for WfsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace mapping and path for one version-dependent lookup.
struct VersionedQuery {
    namespaces: &'static [(&'static str, &'static str)],
    path: &'static str,
}

/// Lookup table for listing advertised feature types.
///
/// Groups 1.0.0 with 1.1.0 (unversioned wfs namespace) against 2.0.0
/// (versioned namespace). This grouping is independent of the GetFeature
/// endpoint table below; the two operations group the versions differently.
fn feature_type_lookup(version: WfsVersion) -> Option<VersionedQuery> {
    const PATH: &str = "//wfs:FeatureTypeList/wfs:FeatureType/wfs:Name";
    match version {
        WfsVersion::V1_0_0 | WfsVersion::V1_1_0 => Some(VersionedQuery {
            namespaces: &[("wfs", WFS_NS)],
            path: PATH,
        }),
        WfsVersion::V2_0_0 => Some(VersionedQuery {
            namespaces: &[("wfs", WFS_20_NS)],
            path: PATH,
        }),
        WfsVersion::Unknown => None,
    }
}

/// Lookup table for the GetFeature operation's HTTP GET endpoint.
///
/// Groups 1.1.0 with 2.0.0 (OGC OperationsMetadata section) against 1.0.0
/// (WFS Capability/Request section). 2.0.0 uses the OWS 1.1 namespace and the
/// versioned wfs namespace for any wfs-scoped lookups.
fn get_feature_lookup(version: WfsVersion) -> Option<VersionedQuery> {
    const OPERATIONS_PATH: &str = "//ows:OperationsMetadata\
        /ows:Operation[@name='GetFeature']/ows:DCP/ows:HTTP/ows:Get/@xlink:href";
    match version {
        WfsVersion::V1_0_0 => Some(VersionedQuery {
            namespaces: &[("wfs", WFS_NS)],
            path: "//wfs:Capability/wfs:Request/wfs:GetFeature\
                /wfs:DCPType/wfs:HTTP/wfs:Get/@onlineResource",
        }),
        WfsVersion::V1_1_0 => Some(VersionedQuery {
            namespaces: &[("ows", OWS_NS), ("xlink", XLINK_NS)],
            path: OPERATIONS_PATH,
        }),
        WfsVersion::V2_0_0 => Some(VersionedQuery {
            namespaces: &[("ows", OWS_11_NS), ("xlink", XLINK_NS), ("wfs", WFS_20_NS)],
            path: OPERATIONS_PATH,
        }),
        WfsVersion::Unknown => None,
    }
}

/// Everything extracted from a capabilities document in one pass, while the
/// parsed tree is alive.
#[derive(Debug, Clone)]
struct CapabilitiesSummary {
    version: WfsVersion,
    version_raw: Option<String>,
    feature_types: Vec<String>,
    get_feature_base: Option<String>,
}

/// Resolves a WFS GetCapabilities document.
///
/// A fetch or parse failure is terminal for the resolver: every later call
/// short-circuits with the same `DocumentUnavailable` error and no further
/// network I/O. Construct a fresh resolver to retry.
pub struct CapabilitiesResolver {
    url: String,
    fetcher: Arc<DocumentFetcher>,
    summary: OnceCell<std::result::Result<Arc<CapabilitiesSummary>, FetchFailure>>,
}

impl CapabilitiesResolver {
    pub fn new(url: impl Into<String>, fetcher: Arc<DocumentFetcher>) -> Self {
        Self {
            url: url.into(),
            fetcher,
            summary: OnceCell::new(),
        }
    }

    /// The capabilities URL this resolver was built from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch, parse, and extract once; replay the cached outcome afterwards.
    async fn summary(&self) -> Result<Arc<CapabilitiesSummary>> {
        let outcome = self
            .summary
            .get_or_init(|| async {
                let bytes = self.fetcher.fetch(&self.url).await.into_result()?;
                let summary = Self::extract(&self.url, &bytes)?;
                Ok(Arc::new(summary))
            })
            .await;

        outcome.clone().map_err(|failure| WfsError::DocumentUnavailable {
            url: self.url.clone(),
            failure,
        })
    }

    /// Parse the document and pull out everything the resolver serves later.
    /// Runs synchronously; the parsed tree never crosses an await point.
    fn extract(
        url: &str,
        bytes: &[u8],
    ) -> std::result::Result<CapabilitiesSummary, FetchFailure> {
        let doc = XmlDocument::parse_from_memory(bytes, url)
            .map_err(|message| FetchFailure::Parse { message })?;

        let version_raw = doc.root_attribute("version");
        let version = version_raw
            .as_deref()
            .map(WfsVersion::classify)
            .unwrap_or(WfsVersion::Unknown);

        let feature_types = match feature_type_lookup(version) {
            Some(query) => doc
                .xpath_nodes(query.path, query.namespaces)
                .iter()
                .map(|node| node.text_content())
                .collect(),
            None => {
                warn!(url, version = ?version_raw, "could not determine WFS version");
                Vec::new()
            }
        };

        let get_feature_base = get_feature_lookup(version).and_then(|query| {
            doc.xpath_nodes(query.path, query.namespaces)
                .first()
                .map(|node| node.text_content())
        });

        debug!(
            url,
            %version,
            feature_types = feature_types.len(),
            has_get_feature = get_feature_base.is_some(),
            "capabilities resolved"
        );

        Ok(CapabilitiesSummary {
            version,
            version_raw,
            feature_types,
            get_feature_base,
        })
    }

    /// The WFS protocol version advertised by the document root.
    ///
    /// `Unknown` is a classification, not an error; fetch and parse failures
    /// surface as [`WfsError::DocumentUnavailable`].
    pub async fn protocol_version(&self) -> Result<WfsVersion> {
        Ok(self.summary().await?.version)
    }

    /// The verbatim `version` attribute, for diagnostics.
    pub async fn raw_protocol_version(&self) -> Result<Option<String>> {
        Ok(self.summary().await?.version_raw.clone())
    }

    /// Names of the advertised feature types, in document order.
    ///
    /// Empty when the protocol version is unknown.
    pub async fn feature_type_names(&self) -> Result<Vec<String>> {
        Ok(self.summary().await?.feature_types.clone())
    }

    /// Whether the resolver points at a usable capabilities document.
    pub async fn is_valid(&self) -> bool {
        matches!(self.summary().await, Ok(summary) if summary.version.is_known())
    }

    /// Compose a GetFeature request URL for an advertised feature type.
    ///
    /// Fails with [`WfsError::UnresolvableOperation`] when the protocol
    /// version is unsupported or the document does not describe a GetFeature
    /// HTTP GET endpoint, and with [`WfsError::InvalidFeatureType`] when the
    /// feature type is not advertised.
    pub async fn build_get_feature_url(
        &self,
        feature_type: &str,
        max_features: u32,
    ) -> Result<String> {
        let summary = self.summary().await?;

        if !summary.version.is_known() {
            return Err(WfsError::UnresolvableOperation {
                version: summary
                    .version_raw
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            });
        }

        if !summary.feature_types.iter().any(|name| name == feature_type) {
            return Err(WfsError::InvalidFeatureType {
                name: feature_type.to_string(),
            });
        }

        let base = summary
            .get_feature_base
            .as_deref()
            .ok_or_else(|| WfsError::UnresolvableOperation {
                version: summary.version.to_string(),
            })?;

        let query = format!(
            "service=WFS&version={}&request=GetFeature&typename={}&maxfeatures={}",
            summary.version, feature_type, max_features
        );
        Ok(join_query(base, &query))
    }
}

/// Append a query string to a base URL, picking `?` or `&` depending on
/// whether the base already carries a query. Capabilities documents commonly
/// advertise bases that already end in `?` or `&`.
fn join_query(base: &str, query: &str) -> String {
    if base.contains('?') {
        if base.ends_with('?') || base.ends_with('&') {
            format!("{base}{query}")
        } else {
            format!("{base}&{query}")
        }
    } else {
        format!("{base}?{query}")
    }
}
