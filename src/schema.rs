//! Compiled-schema handle consumed by the validation pipeline.

use crate::error::{LibXml2Result, Result, WfsError};
use crate::xml::{NodeRef, ValidationResult, XmlSchemaPtr};

/// Opaque handle to a compiled XSD schema.
///
/// The pipeline only consumes these; they are supplied by the layer that owns
/// the content-model definitions. Cloning is cheap and the handle can be
/// shared across threads, so one compiled schema can serve many concurrent
/// validation workflows.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    schema: XmlSchemaPtr,
}

impl SchemaRef {
    /// Compile an XML Schema from its raw bytes.
    pub fn from_buffer(schema_data: &[u8]) -> Result<Self> {
        let schema = XmlSchemaPtr::from_buffer(schema_data).map_err(WfsError::from)?;
        Ok(Self { schema })
    }

    /// Validate one element subtree, capturing this call's error log.
    pub(crate) fn validate_element(&self, element: &NodeRef<'_>) -> LibXml2Result<ValidationResult> {
        self.schema.validate_element(element)
    }
}
