//! LibXML2 FFI wrapper.
//!
//! Safe wrappers around the libxml2 calls this crate needs: document parsing
//! from memory, namespace-scoped XPath queries, and XML Schema validation of
//! individual elements.
//!
//! The Rust ecosystem has no mature pure-Rust XSD validator, so validation
//! goes through libxml2 directly. Direct FFI is used instead of a binding
//! crate for full control over error capture and memory management.
//!
//! Thread-safety notes (per <http://xmlsoft.org/threads.html>):
//! - Parser/global initialization is NOT thread-safe and is guarded by
//!   `std::sync::Once`.
//! - Schema parsing is NOT thread-safe; it happens once per schema.
//! - Validation IS thread-safe as long as each call uses its own validation
//!   context, which `validate_element` does.
//! - A parsed `XmlDocument` holds a raw pointer and is deliberately not
//!   `Send`: documents are parsed, queried, and dropped within one scope and
//!   never cross an await point.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::sync::{Arc, Once};

use libc::{c_char, c_double, c_int, c_void};

use crate::error::{LibXml2Error, LibXml2Result};

/// Global initialization flag for libxml2.
static LIBXML2_INIT: Once = Once::new();

fn init_libxml2() {
    LIBXML2_INIT.call_once(|| unsafe {
        xmlInitParser();
    });
}

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlNode {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlXPathContext {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

// Structures whose fields we read. Layouts match libxml2's public headers
// (tree.h, xpath.h, xmlerror.h) and are part of its stable ABI.
#[repr(C)]
pub struct XmlNs {
    pub next: *mut XmlNs,
    pub typ: c_int,
    pub href: *const c_char,
    pub prefix: *const c_char,
    pub _private: *mut c_void,
    pub context: *mut XmlDoc,
}

#[repr(C)]
pub struct XmlNodeSet {
    pub node_nr: c_int,
    pub node_max: c_int,
    pub node_tab: *mut *mut XmlNode,
}

#[repr(C)]
pub struct XmlXPathObject {
    pub typ: c_int,
    pub nodesetval: *mut XmlNodeSet,
    pub boolval: c_int,
    pub floatval: c_double,
    pub stringval: *mut c_char,
    pub user: *mut c_void,
    pub index: c_int,
    pub user2: *mut c_void,
    pub index2: c_int,
}

#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

/// xmlXPathObjectType value for node-set results
const XPATH_NODESET: c_int = 1;

// Parser option flags (xmlParserOption)
const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut XmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();

    // Document parsing and traversal
    fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    fn xmlFreeDoc(doc: *mut XmlDoc);
    fn xmlDocGetRootElement(doc: *const XmlDoc) -> *mut XmlNode;
    fn xmlGetProp(node: *const XmlNode, name: *const c_char) -> *mut c_char;
    fn xmlNodeGetContent(node: *const XmlNode) -> *mut c_char;
    fn xmlSearchNs(doc: *mut XmlDoc, node: *mut XmlNode, prefix: *const c_char) -> *mut XmlNs;
    fn xmlGetLastError() -> *const XmlError;

    // XPath
    fn xmlXPathNewContext(doc: *mut XmlDoc) -> *mut XmlXPathContext;
    fn xmlXPathFreeContext(ctxt: *mut XmlXPathContext);
    fn xmlXPathRegisterNs(
        ctxt: *mut XmlXPathContext,
        prefix: *const c_char,
        ns_uri: *const c_char,
    ) -> c_int;
    fn xmlXPathEvalExpression(
        expr: *const c_char,
        ctxt: *mut XmlXPathContext,
    ) -> *mut XmlXPathObject;
    fn xmlXPathFreeObject(obj: *mut XmlXPathObject);

    // Schema parsing
    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation
    fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaValidateOneElement(ctxt: *mut XmlSchemaValidCtxt, elem: *mut XmlNode) -> c_int;
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );

    // Deallocator for strings returned by xmlGetProp/xmlNodeGetContent
    static xmlFree: unsafe extern "C" fn(mem: *mut c_void);
}

/// Callback for libxml2 to report validation errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut XmlError) {
    let errors = unsafe { &mut *(user_data as *mut Vec<String>) };

    if !error.is_null() {
        let msg_ptr = unsafe { (*error).message };
        if !msg_ptr.is_null() {
            let c_str = unsafe { CStr::from_ptr(msg_ptr) };
            if let Ok(s) = c_str.to_str() {
                errors.push(s.trim().to_string());
            }
        }
    }
}

/// Take ownership of a libxml2-allocated string, freeing it with xmlFree.
unsafe fn take_xml_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(String::from);
    unsafe { xmlFree(ptr as *mut c_void) };
    value
}

/// Read the message of libxml2's last recorded error, if any.
fn last_error_message() -> Option<String> {
    unsafe {
        let err = xmlGetLastError();
        if err.is_null() {
            return None;
        }
        let msg = (*err).message;
        if msg.is_null() {
            return None;
        }
        CStr::from_ptr(msg)
            .to_str()
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// A parsed XML document with RAII cleanup.
///
/// Holds a raw `xmlDocPtr` and is therefore not `Send`; parse, query, and
/// drop within one scope.
pub struct XmlDocument {
    doc: *mut XmlDoc,
}

impl XmlDocument {
    /// Parse a document from a memory buffer.
    ///
    /// `url` is used only for error reporting inside libxml2. Network access
    /// during parsing (external DTDs and the like) is disabled.
    ///
    /// On failure returns the libxml2 parse error message.
    pub fn parse_from_memory(data: &[u8], url: &str) -> Result<Self, String> {
        init_libxml2();

        let c_url = CString::new(url).unwrap_or_default();
        let options = XML_PARSE_NONET | XML_PARSE_NOERROR | XML_PARSE_NOWARNING;

        let doc = unsafe {
            xmlReadMemory(
                data.as_ptr() as *const c_char,
                data.len() as c_int,
                c_url.as_ptr(),
                std::ptr::null(),
                options,
            )
        };

        if doc.is_null() {
            return Err(last_error_message()
                .unwrap_or_else(|| "document could not be parsed as XML".to_string()));
        }

        Ok(XmlDocument { doc })
    }

    fn root(&self) -> Option<*mut XmlNode> {
        let root = unsafe { xmlDocGetRootElement(self.doc) };
        if root.is_null() { None } else { Some(root) }
    }

    /// Read an attribute of the document's root element.
    pub fn root_attribute(&self, name: &str) -> Option<String> {
        let root = self.root()?;
        let c_name = CString::new(name).ok()?;
        unsafe { take_xml_string(xmlGetProp(root, c_name.as_ptr())) }
    }

    /// Resolve a namespace prefix against the declarations in scope at the
    /// document root. `None` looks up the default namespace.
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String> {
        let root = self.root()?;
        let c_prefix = match prefix {
            Some(p) => Some(CString::new(p).ok()?),
            None => None,
        };
        let prefix_ptr = c_prefix
            .as_ref()
            .map(|c| c.as_ptr())
            .unwrap_or(std::ptr::null());

        unsafe {
            let ns = xmlSearchNs(self.doc, root, prefix_ptr);
            if ns.is_null() || (*ns).href.is_null() {
                return None;
            }
            CStr::from_ptr((*ns).href).to_str().ok().map(String::from)
        }
    }

    /// Evaluate an XPath expression with the given namespace prefix mappings
    /// and return the matching nodes in document order.
    ///
    /// Non-node-set results and evaluation failures yield an empty vector.
    pub fn xpath_nodes<'a>(
        &'a self,
        expr: &str,
        namespaces: &[(&str, &str)],
    ) -> Vec<NodeRef<'a>> {
        let Ok(c_expr) = CString::new(expr) else {
            return Vec::new();
        };

        let mut nodes = Vec::new();

        unsafe {
            let ctxt = xmlXPathNewContext(self.doc);
            if ctxt.is_null() {
                return Vec::new();
            }

            let mut registered = true;
            for (prefix, uri) in namespaces {
                let (Ok(c_prefix), Ok(c_uri)) = (CString::new(*prefix), CString::new(*uri)) else {
                    registered = false;
                    break;
                };
                if xmlXPathRegisterNs(ctxt, c_prefix.as_ptr(), c_uri.as_ptr()) != 0 {
                    registered = false;
                    break;
                }
            }

            if registered {
                let obj = xmlXPathEvalExpression(c_expr.as_ptr(), ctxt);
                if !obj.is_null() {
                    if (*obj).typ == XPATH_NODESET && !(*obj).nodesetval.is_null() {
                        let set = (*obj).nodesetval;
                        for i in 0..(*set).node_nr {
                            let node = *(*set).node_tab.add(i as usize);
                            if !node.is_null() {
                                nodes.push(NodeRef {
                                    node,
                                    _doc: PhantomData,
                                });
                            }
                        }
                    }
                    xmlXPathFreeObject(obj);
                }
            }

            xmlXPathFreeContext(ctxt);
        }

        nodes
    }
}

impl Drop for XmlDocument {
    fn drop(&mut self) {
        if !self.doc.is_null() {
            unsafe { xmlFreeDoc(self.doc) };
            self.doc = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for XmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlDocument").finish_non_exhaustive()
    }
}

/// A node borrowed from an [`XmlDocument`]. The node pointer stays owned by
/// the document; the lifetime ties each ref to it.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    node: *mut XmlNode,
    _doc: PhantomData<&'a XmlDocument>,
}

impl<'a> NodeRef<'a> {
    /// Concatenated text content of the node and its descendants.
    pub fn text_content(&self) -> String {
        unsafe { take_xml_string(xmlNodeGetContent(self.node)) }.unwrap_or_default()
    }

    /// Read an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let c_name = CString::new(name).ok()?;
        unsafe { take_xml_string(xmlGetProp(self.node, c_name.as_ptr())) }
    }

    pub(crate) fn as_ptr(&self) -> *mut XmlNode {
        self.node
    }
}

/// Thread-safe wrapper for a libxml2 schema pointer with RAII cleanup.
///
/// The schema can be shared across threads: libxml2 schema structures are
/// read-only after parsing and documented as thread-safe for validation.
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: libxml2 documents xmlSchema structures as thread-safe for reading.
// See: http://xmlsoft.org/threads.html
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// Parse and compile an XML Schema from a memory buffer.
    ///
    /// Schema parsing is not thread-safe in libxml2; schemas are expected to
    /// be compiled once and then shared for validation.
    pub fn from_buffer(schema_data: &[u8]) -> LibXml2Result<Self> {
        init_libxml2();

        unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(
                schema_data.as_ptr() as *const c_char,
                schema_data.len() as c_int,
            );

            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            if schema_ptr.is_null() {
                return Err(LibXml2Error::SchemaParseFailed);
            }

            Ok(XmlSchemaPtr {
                inner: Arc::new(XmlSchemaInner {
                    ptr: schema_ptr,
                    _phantom: PhantomData,
                }),
            })
        }
    }

    /// Validate a single element (and its subtree) against this schema.
    ///
    /// Creates a fresh validation context per call, so concurrent validation
    /// against a shared schema is safe, and the captured error log belongs to
    /// exactly this call.
    pub fn validate_element(&self, element: &NodeRef<'_>) -> LibXml2Result<ValidationResult> {
        unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(self.inner.ptr);
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut errors: Vec<String> = Vec::new();
            let errors_ptr = &mut errors as *mut Vec<String> as *mut c_void;
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                errors_ptr,
            );

            let result_code = xmlSchemaValidateOneElement(valid_ctxt, element.as_ptr());
            xmlSchemaFreeValidCtxt(valid_ctxt);

            let result = ValidationResult::from_code(result_code, errors);
            if let ValidationResult::InternalError { code } = result {
                return Err(LibXml2Error::InternalError { code });
            }

            Ok(result)
        }
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        // The Arc ensures this runs exactly once per schema.
        if !self.ptr.is_null() {
            unsafe { xmlSchemaFree(self.ptr) };
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed with schema violations (return code > 0)
    Invalid {
        error_count: i32,
        errors: Vec<String>,
    },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create a ValidationResult from a libxml2 return code and captured errors
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                errors,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}
