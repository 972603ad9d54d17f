//! Entry point: load, classify, extract, assemble.

use serde::Deserialize;

use crate::document::{Document, DEFAULT_MAX_DEPTH};
use crate::shape::{classify, RequestContext};
use crate::types::{Response, ResponseResult};

/// Minimum length of a digit run treated as a record id in deletion messages.
///
/// Some regional data centers issue ids shorter than the usual 19 digits.
pub const DEFAULT_DELETION_ID_MIN_DIGITS: usize = 16;

/// Tunables for [`ResponseParser`]. The defaults match the service's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub deletion_id_min_digits: usize,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            deletion_id_min_digits: DEFAULT_DELETION_ID_MIN_DIGITS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Stateless response normalizer.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    options: ParseOptions,
}

impl ResponseParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Normalize `raw_document`, the reply to `method` on `module`.
    pub fn parse(&self, raw_document: &str, module: &str, method: &str) -> ResponseResult<Response> {
        let document = Document::parse(raw_document, self.options.max_depth)?;
        let shape = classify(&document, module, method)?;
        let ctx = RequestContext { module, method };
        let extraction = shape.extract(&document, &ctx, &self.options)?;

        tracing::trace!(
            module,
            method,
            shape = shape.as_str(),
            records = extraction.records.len(),
            "Extracted response"
        );

        Ok(Response {
            module_name: module.to_string(),
            operation_name: method.to_string(),
            resource_uri: document.uri().to_string(),
            status_message: extraction.message,
            status_code: extraction.code,
            primary_record_id: extraction.record_id,
            records: extraction.records,
            raw_document: raw_document.to_string(),
        })
    }
}

/// Normalize a response with default options.
pub fn parse(raw_document: &str, module: &str, method: &str) -> ResponseResult<Response> {
    ResponseParser::default().parse(raw_document, module, method)
}
