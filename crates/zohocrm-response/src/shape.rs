//! Structural classification of response documents.
//!
//! The service never says which shape it sent, and several shapes share
//! partial structure, so classification is an ordered cascade: the first
//! shape whose predicate holds wins.

use serde::Serialize;

use crate::document::{Document, Element};
use crate::extract::{self, Extraction};
use crate::parser::ParseOptions;
use crate::types::{ResponseError, ResponseResult};

/// Caller context for one parse.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub module: &'a str,
    pub method: &'a str,
}

/// A recognized response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    NoData,
    FieldMetadata,
    UserListing,
    RecordListing,
    PostRecordsLegacy,
    PostRecordsBulk,
    RelationshipUpdate,
    EntityConversion,
    Deletion,
}

impl Shape {
    /// Evaluation order of the cascade. The order is part of the contract.
    pub const CASCADE: [Shape; 9] = [
        Shape::NoData,
        Shape::FieldMetadata,
        Shape::UserListing,
        Shape::RecordListing,
        Shape::PostRecordsLegacy,
        Shape::PostRecordsBulk,
        Shape::RelationshipUpdate,
        Shape::EntityConversion,
        Shape::Deletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::NoData => "no_data",
            Shape::FieldMetadata => "field_metadata",
            Shape::UserListing => "user_listing",
            Shape::RecordListing => "record_listing",
            Shape::PostRecordsLegacy => "post_records_legacy",
            Shape::PostRecordsBulk => "post_records_bulk",
            Shape::RelationshipUpdate => "relationship_update",
            Shape::EntityConversion => "entity_conversion",
            Shape::Deletion => "deletion",
        }
    }

    /// Whether `document` has this shape, ignoring earlier cascade entries.
    pub fn matches(&self, document: &Document, ctx: &RequestContext<'_>) -> bool {
        let root = document.root();
        let result = document.result();
        match self {
            Shape::NoData => root.child("nodata").is_some(),
            Shape::FieldMetadata => ctx.method == "getFields",
            Shape::UserListing => ctx.method == "getUsers",
            Shape::RecordListing => result.and_then(|r| r.child(ctx.module)).is_some(),
            Shape::PostRecordsLegacy => {
                result.is_some_and(|r| has_all(r, &["message", "recorddetail"]))
            }
            Shape::PostRecordsBulk => result.is_some_and(|r| {
                r.children_named("row")
                    .any(|row| row.child("success").is_some() || row.child("error").is_some())
            }),
            Shape::RelationshipUpdate => result.is_some_and(is_relationship_update),
            Shape::EntityConversion => root.name() == "success",
            Shape::Deletion => result.is_some_and(|r| has_all(r, &["message", "code"])),
        }
    }

    pub(crate) fn extract(
        &self,
        document: &Document,
        ctx: &RequestContext<'_>,
        options: &ParseOptions,
    ) -> ResponseResult<Extraction> {
        let root = document.root();
        // Every shape after UserListing is only matched when `result` exists.
        let result = document.result();
        let extraction = match (self, result) {
            (Shape::NoData, _) => extract::no_data(root),
            (Shape::FieldMetadata, _) => extract::field_metadata(root),
            (Shape::UserListing, _) => extract::users(root),
            (Shape::EntityConversion, _) => extract::entity_conversion(root),
            (Shape::RecordListing, Some(result)) => extract::record_rows(result, ctx),
            (Shape::PostRecordsLegacy, Some(result)) => extract::post_records_legacy(result),
            (Shape::PostRecordsBulk, Some(result)) => extract::post_records_bulk(result),
            (Shape::RelationshipUpdate, Some(result)) => extract::relationship_update(result)?,
            (Shape::Deletion, Some(result)) => {
                extract::deletion(result, options.deletion_id_min_digits)
            }
            (_, None) => Extraction::default(),
        };
        Ok(extraction)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `document`, failing on service errors and unknown shapes.
pub fn classify(document: &Document, module: &str, method: &str) -> ResponseResult<Shape> {
    let root = document.root();
    if let Some(error) = root.child("error") {
        let err = ResponseError::Api {
            uri: document.uri().to_string(),
            code: error.child_text("code").unwrap_or_default().to_string(),
            message: error.child_text("message").unwrap_or_default().to_string(),
        };
        tracing::debug!(module, method, "Service reported an error: {err}");
        return Err(err);
    }

    let ctx = RequestContext { module, method };
    match Shape::CASCADE
        .iter()
        .copied()
        .find(|shape| shape.matches(document, &ctx))
    {
        Some(shape) => {
            tracing::debug!(module, method, shape = shape.as_str(), "Classified response");
            Ok(shape)
        }
        None => {
            tracing::warn!(module, method, root = root.name(), "Unrecognized response shape");
            Err(ResponseError::UnrecognizedShape {
                module: module.to_string(),
                method: method.to_string(),
                root: root.name().to_string(),
            })
        }
    }
}

fn has_all(node: &Element, names: &[&str]) -> bool {
    names.iter().all(|name| node.child(name).is_some())
}

/// `status/code` is 200 and the result reports a per-relation outcome or an id list.
fn is_relationship_update(result: &Element) -> bool {
    let status_ok = result
        .path(&["status", "code"])
        .is_some_and(|code| is_numeric_200(code.text()));
    if !status_ok {
        return false;
    }

    result.path(&["success", "code"]).is_some()
        || result.path(&["error", "code"]).is_some()
        || result.child("updated-ids").is_some()
        || result.child("added-ids").is_some()
}

fn is_numeric_200(raw: &str) -> bool {
    raw.trim().parse::<f64>().is_ok_and(|value| value == 200.0)
}
