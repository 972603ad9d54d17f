//! Per-shape extraction into the normalized model.
//!
//! Each extractor only fills the parts of the response its shape owns.
//! Missing nodes become `None`; they are never errors. Nodes that are
//! present but unreadable are.

use std::collections::BTreeMap;

use crate::document::Element;
use crate::shape::RequestContext;
use crate::types::{
    FieldDescriptor, FieldSections, FieldValue, PositionKey, RecordRef, RecordRows, RecordSet,
    ResponseError, ResponseResult, RowOutcome, UserRecords,
};

/// The parts of a response produced by one extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Extraction {
    pub message: Option<String>,
    pub code: Option<String>,
    pub record_id: Option<String>,
    pub records: RecordSet,
}

pub(crate) fn no_data(root: &Element) -> Extraction {
    let nodata = root.child("nodata");
    Extraction {
        message: nodata.and_then(|n| n.child_text("message")).map(str::to_string),
        code: nodata.and_then(|n| n.child_text("code")).map(str::to_string),
        ..Default::default()
    }
}

pub(crate) fn field_metadata(root: &Element) -> Extraction {
    let mut sections = FieldSections::new();
    for section in root.children_named("section") {
        let fields = sections
            .entry(section.attr("name").unwrap_or_default().to_string())
            .or_default();
        for field in section.children() {
            let label = field.attr("label").unwrap_or_default().to_string();
            let values: Option<Vec<String>> = field
                .has_children()
                .then(|| field.children().iter().map(|v| v.text().to_string()).collect());
            let descriptor = FieldDescriptor {
                required: is_true(field.attr("req")),
                field_type: field.attr("type").unwrap_or_default().to_string(),
                read_only: is_true(field.attr("isreadonly")),
                max_length: lenient_int(field.attr("maxlength").unwrap_or_default()),
                label: label.clone(),
                display_value: field.attr("dv").unwrap_or_default().to_string(),
                custom_field: is_true(field.attr("customfield")),
                values,
            };
            fields.insert(label, descriptor);
        }
    }

    Extraction {
        records: RecordSet::FieldMetadata(sections),
        ..Default::default()
    }
}

pub(crate) fn users(root: &Element) -> Extraction {
    let mut users = UserRecords::new();
    for user in root.children() {
        let entry = users
            .entry(user.attr("id").unwrap_or_default().to_string())
            .or_default();
        for (key, value) in user.attributes() {
            entry.insert(key.to_string(), value.to_string());
        }
        entry.insert("name".to_string(), user.text().to_string());
    }

    Extraction {
        records: RecordSet::Users(users),
        ..Default::default()
    }
}

pub(crate) fn record_rows(result: &Element, ctx: &RequestContext<'_>) -> Extraction {
    let mut rows = RecordRows::new();
    for row in result.child(ctx.module).map(Element::children).unwrap_or_default() {
        let mut fields = BTreeMap::new();
        for field in row.children() {
            let key = field.attr("val").unwrap_or_default().to_string();
            if !field.has_children() {
                fields.insert(key, FieldValue::Text(field.text().to_string()));
                continue;
            }

            let mut compound: BTreeMap<PositionKey, BTreeMap<String, String>> = BTreeMap::new();
            for item in field.children() {
                for sub in item.children() {
                    compound.entry(position_of(item)).or_default().insert(
                        sub.attr("val").unwrap_or_default().to_string(),
                        sub.text().to_string(),
                    );
                }
            }
            // Items without sub-fields leave any earlier value untouched.
            if compound.is_empty() {
                continue;
            }
            match fields.get_mut(&key) {
                Some(FieldValue::Compound(existing)) => {
                    for (position, subs) in compound {
                        existing.entry(position).or_default().extend(subs);
                    }
                }
                _ => {
                    fields.insert(key, FieldValue::Compound(compound));
                }
            }
        }

        // A row only exists once one of its fields has been read.
        if !fields.is_empty() {
            rows.entry(position_of(row)).or_default().extend(fields);
        }
    }

    let record_id = if ctx.method == "getRecordById" {
        let key = record_id_field(ctx.module);
        let id = rows
            .get(&PositionKey::from("1"))
            .and_then(|row| row.get(&key))
            .and_then(FieldValue::as_text)
            .map(str::to_string);
        if id.is_none() {
            tracing::debug!(module = ctx.module, "No {key} field in row 1");
        }
        id
    } else {
        None
    };

    Extraction {
        record_id,
        records: RecordSet::Rows(rows),
        ..Default::default()
    }
}

pub(crate) fn post_records_legacy(result: &Element) -> Extraction {
    let maps: Vec<BTreeMap<String, String>> = result
        .children_named("recorddetail")
        .map(|detail| fields_by_val(detail.children()))
        .collect();

    let record_id = match maps.as_slice() {
        [only] => only.get("Id").cloned(),
        _ => None,
    };

    Extraction {
        message: result.child_text("message").map(str::to_string),
        record_id,
        records: RecordSet::FieldMaps(maps),
        ..Default::default()
    }
}

pub(crate) fn post_records_bulk(result: &Element) -> Extraction {
    let mut outcomes = BTreeMap::new();
    for row in result.children_named("row") {
        let outcome = if let Some(success) = row.child("success") {
            RowOutcome::Success {
                code: success.child_text("code").unwrap_or_default().to_string(),
                fields: success
                    .child("details")
                    .map(|details| fields_by_val(details.children()))
                    .unwrap_or_default(),
            }
        } else if let Some(error) = row.child("error") {
            RowOutcome::Failure {
                code: error.child_text("code").unwrap_or_default().to_string(),
                message: error.child_text("details").unwrap_or_default().to_string(),
            }
        } else {
            tracing::debug!("Row {} has neither success nor error", position_of(row));
            RowOutcome::Failure {
                code: String::new(),
                message: String::new(),
            }
        };
        outcomes.insert(position_of(row), outcome);
    }

    Extraction {
        records: RecordSet::Outcomes(outcomes),
        ..Default::default()
    }
}

pub(crate) fn relationship_update(result: &Element) -> ResponseResult<Extraction> {
    let mut extraction = Extraction {
        message: result.child_text("message").map(str::to_string),
        code: result
            .path(&["error", "code"])
            .map(|code| code.text().to_string()),
        ..Default::default()
    };

    // Updated ids take precedence; the two lists are never merged.
    if let Some(list) = ["updated-ids", "added-ids"]
        .iter()
        .find_map(|name| result.child(name))
    {
        let ids = decode_ids(list.name(), list.text())?;
        if let [only] = ids.as_slice() {
            extraction.record_id = Some(only.record_id.clone());
        }
        extraction.records = RecordSet::Ids(ids);
    }

    Ok(extraction)
}

pub(crate) fn entity_conversion(root: &Element) -> Extraction {
    let fields = root
        .children()
        .iter()
        .map(|child| (child.name().to_string(), child.text().to_string()))
        .collect();

    Extraction {
        records: RecordSet::Fields(fields),
        ..Default::default()
    }
}

pub(crate) fn deletion(result: &Element, min_digits: usize) -> Extraction {
    let message = result.child_text("message");
    let ids = digit_runs(message.unwrap_or_default(), min_digits).join(";");

    Extraction {
        message: message.map(str::to_string),
        code: result.child_text("code").map(str::to_string),
        record_id: Some(ids),
        records: RecordSet::Empty,
    }
}

/// Field name the service uses for a module's own id: `Leads` -> `LEADID`.
///
/// Only holds for modules named as a regular English plural.
pub fn record_id_field(module: &str) -> String {
    let singular = match module.char_indices().last() {
        Some((idx, _)) => &module[..idx],
        None => "",
    };
    format!("{}ID", singular.to_uppercase())
}

/// Every maximal run of at least `min_len` ASCII digits, in order.
pub fn digit_runs(text: &str, min_len: usize) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = None;
    for (idx, byte) in text.bytes().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(idx),
            (false, Some(begin)) => {
                if idx - begin >= min_len.max(1) {
                    runs.push(&text[begin..idx]);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        if text.len() - begin >= min_len.max(1) {
            runs.push(&text[begin..]);
        }
    }
    runs
}

/// Integer coercion that keeps the longest leading decimal prefix.
///
/// `"255"` -> 255, `" 12px"` -> 12, `"abc"` or `""` -> 0. Saturates on overflow.
pub fn lenient_int(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = value
            .saturating_mul(10)
            .saturating_add(if negative { -digit } else { digit });
    }
    value
}

fn is_true(raw: Option<&str>) -> bool {
    raw == Some("true")
}

fn position_of(node: &Element) -> PositionKey {
    PositionKey::from(node.attr("no").unwrap_or_default())
}

fn fields_by_val(fields: &[Element]) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|field| {
            (
                field.attr("val").unwrap_or_default().to_string(),
                field.text().to_string(),
            )
        })
        .collect()
}

/// Decode a JSON array of ids. Bare numbers are kept as their decimal text.
fn decode_ids(node: &str, raw: &str) -> ResponseResult<Vec<RecordRef>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::warn!("Could not decode <{node}> {raw:?}: {e}");
        ResponseError::MalformedDocument(format!("invalid id list in <{node}> {raw:?}: {e}"))
    })?;

    Ok(values
        .into_iter()
        .map(|value| RecordRef {
            record_id: match value {
                serde_json::Value::String(id) => id,
                other => other.to_string(),
            },
        })
        .collect())
}
