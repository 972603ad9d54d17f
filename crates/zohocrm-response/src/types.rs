//! Normalized response model shared by every response shape.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A row position exactly as the service declared it (`no="3"`).
///
/// Keys are never renumbered. Ordering is numeric for decimal keys so that
/// `"2"` sorts before `"10"`; non-numeric keys sort after all numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the key, if it is a plain run of ASCII digits.
    pub fn numeric(&self) -> Option<u128> {
        let raw = self.0.as_str();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok()
    }
}

impl Ord for PositionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for PositionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for PositionKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata for one field as reported by `getFields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: String,
    pub read_only: bool,
    pub max_length: i64,
    pub label: String,
    pub display_value: String,
    pub custom_field: bool,
    /// Picklist values in document order, present only when the field lists any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub values: Option<Vec<String>>,
}

/// The value of one field in a fetched record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// Multi-valued field: sub-row position -> sub-field name -> value.
    Compound(BTreeMap<PositionKey, BTreeMap<String, String>>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Compound(_) => None,
        }
    }
}

/// Per-row outcome of a bulk insert/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Success {
        code: String,
        fields: BTreeMap<String, String>,
    },
    Failure {
        code: String,
        message: String,
    },
}

impl RowOutcome {
    pub fn code(&self) -> &str {
        match self {
            RowOutcome::Success { code, .. } | RowOutcome::Failure { code, .. } => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success { .. })
    }
}

/// An added or updated record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_id: String,
}

/// Sections of `getFields`: section name -> field label -> descriptor.
///
/// Sections and fields keep the order of the layout they came from.
pub type FieldSections = IndexMap<String, IndexMap<String, FieldDescriptor>>;

/// Users in listing order: user id -> attribute name -> value.
pub type UserRecords = IndexMap<String, BTreeMap<String, String>>;

/// Records of a listing: row position -> field name -> value.
pub type RecordRows = BTreeMap<PositionKey, BTreeMap<String, FieldValue>>;

/// The records carried by a response. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RecordSet {
    #[default]
    Empty,
    FieldMetadata(FieldSections),
    /// Every user attribute plus a synthetic `name` holding the element text.
    Users(UserRecords),
    Rows(RecordRows),
    /// One map per `recorddetail` block of a legacy insert/update.
    FieldMaps(Vec<BTreeMap<String, String>>),
    /// Bulk outcomes, ascending by numeric row position.
    Outcomes(BTreeMap<PositionKey, RowOutcome>),
    Ids(Vec<RecordRef>),
    /// Tag name -> text, as returned by a lead conversion.
    Fields(BTreeMap<String, String>),
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Empty => 0,
            RecordSet::FieldMetadata(sections) => sections.len(),
            RecordSet::Users(users) => users.len(),
            RecordSet::Rows(rows) => rows.len(),
            RecordSet::FieldMaps(maps) => maps.len(),
            RecordSet::Outcomes(outcomes) => outcomes.len(),
            RecordSet::Ids(ids) => ids.len(),
            RecordSet::Fields(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A normalized response. Built once per parse and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub(crate) module_name: String,
    pub(crate) operation_name: String,
    pub(crate) resource_uri: String,
    pub(crate) status_message: Option<String>,
    pub(crate) status_code: Option<String>,
    pub(crate) primary_record_id: Option<String>,
    pub(crate) records: RecordSet,
    pub(crate) raw_document: String,
}

impl Response {
    /// Module (collection) name the caller supplied.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// API method the caller supplied.
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// `uri` attribute of the document root; empty when the service sent none.
    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn status_code(&self) -> Option<&str> {
        self.status_code.as_deref()
    }

    /// Identifier of the single record this response is about.
    ///
    /// For deletions this is the `;`-joined list of ids found in the
    /// confirmation message, which may be empty.
    pub fn primary_record_id(&self) -> Option<&str> {
        self.primary_record_id.as_deref()
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Same as [`Response::records`]; related-record fetches share the listing shape.
    pub fn related_records(&self) -> &RecordSet {
        &self.records
    }

    pub fn into_records(self) -> RecordSet {
        self.records
    }

    /// The document exactly as it was received.
    pub fn raw_document(&self) -> &str {
        &self.raw_document
    }

    /// Loose advisory check: the status message mentions "success".
    ///
    /// The service phrases confirmations inconsistently, so this is only
    /// suitable for logging, never for deciding whether a call worked.
    pub fn looks_successful(&self) -> bool {
        self.status_message
            .as_deref()
            .is_some_and(|message| message.contains("success"))
    }

    /// Flat view of everything the response carries.
    pub fn summary(&self) -> ResponseSummary<'_> {
        ResponseSummary {
            module: &self.module_name,
            method: &self.operation_name,
            message: self.status_message.as_deref(),
            code: self.status_code.as_deref(),
            uri: &self.resource_uri,
            record_id: self.primary_record_id.as_deref(),
            records: &self.records,
            xml: &self.raw_document,
        }
    }
}

/// Borrowed, serializable view of a [`Response`].
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary<'a> {
    pub module: &'a str,
    pub method: &'a str,
    pub message: Option<&'a str>,
    pub code: Option<&'a str>,
    pub uri: &'a str,
    pub record_id: Option<&'a str>,
    pub records: &'a RecordSet,
    pub xml: &'a str,
}

/// Errors raised while normalizing a response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The service answered with an `<error>` node.
    #[error("API error {code} from {uri}: {message}")]
    Api {
        uri: String,
        code: String,
        message: String,
    },

    #[error("Unrecognized response shape <{root}> for {method} on {module}")]
    UnrecognizedShape {
        module: String,
        method: String,
        root: String,
    },
}

impl ResponseError {
    pub fn is_api_error(&self) -> bool {
        matches!(self, ResponseError::Api { .. })
    }
}

/// Convenience result type.
pub type ResponseResult<T> = Result<T, ResponseError>;
