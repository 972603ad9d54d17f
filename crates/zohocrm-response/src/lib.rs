//! Zoho CRM response normalizer — classify XML API responses by structure and
//! decode them into one record model.
//!
//! ```
//! let xml = r#"<response uri="/crm/private/xml/Leads/getRecordById"><result><Leads><row no="1"><FL val="LEADID">123456789012345678</FL></row></Leads></result></response>"#;
//! let response = zohocrm_response::parse(xml, "Leads", "getRecordById").unwrap();
//! assert_eq!(response.primary_record_id(), Some("123456789012345678"));
//! ```

pub mod document;
pub mod extract;
pub mod parser;
pub mod shape;
pub mod types;

pub use document::{load, Document, Element};
pub use parser::{parse, ParseOptions, ResponseParser};
pub use shape::{classify, Shape};
pub use types::*;
