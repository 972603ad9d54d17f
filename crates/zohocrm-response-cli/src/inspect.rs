//! Reading captured documents and rendering normalized results as JSON.

use std::io::Read;

use anyhow::Context;
use serde_json::{json, Value};
use zohocrm_response::{ParseOptions, Response, ResponseError, ResponseParser};

/// Exit code when the service itself reported an error.
pub const EXIT_API_ERROR: i32 = 2;

/// Exit code for malformed or unrecognized documents.
pub const EXIT_BAD_DOCUMENT: i32 = 1;

/// Rendered output plus the process exit code it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOutcome {
    pub output: String,
    pub exit_code: i32,
}

/// Read a captured document from `path`, or stdin when `path` is absent or `-`.
pub fn read_document(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response document {path}")),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read response document from stdin")?;
            Ok(buf)
        }
    }
}

/// JSON view of a normalized response.
pub fn render_response(response: &Response, with_xml: bool) -> Value {
    let mut value = json!({
        "module": response.module_name(),
        "method": response.operation_name(),
        "uri": response.resource_uri(),
        "message": response.status_message(),
        "code": response.status_code(),
        "record_id": response.primary_record_id(),
        "records": response.records(),
        "success": response.looks_successful(),
    });
    if with_xml {
        value["xml"] = Value::String(response.raw_document().to_string());
    }
    value
}

/// JSON view of a failed parse.
pub fn render_error(err: &ResponseError) -> Value {
    match err {
        ResponseError::Api { uri, code, message } => json!({
            "error": "api",
            "uri": uri,
            "code": code,
            "message": message,
        }),
        ResponseError::MalformedDocument(reason) => json!({
            "error": "malformed_document",
            "message": reason,
        }),
        ResponseError::UnrecognizedShape { module, method, root } => json!({
            "error": "unrecognized_shape",
            "module": module,
            "method": method,
            "root": root,
        }),
    }
}

/// Parse `raw` and render the outcome.
pub fn inspect(
    raw: &str,
    module: &str,
    method: &str,
    options: ParseOptions,
    pretty: bool,
    with_xml: bool,
) -> anyhow::Result<InspectOutcome> {
    let parser = ResponseParser::new(options);
    let (value, exit_code) = match parser.parse(raw, module, method) {
        Ok(response) => (render_response(&response, with_xml), 0),
        Err(err) => {
            tracing::info!("{err}");
            let code = if err.is_api_error() {
                EXIT_API_ERROR
            } else {
                EXIT_BAD_DOCUMENT
            };
            (render_error(&err), code)
        }
    };

    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(InspectOutcome { output, exit_code })
}
