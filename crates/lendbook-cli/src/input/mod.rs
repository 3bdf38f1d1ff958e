pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Parse a JSON document, naming its source in the error.
fn parse_document<T: DeserializeOwned>(
    contents: &str,
    source: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_str(contents).map_err(|e| {
        format!(
            "Failed to parse {} at line {}, column {}: {}",
            source,
            e.line(),
            e.column(),
            e
        )
        .into()
    })
}
