use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

lazy_static! {
    static ref NEXT_DATA_SCRIPT: Regex =
        Regex::new(r#"(?s)<script[^>]*id=["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
            .expect("Failed to compile __NEXT_DATA__ pattern");
}

/// Finds the server-rendered `__NEXT_DATA__` blob in a page and parses it.
///
/// Returns `None` when the script tag is absent or its content is not JSON.
pub fn locate_next_data(page: &str) -> Option<Value> {
    let captures = NEXT_DATA_SCRIPT.captures(page)?;
    let raw = captures.get(1)?.as_str().trim();
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("__NEXT_DATA__ present but not valid JSON: {}", err);
            None
        }
    }
}
