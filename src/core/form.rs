//! Form Encoding
//!
//! `application/x-www-form-urlencoded` request bodies.

use std::collections::HashMap;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Join scopes into a single space-separated string.
pub fn join_scopes<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encode key/value pairs as a form body, preserving order.
pub fn encode_form(params: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Decode a form body. Later duplicates overwrite earlier ones.
pub fn decode_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

/// Standard headers for form POSTs to the provider.
pub fn form_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), FORM_CONTENT_TYPE.to_string());
    headers.insert("accept".to_string(), "application/json".to_string());
    headers
}
