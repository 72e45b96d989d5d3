//! Normalization of failed exchanges into [`RequestError`]

use qcportal_domain::RequestError;
use serde_json::{Map, Value};

use crate::http::{decode_response, RawResponse};

/// Structured details of a failed exchange
///
/// The body is decoded by its content type. An object is taken as is, a
/// bare string becomes `msg`, and anything undecodable yields an empty map
/// so the caller falls back to the reason phrase.
pub fn error_details(response: &RawResponse) -> Map<String, Value> {
    match decode_response::<Value>(response.content_type.as_deref(), &response.body) {
        Ok(Value::Object(map)) => map,
        Ok(Value::String(msg)) => Map::from_iter([("msg".to_string(), Value::String(msg))]),
        _ => Map::new(),
    }
}

pub fn request_error(response: &RawResponse) -> RequestError {
    RequestError::from_details(response.status, error_details(response), &response.reason)
}
