//! Wire encodings
//!
//! The request encoding is fixed per session. Responses are decoded by the
//! `Content-Type` the server actually sent, which need not match.

use qcportal_domain::constants::{CONTENT_TYPE_CBOR, CONTENT_TYPE_JSON};
use qcportal_domain::{PortalError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Body encoding negotiated for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    Json,
    Cbor,
}

impl Encoding {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::Cbor => CONTENT_TYPE_CBOR,
        }
    }

    /// Match a `Content-Type` header value, ignoring parameters such as
    /// `charset`
    pub fn from_content_type(value: &str) -> Option<Self> {
        let mime = value.split(';').next().unwrap_or_default().trim();
        if mime.eq_ignore_ascii_case(CONTENT_TYPE_JSON) {
            Some(Self::Json)
        } else if mime.eq_ignore_ascii_case(CONTENT_TYPE_CBOR) {
            Some(Self::Cbor)
        } else {
            None
        }
    }

    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec(value)?),
            Self::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(value, &mut buf)
                    .map_err(|e| PortalError::Serialization(format!("cbor encode: {e}")))?;
                Ok(buf)
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T> {
        match self {
            Self::Json => Ok(serde_json::from_slice(body)?),
            Self::Cbor => {
                ciborium::from_reader(body)
                    .map_err(|e| PortalError::Serialization(format!("cbor decode: {e}")))
            }
        }
    }
}

/// Decode a response body by its `Content-Type`
///
/// A missing header is read as JSON; any other unknown type is an error.
pub fn decode_response<T: DeserializeOwned>(content_type: Option<&str>, body: &[u8]) -> Result<T> {
    let encoding = match content_type {
        None => Encoding::Json,
        Some(value) => Encoding::from_content_type(value).ok_or_else(|| {
            PortalError::Serialization(format!("unsupported response content type '{value}'"))
        })?,
    };
    encoding.decode(body)
}
