//! HTTP transport
//!
//! One request, one exchange: the transport never retries and knows nothing
//! about authentication or domain payloads.

pub mod client;
pub mod encoding;

pub use client::{HttpClient, HttpClientBuilder, PreparedRequest, RawResponse};
pub use encoding::{decode_response, Encoding};
