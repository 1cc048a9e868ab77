use chrono::Utc;
use reqwest::RequestBuilder;

pub const USER_AGENT: &str = concat!("coin-flip-mcp/", env!("CARGO_PKG_VERSION"));

/// Generate a simple request id suitable for logging/correlation.
pub fn generate_request_id() -> String {
    let now = Utc::now();
    format!("cf-{}-{}", now.timestamp(), now.timestamp_subsec_nanos())
}

/// Add standard headers to an outgoing request. Returns the updated builder and the request id used.
pub fn add_standard_headers(
    builder: RequestBuilder,
    request_id: Option<String>,
) -> (RequestBuilder, String) {
    let rid = request_id.unwrap_or_else(generate_request_id);
    let b = builder
        .header("x-request-id", rid.as_str())
        .header(reqwest::header::USER_AGENT, USER_AGENT);
    (b, rid)
}
