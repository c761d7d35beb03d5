//! Alibaba Cloud OpenAPI client (RPC style).
//!
//! Requests are form-encoded POSTs signed with HMAC-SHA1 over the sorted,
//! RFC 3986 percent-encoded parameter list. Response bodies are returned as
//! raw JSON; an error body (`Code`, `Message`) becomes [`McpError::OpenApi`].

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde_json::Value as JsonValue;
use sha1::Sha1;

use crate::config::Credentials;
use crate::error::{McpError, Result};

type HmacSha1 = Hmac<Sha1>;

/// API version of the DDS (ApsaraDB for MongoDB) service.
pub const DDS_API_VERSION: &str = "2015-12-01";
/// API version of the VPC service.
pub const VPC_API_VERSION: &str = "2016-04-28";

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const SIGNATURE_VERSION: &str = "1.0";
const HTTP_METHOD: &str = "POST";

/// Action parameters of a single request, kept sorted for signing.
#[derive(Debug, Clone, Default)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a parameter only when present and non-empty.
    pub fn set_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value.map(|v| v.to_string()).filter(|v| !v.is_empty()) {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// A client bound to one service endpoint and API version.
#[derive(Debug, Clone)]
pub struct OpenApiClient {
    http: reqwest::Client,
    base_url: String,
    version: &'static str,
    credentials: Credentials,
}

impl OpenApiClient {
    /// Create a client. `endpoint` is a host name (`https` is assumed) or a
    /// full `http(s)://` URL.
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        version: &'static str,
        credentials: Credentials,
    ) -> Self {
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", endpoint.trim_end_matches('/'))
        };
        Self {
            http,
            base_url,
            version,
            credentials,
        }
    }

    /// Scheme and host requests are posted to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `action` and return the decoded response body.
    pub async fn call(&self, action: &str, params: Params) -> Result<JsonValue> {
        let nonce = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let body = self.signed_body(action, params, &nonce, &timestamp)?;

        tracing::debug!(action, endpoint = %self.base_url, "Calling OpenAPI");
        let response = self
            .http
            .post(format!("{}/", self.base_url))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let json: JsonValue = serde_json::from_str(&text).map_err(|_| McpError::OpenApi {
            action: action.to_string(),
            code: status.as_u16().to_string(),
            message: truncate(&text, 512),
        })?;

        if !status.is_success() {
            let field = |name: &str| json.get(name).and_then(|v| v.as_str()).map(str::to_string);
            let err = McpError::OpenApi {
                action: action.to_string(),
                code: field("Code").unwrap_or_else(|| status.as_u16().to_string()),
                message: field("Message").unwrap_or_else(|| truncate(&text, 512)),
            };
            tracing::warn!(action, status = status.as_u16(), error = %err, "OpenAPI request failed");
            return Err(err);
        }

        Ok(json)
    }

    /// Build the signed form body for a request.
    fn signed_body(
        &self,
        action: &str,
        params: Params,
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let params = params
            .set("Action", action)
            .set("Version", self.version)
            .set("Format", "JSON")
            .set("AccessKeyId", &self.credentials.access_key_id)
            .set("SignatureMethod", SIGNATURE_METHOD)
            .set("SignatureVersion", SIGNATURE_VERSION)
            .set("SignatureNonce", nonce)
            .set("Timestamp", timestamp);

        let canonical = canonical_query(&params);
        let signature = sign(
            &string_to_sign(HTTP_METHOD, &canonical),
            &self.credentials.access_key_secret,
        )?;
        Ok(format!("{}&Signature={}", canonical, percent_encode(&signature)))
    }
}

/// RFC 3986 encoding: unreserved characters kept, everything else `%XX`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Sorted `key=value` pairs joined by `&`, both sides percent-encoded.
pub fn canonical_query(params: &Params) -> String {
    params
        .0
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&%2F&<encoded canonical query>`.
pub fn string_to_sign(method: &str, canonical_query: &str) -> String {
    format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(canonical_query)
    )
}

/// Base64 HMAC-SHA1 of `string_to_sign`, keyed by `secret&`.
pub fn sign(string_to_sign: &str, secret: &str) -> Result<String> {
    let key = format!("{}&", secret);
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| McpError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
