// src/utils/oauth.rs

//! OAuth 1.0a request signing (HMAC-SHA1).

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{AppError, Result};
use crate::models::TwitterConfig;

type HmacSha1 = Hmac<Sha1>;

/// Build an `Authorization` header with a fresh nonce and timestamp.
///
/// `params` are the query and form parameters that take part in the
/// signature. Multipart and JSON bodies are not signed.
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    credentials: &TwitterConfig,
) -> Result<String> {
    let nonce = hex::encode(rand::random::<[u8; 16]>());
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    authorization_header_at(method, url, params, credentials, &nonce, timestamp)
}

/// Build an `Authorization` header for a fixed nonce and timestamp.
pub fn authorization_header_at(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    credentials: &TwitterConfig,
    nonce: &str,
    timestamp: u64,
) -> Result<String> {
    let timestamp = timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token_key.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut signed: Vec<(&str, &str)> = oauth_params.clone();
    signed.extend_from_slice(params);
    let signature = sign(
        method,
        url,
        &signed,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    )?;
    oauth_params.push(("oauth_signature", signature.as_str()));

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}

/// Compute the base64 HMAC-SHA1 signature of a request.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| AppError::config(format!("Invalid OAuth signing key: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// RFC 3986 percent-encoding; only unreserved characters pass through.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
