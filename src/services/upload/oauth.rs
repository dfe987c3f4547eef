//! OAuth 1.0a request signing (HMAC-SHA1), RFC 5849.
//!
//! The photo service authenticates every call with a signed oauth_*
//! parameter set carried in the query string or the request body.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::UploadCredentials;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is
/// escaped. This is stricter than generic URL encoding; the signature
/// base string depends on it.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Produce the complete signed parameter set for one request:
/// the oauth_* protocol parameters, the caller's extra parameters, and
/// the computed `oauth_signature`.
pub fn sign_request(
    method: &str,
    url: &str,
    extra_params: &[(String, String)],
    credentials: &UploadCredentials,
) -> Vec<(String, String)> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    signed_params(method, url, extra_params, credentials, &timestamp, &nonce)
}

fn signed_params(
    method: &str,
    url: &str,
    extra_params: &[(String, String)],
    credentials: &UploadCredentials,
    timestamp: &str,
    nonce: &str,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        (
            "oauth_consumer_key".to_string(),
            credentials.consumer_key.clone(),
        ),
        ("oauth_nonce".to_string(), nonce.to_string()),
        (
            "oauth_signature_method".to_string(),
            "HMAC-SHA1".to_string(),
        ),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.oauth_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];
    params.extend_from_slice(extra_params);

    let base = signature_base_string(method, url, &params);
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.oauth_token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    params.push(("oauth_signature".to_string(), signature));
    params
}

/// `METHOD&encoded-url&encoded-normalized-parameters`, with the
/// parameters percent-encoded, sorted, and joined with `=`/`&` before
/// the outer encoding.
fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> UploadCredentials {
        UploadCredentials {
            consumer_key: "key".to_string(),
            consumer_secret: "keysecret".to_string(),
            oauth_token: "token".to_string(),
            oauth_token_secret: "tokensecret".to_string(),
        }
    }

    #[test]
    fn test_percent_encode_unreserved_stay_literal() {
        assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn test_percent_encode_escapes_everything_else() {
        assert_eq!(percent_encode("hello world!"), "hello%20world%21");
        assert_eq!(percent_encode("a=b&c"), "a%3Db%26c");
        assert_eq!(percent_encode("100%"), "100%25");
    }

    #[test]
    fn test_signature_base_string_sorts_parameters() {
        let params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        let base = signature_base_string("get", "https://api.flickr.com/services/rest/", &params);
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.flickr.com%2Fservices%2Frest%2F&a%3D1%26b%3D2"
        );
    }

    #[test]
    fn test_signed_params_include_protocol_set_and_signature() {
        let params = signed_params(
            "POST",
            "https://up.flickr.com/services/upload/",
            &[("title".to_string(), "cat.jpg".to_string())],
            &credentials(),
            "1000000000",
            "fixednonce",
        );

        for key in [
            "oauth_consumer_key",
            "oauth_nonce",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_token",
            "oauth_version",
            "title",
            "oauth_signature",
        ] {
            assert!(
                params.iter().any(|(k, _)| k == key),
                "missing parameter {}",
                key
            );
        }
    }

    #[test]
    fn test_signature_is_deterministic_for_fixed_nonce_and_timestamp() {
        let a = signed_params("GET", "https://example.com/", &[], &credentials(), "1", "n");
        let b = signed_params("GET", "https://example.com/", &[], &credentials(), "1", "n");
        assert_eq!(a, b);

        let signature = &a.last().unwrap().1;
        // HMAC-SHA1 is 20 bytes, so the base64 form is always 28 chars
        // with a single padding byte.
        assert_eq!(signature.len(), 28);
        assert!(signature.ends_with('='));
    }
}
