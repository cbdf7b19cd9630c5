//! HTTP client for scanner endpoints

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::error::ScanFailure;

/// Body posted to every scanner
#[derive(Serialize)]
pub struct ScanRequest<'a> {
    pub api_key: &'a str,
    pub download_url: &'a str,
}

impl Debug for ScanRequest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScanRequest")
            .field("api_key", &"<redacted>")
            .field("download_url", &self.download_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct ScannerClient {
    http_client: reqwest::Client,
}

impl Debug for ScannerClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScannerClient").finish()
    }
}

impl ScannerClient {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("custodian/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for scanners")?;

        Ok(Self { http_client })
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// POST the scan request and return the raw response body.
    ///
    /// The status code is not checked; callers decide from the body.
    pub async fn post(
        &self,
        api_url: &str,
        request: &ScanRequest<'_>,
        timeout: Duration,
    ) -> Result<String, ScanFailure> {
        let response = self
            .http_client
            .post(api_url)
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                api_url = %api_url,
                status = %status,
                "Scanner responded with a non-success status"
            );
        }

        Ok(response.text().await?)
    }
}

/// Decode a scanner response body.
///
/// Bodies that are not JSON fail with the raw text. A payload reports an error
/// when an object has an `error` key, an array holds the string `"error"`, or a
/// string contains `error`. Scalars (`null`, numbers, booleans) are not
/// verdicts and fail as unexpected. Anything else is returned as is.
pub fn parse_response(body: &str) -> Result<serde_json::Value, ScanFailure> {
    let payload: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| ScanFailure::InvalidResponse(body.to_string()))?;

    let reports_error = match &payload {
        Value::Object(object) => Some(object.contains_key("error")),
        Value::Array(items) => Some(items.iter().any(|item| item.as_str() == Some("error"))),
        Value::String(text) => Some(text.contains("error")),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    };

    match reports_error {
        None => Err(ScanFailure::UnexpectedPayload(payload)),
        Some(true) => Err(ScanFailure::ScannerError(payload)),
        Some(false) => Ok(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_verdict_object() {
        let payload = parse_response(r#"{"scanMapKeys": ["a"], "version": "2.1"}"#).unwrap();
        assert_eq!(payload, json!({ "scanMapKeys": ["a"], "version": "2.1" }));
    }

    #[test]
    fn error_key_fails_with_payload() {
        match parse_response(r#"{"error": "unable to download", "code": 3}"#) {
            Err(ScanFailure::ScannerError(payload)) => {
                assert_eq!(payload["error"], "unable to download");
                assert_eq!(payload["code"], 3);
            }
            other => panic!("expected scanner error, got {:?}", other),
        }
    }

    #[test]
    fn null_error_key_still_fails() {
        assert!(matches!(
            parse_response(r#"{"error": null}"#),
            Err(ScanFailure::ScannerError(_))
        ));
    }

    #[test]
    fn nested_error_key_is_not_a_failure() {
        assert!(parse_response(r#"{"result": {"error": "nested"}}"#).is_ok());
    }

    #[test]
    fn non_json_body_keeps_raw_text() {
        match parse_response("Internal Server Error") {
            Err(ScanFailure::InvalidResponse(body)) => assert_eq!(body, "Internal Server Error"),
            other => panic!("expected invalid response, got {:?}", other),
        }
    }

    #[test]
    fn empty_body_is_invalid() {
        assert!(matches!(
            parse_response(""),
            Err(ScanFailure::InvalidResponse(body)) if body.is_empty()
        ));
    }

    #[test]
    fn arrays_and_strings_without_error_are_returned_verbatim() {
        assert_eq!(parse_response("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(
            parse_response(r#"["errors", {"error": 1}]"#).unwrap(),
            json!(["errors", { "error": 1 }])
        );
        assert_eq!(parse_response(r#""clean""#).unwrap(), json!("clean"));
    }

    #[test]
    fn array_holding_error_element_fails() {
        assert!(matches!(
            parse_response(r#"["ok", "error"]"#),
            Err(ScanFailure::ScannerError(payload)) if payload == json!(["ok", "error"])
        ));
    }

    #[test]
    fn string_mentioning_error_fails() {
        assert!(matches!(
            parse_response(r#""internal error while scanning""#),
            Err(ScanFailure::ScannerError(_))
        ));
    }

    #[test]
    fn scalar_payloads_are_unexpected() {
        for body in ["null", "42", "3.5", "true", "false"] {
            match parse_response(body) {
                Err(ScanFailure::UnexpectedPayload(payload)) => {
                    assert_eq!(payload, serde_json::from_str::<Value>(body).unwrap())
                }
                other => panic!("expected unexpected payload for {}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn scan_request_serializes_expected_fields() {
        let request = ScanRequest {
            api_key: "secret",
            download_url: "https://uploads.example/uploads/file/abc",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "api_key": "secret",
                "download_url": "https://uploads.example/uploads/file/abc",
            })
        );
        assert!(!format!("{:?}", request).contains("secret"));
    }
}
