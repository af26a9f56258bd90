//! Destination target resolution: where and how a response is written.
//!
//! The orchestrator hands every lifecycle request a pre-signed storage URL.
//! Delivering a response is a single `PUT` of the JSON body to exactly that
//! URL with an empty `Content-Type`, since the signature covers the content
//! type the orchestrator signed with (none).
//!
//! The gateway cannot take a full URL as its integration target, so the
//! mapping template splits the ResponseURL into the object path and the query
//! string (see [`crate::compiler::vtl`]). [`ResponseTarget`] performs the
//! same split in-process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{ResponderError, ResponderResult};
use crate::event::{LifecycleRequest, ResponsePayload};

/// Largest response body the orchestrator accepts, in bytes.
pub const RESPONSE_BODY_LIMIT: usize = 4096;

/// The only method the pre-signed URL is valid for.
pub const RESPONSE_METHOD: &str = "PUT";

/// Header the write must carry, with an empty value.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// A parsed pre-signed ResponseURL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTarget {
    raw: String,
    url: Url,
    path: String,
    query: Vec<(String, String)>,
}

impl ResponseTarget {
    /// Parses a ResponseURL.
    ///
    /// Only absolute `http`/`https` URLs with a host are accepted.
    pub fn parse(response_url: &str) -> ResponderResult<Self> {
        if response_url.is_empty() {
            return Err(ResponderError::invalid_response_url("ResponseURL is empty", response_url));
        }
        let url = Url::parse(response_url)
            .map_err(|e| ResponderError::invalid_response_url(e.to_string(), response_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResponderError::invalid_response_url(
                format!("unsupported scheme '{}'", url.scheme()),
                response_url,
            ));
        }
        if url.host_str().is_none() {
            return Err(ResponderError::invalid_response_url("ResponseURL has no host", response_url));
        }

        let raw_path = url.path().trim_start_matches('/');
        let path = urlencoding::decode(raw_path)
            .map_err(|e| ResponderError::invalid_response_url(e.to_string(), response_url))?
            .into_owned();
        let query = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Ok(Self {
            raw: response_url.to_string(),
            url,
            path,
            query,
        })
    }

    /// The storage host, e.g. the regional response bucket endpoint.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The object path without its leading slash, percent-decoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query string pairs in URL order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Looks up one query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The URL exactly as received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A fully described outbound write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Destination address (the ResponseURL)
    pub url: String,
    /// HTTP method, always `PUT`
    pub method: String,
    /// Headers to send
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body
    pub body: String,
}

impl WriteRequest {
    /// Creates a write of `body` to `target`.
    pub fn new(target: &ResponseTarget, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE_HEADER.to_string(), String::new());
        let request = Self {
            url: target.as_str().to_string(),
            method: RESPONSE_METHOD.to_string(),
            headers,
            body,
        };
        if request.exceeds_response_limit() {
            tracing::warn!(
                body_bytes = request.body.len(),
                limit = RESPONSE_BODY_LIMIT,
                "Response body exceeds the size the orchestrator accepts"
            );
        }
        request
    }

    /// Returns the `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE_HEADER).map(String::as_str)
    }

    /// Returns true if the body is larger than the orchestrator accepts.
    pub fn exceeds_response_limit(&self) -> bool {
        self.body.len() > RESPONSE_BODY_LIMIT
    }

    /// Parses the body back into JSON.
    pub fn body_json(&self) -> ResponderResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Describes the write of a resolved payload to the request's ResponseURL.
pub fn resolve_write(payload: &ResponsePayload, request: &LifecycleRequest) -> ResponderResult<WriteRequest> {
    let target = ResponseTarget::parse(&request.response_url)?;
    let write = WriteRequest::new(&target, payload.to_body()?);
    tracing::debug!(
        request_id = %payload.request_id,
        host = target.host(),
        status = %payload.status,
        "Resolved response write"
    );
    Ok(write)
}

/// Describes the write of a rule-produced body object.
pub fn resolve_body_write(body: &Map<String, Value>, response_url: &str) -> ResponderResult<WriteRequest> {
    let target = ResponseTarget::parse(response_url)?;
    Ok(WriteRequest::new(&target, serde_json::to_string(body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RequestType, ResponseStatus};
    use crate::types::PhysicalResourceId;

    const PRESIGNED: &str = "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/arn%3Aaws%3Acloudformation%3Aus-east-1%3A123456789012%3Astack/demo/guid%7CDemo%7Creq-1?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Expires=7200&X-Amz-Signature=ab%2Bcd";

    fn payload() -> ResponsePayload {
        ResponsePayload {
            status: ResponseStatus::Success,
            reason: String::new(),
            physical_resource_id: PhysicalResourceId::from("req-1"),
            stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/guid".into(),
            request_id: "req-1".into(),
            logical_resource_id: "Demo".into(),
            data: None,
            no_echo: None,
        }
    }

    #[test]
    fn test_parse_presigned_url() {
        let target = ResponseTarget::parse(PRESIGNED).unwrap();
        assert_eq!(target.host(), "cloudformation-custom-resource-response-useast1.s3.amazonaws.com");
        assert_eq!(
            target.path(),
            "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/guid|Demo|req-1"
        );
        assert_eq!(target.query_pairs().len(), 3);
        assert_eq!(target.query_param("X-Amz-Signature"), Some("ab+cd"));
        assert_eq!(target.query_param("missing"), None);
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        for url in ["", "not a url", "ftp://host/path", "/relative/path"] {
            let err = ResponseTarget::parse(url).unwrap_err();
            assert!(matches!(err, ResponderError::InvalidResponseUrl { .. }), "{}", url);
        }
    }

    #[test]
    fn test_write_request_shape() {
        let request = LifecycleRequest::new(RequestType::Create, "s", "req-1", "Demo", PRESIGNED);
        let write = resolve_write(&payload(), &request).unwrap();
        assert_eq!(write.method, "PUT");
        assert_eq!(write.url, PRESIGNED);
        assert_eq!(write.content_type(), Some(""));
        assert_eq!(write.headers.len(), 1);
        let body = write.body_json().unwrap();
        assert_eq!(body["Status"], "SUCCESS");
        assert_eq!(body["PhysicalResourceId"], "req-1");
        assert!(body.get("Data").is_none());
    }

    #[test]
    fn test_write_request_propagates_url_errors() {
        let request = LifecycleRequest::new(RequestType::Create, "s", "req-1", "Demo", "");
        assert!(resolve_write(&payload(), &request).is_err());
    }

    #[test]
    fn test_response_limit() {
        let mut large = payload();
        large.reason = "x".repeat(RESPONSE_BODY_LIMIT);
        let request = LifecycleRequest::new(RequestType::Create, "s", "req-1", "Demo", PRESIGNED);
        assert!(resolve_write(&large, &request).unwrap().exceeds_response_limit());
        assert!(!resolve_write(&payload(), &request).unwrap().exceeds_response_limit());
    }

    #[test]
    fn test_body_write_from_rule_output() {
        let mut body = Map::new();
        body.insert("Status".to_string(), Value::String("FAILED".to_string()));
        let write = resolve_body_write(&body, PRESIGNED).unwrap();
        assert_eq!(write.body, r#"{"Status":"FAILED"}"#);
    }
}
