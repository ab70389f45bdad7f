//! JSON response wrapper.
//!
//! # Design
//! A [`Response`] can only be constructed from a response that declares JSON
//! content, so every accessor after construction can assume it. The body is
//! parsed on demand and, if asked, run through the unmarshaller with the
//! client's registry.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::data::{Data, DataMap};
use crate::error::DmawError;
use crate::http::{find_header, HttpResponse, JSON_MEDIA_TYPE};
use crate::registry::TypeRegistry;
use crate::unmarshal::Unmarshaller;

/// An HTTP response carrying a JSON body.
#[derive(Debug, Clone)]
pub struct Response {
    inner: HttpResponse,
    registry: Arc<TypeRegistry>,
}

impl Response {
    /// Wrap `response`, rejecting it unless its content type is JSON.
    pub fn new(response: HttpResponse, registry: Arc<TypeRegistry>) -> Result<Self, DmawError> {
        let content_type = response.header("content-type").unwrap_or_default();
        if !content_type.to_ascii_lowercase().contains(JSON_MEDIA_TYPE) {
            debug!(status = response.status, content_type, "rejecting non-JSON response");
            return Err(DmawError::ContentTypeError {
                content_type: content_type.to_string(),
            });
        }
        Ok(Self {
            inner: response,
            registry,
        })
    }

    /// Parse the body as a JSON object, optionally rehydrating enveloped
    /// entries into typed objects.
    pub fn body_contents(&self, unmarshal: bool) -> Result<DataMap, DmawError> {
        let contents = self.body_json()?;
        if unmarshal {
            Unmarshaller::new(&self.registry).unmarshal(&contents)
        } else {
            Ok(contents.into_iter().map(|(k, v)| (k, Data::from(v))).collect())
        }
    }

    /// Parse the body as a generic JSON object.
    pub fn body_json(&self) -> Result<Map<String, Value>, DmawError> {
        serde_json::from_str(&self.inner.body).map_err(DmawError::JsonParseError)
    }

    pub fn status(&self) -> u16 {
        self.inner.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.inner.status)
    }

    /// Map 404 to `NotFound` and any other non-2xx status to `HttpError`.
    pub fn error_for_status(self) -> Result<Self, DmawError> {
        if self.is_success() {
            return Ok(self);
        }
        match self.inner.status {
            404 => Err(DmawError::NotFound),
            status => Err(DmawError::HttpError {
                status,
                body: self.inner.body,
            }),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.inner.headers
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.inner.header(name).is_some()
    }

    /// Every value of the header `name`.
    pub fn header(&self, name: &str) -> Vec<&str> {
        find_header(&self.inner.headers, name)
    }

    /// Every value of the header `name`, joined with `", "`.
    pub fn header_line(&self, name: &str) -> String {
        self.header(name).join(", ")
    }

    pub fn body(&self) -> &str {
        &self.inner.body
    }

    pub fn into_inner(self) -> HttpResponse {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObjectRef;
    use crate::dmaw_object;

    #[derive(Debug, Default)]
    struct Person {
        name: String,
    }

    dmaw_object! {
        #[dmaw(include)]
        Person as "Person" { name }
    }

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new().with::<Person>())
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![(
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body: body.to_string(),
        }
    }

    #[test]
    fn non_json_content_type_is_rejected() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: "hello".to_string(),
        };
        let err = Response::new(response, registry()).unwrap_err();
        assert!(matches!(err, DmawError::ContentTypeError { ref content_type } if content_type == "text/plain"));
    }

    #[test]
    fn missing_content_type_is_rejected() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "{}".to_string(),
        };
        assert!(matches!(
            Response::new(response, registry()),
            Err(DmawError::ContentTypeError { .. })
        ));
    }

    #[test]
    fn content_type_match_ignores_case() {
        let mut response = json_response(200, "{}");
        response.headers[0].1 = "Application/JSON".to_string();
        assert!(Response::new(response, registry()).is_ok());
    }

    #[test]
    fn malformed_body_is_json_parse_error() {
        let response = Response::new(json_response(200, "not json"), registry()).unwrap();
        assert!(matches!(response.body_contents(false), Err(DmawError::JsonParseError(_))));

        let response = Response::new(json_response(200, "[1, 2]"), registry()).unwrap();
        assert!(matches!(response.body_contents(false), Err(DmawError::JsonParseError(_))));
    }

    #[test]
    fn body_contents_without_unmarshal_stays_generic() {
        let body = r#"{"x":{"name":"Ann","_dmaw":{"class":"Person"}}}"#;
        let response = Response::new(json_response(200, body), registry()).unwrap();
        let contents = response.body_contents(false).unwrap();
        assert_eq!(
            contents["x"].get("_dmaw").and_then(|e| e.get("class")),
            Some(&Data::from("Person"))
        );
    }

    #[test]
    fn body_contents_with_unmarshal_rehydrates() {
        let body = r#"{"x":{"name":"Ann","_dmaw":{"class":"Person"}},"n":1}"#;
        let response = Response::new(json_response(200, body), registry()).unwrap();
        let contents = response.body_contents(true).unwrap();
        let person: &ObjectRef = contents["x"].as_object().unwrap();
        assert_eq!(person.downcast_ref::<Person>().unwrap().name, "Ann");
        assert_eq!(contents["n"].as_i64(), Some(1));
    }

    #[test]
    fn header_accessors() {
        let mut raw = json_response(200, "{}");
        raw.headers.push(("Vary".to_string(), "accept".to_string()));
        raw.headers.push(("vary".to_string(), "origin".to_string()));
        let response = Response::new(raw, registry()).unwrap();

        assert!(response.has_header("VARY"));
        assert!(!response.has_header("etag"));
        assert_eq!(response.header("vary"), ["accept", "origin"]);
        assert_eq!(response.header_line("vary"), "accept, origin");
        assert_eq!(response.header_line("etag"), "");
        assert_eq!(response.headers().len(), 3);
    }

    #[test]
    fn error_for_status_maps_codes() {
        let ok = Response::new(json_response(201, "{}"), registry()).unwrap();
        assert_eq!(ok.error_for_status().unwrap().status(), 201);

        let missing = Response::new(json_response(404, "{}"), registry()).unwrap();
        assert!(matches!(missing.error_for_status(), Err(DmawError::NotFound)));

        let failed = Response::new(json_response(500, r#"{"error":"boom"}"#), registry()).unwrap();
        match failed.error_for_status() {
            Err(DmawError::HttpError { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"error":"boom"}"#);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
