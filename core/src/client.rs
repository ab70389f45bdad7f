//! Stateless HTTP request builder for DMAW payloads.
//!
//! # Design
//! `DmawClient` holds only a base URL, the extra headers from its config, and
//! a shared handle to the type registry; it carries no mutable state between
//! calls. Each verb is split into a `build_*` method that marshals the payload
//! into an `HttpRequest`, and a convenience method that runs the request
//! through a caller-supplied [`Transport`] and wraps the result in a
//! [`Response`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::data::DataMap;
use crate::error::DmawError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, JSON_MEDIA_TYPE};
use crate::marshal::marshal;
use crate::registry::TypeRegistry;
use crate::response::Response;

/// Synchronous, stateless client for DMAW-speaking APIs.
#[derive(Debug, Clone)]
pub struct DmawClient {
    base_url: String,
    headers: Vec<(String, String)>,
    registry: Arc<TypeRegistry>,
}

impl DmawClient {
    pub fn new(base_url: &str, registry: Arc<TypeRegistry>) -> Self {
        Self::from_config(&ClientConfig::new(base_url), registry)
    }

    pub fn from_config(config: &ClientConfig, registry: Arc<TypeRegistry>) -> Self {
        let headers = config
            .headers
            .iter()
            .filter(|(name, _)| {
                let reserved = name.eq_ignore_ascii_case("accept")
                    || name.eq_ignore_ascii_case("content-type");
                if reserved {
                    warn!(header = name.as_str(), "ignoring override of a reserved header");
                }
                !reserved
            })
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            registry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Marshal `data` and describe a request with it as the JSON body.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        data: &DataMap,
    ) -> Result<HttpRequest, DmawError> {
        let body = serde_json::to_string(&Value::Object(marshal(data)?))
            .map_err(DmawError::SerializationError)?;

        let mut headers = vec![
            ("accept".to_string(), JSON_MEDIA_TYPE.to_string()),
            ("content-type".to_string(), JSON_MEDIA_TYPE.to_string()),
        ];
        headers.extend(self.headers.iter().cloned());

        Ok(HttpRequest {
            method,
            path: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            headers,
            body: Some(body),
        })
    }

    pub fn build_get(&self, path: &str, data: &DataMap) -> Result<HttpRequest, DmawError> {
        self.build_request(HttpMethod::Get, path, data)
    }

    pub fn build_post(&self, path: &str, data: &DataMap) -> Result<HttpRequest, DmawError> {
        self.build_request(HttpMethod::Post, path, data)
    }

    pub fn build_put(&self, path: &str, data: &DataMap) -> Result<HttpRequest, DmawError> {
        self.build_request(HttpMethod::Put, path, data)
    }

    pub fn build_patch(&self, path: &str, data: &DataMap) -> Result<HttpRequest, DmawError> {
        self.build_request(HttpMethod::Patch, path, data)
    }

    pub fn build_delete(&self, path: &str, data: &DataMap) -> Result<HttpRequest, DmawError> {
        self.build_request(HttpMethod::Delete, path, data)
    }

    /// Wrap a raw response, checking that it carries JSON.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Response, DmawError> {
        Response::new(response, Arc::clone(&self.registry))
    }

    /// Build, execute and wrap a request.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        method: HttpMethod,
        path: &str,
        data: &DataMap,
    ) -> Result<Response, DmawError> {
        let request = self.build_request(method, path, data)?;
        debug!(method = method.as_str(), path = %request.path, "sending request");
        let response = transport.execute(request)?;
        debug!(status = response.status, "received response");
        self.parse_response(response)
    }

    pub fn get<T: Transport + ?Sized>(&self, transport: &T, path: &str, data: &DataMap) -> Result<Response, DmawError> {
        self.send(transport, HttpMethod::Get, path, data)
    }

    pub fn post<T: Transport + ?Sized>(&self, transport: &T, path: &str, data: &DataMap) -> Result<Response, DmawError> {
        self.send(transport, HttpMethod::Post, path, data)
    }

    pub fn put<T: Transport + ?Sized>(&self, transport: &T, path: &str, data: &DataMap) -> Result<Response, DmawError> {
        self.send(transport, HttpMethod::Put, path, data)
    }

    pub fn patch<T: Transport + ?Sized>(&self, transport: &T, path: &str, data: &DataMap) -> Result<Response, DmawError> {
        self.send(transport, HttpMethod::Patch, path, data)
    }

    pub fn delete<T: Transport + ?Sized>(&self, transport: &T, path: &str, data: &DataMap) -> Result<Response, DmawError> {
        self.send(transport, HttpMethod::Delete, path, data)
    }
}
