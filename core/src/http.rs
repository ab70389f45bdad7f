//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and wraps `HttpResponse` values without ever
//! touching the network; executing the round-trip is the job of a
//! [`Transport`] supplied by the caller. This keeps marshalling deterministic
//! and easy to test.
//!
//! All fields use owned types (`String`, `Vec`) so values can be handed to any
//! HTTP stack without lifetime concerns.

use crate::error::DmawError;

/// Media type sent and expected by the client.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `DmawClient::build_*` methods. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name).first().copied()
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the [`Transport`] after executing an `HttpRequest`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name).first().copied()
    }
}

/// Every value of the header `name`, in order, compared case-insensitively.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
        .collect()
}

/// Executes an [`HttpRequest`] against the network.
///
/// Non-2xx statuses are data, not errors: implementations should return them
/// as an `HttpResponse` and reserve `Err` for failures to complete the
/// round-trip at all.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, DmawError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, DmawError> {
        (**self).execute(request)
    }
}
