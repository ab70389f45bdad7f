//! Error types for the DMAW client and its marshalling core.
//!
//! # Design
//! One enum covers both halves of the crate. The marshalling variants carry
//! the type name and, for unmarshalling, the JSON path of the subtree that
//! failed so callers can tell which entry was rejected. `NotFound` keeps its
//! dedicated variant because callers frequently distinguish "the resource does
//! not exist" from "the server returned an unexpected status."

use thiserror::Error;

/// Errors returned by the resolver, marshaller, unmarshaller and client.
#[derive(Debug, Error)]
pub enum DmawError {
    /// Directive resolution was asked about something that is not a type or
    /// field descriptor.
    #[error("directives can only be resolved from type or field descriptors, got `{found}`")]
    InvalidSubjectError { found: &'static str },

    /// An envelope was found without a usable `class` definition.
    #[error("envelope at {path} must contain a class definition")]
    MetadataError { path: String },

    /// The envelope names a type that was never registered.
    #[error("unknown type `{class}` at {path}")]
    UnknownTypeError { class: String, path: String },

    /// The object graph re-entered an object that is still being marshalled.
    #[error("object graph cycles back into `{class}`")]
    CycleError { class: &'static str },

    /// A rehydrated value does not fit the declared field.
    #[error("field `{field}` of `{class}` expects {expected}, found {found}")]
    FieldTypeError {
        class: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The object is currently borrowed in a way that conflicts with the
    /// requested access.
    #[error("object of type `{class}` is already borrowed")]
    BorrowError { class: &'static str },

    /// The response does not carry JSON content.
    #[error("HTTP response must contain JSON content, got `{content_type}`")]
    ContentTypeError { content_type: String },

    /// The response body is not a JSON object.
    #[error("error parsing response body as JSON: {0}")]
    JsonParseError(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    TransportError(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// Client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}
