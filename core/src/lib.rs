//! Directive-driven marshalling client.
//!
//! # Overview
//! Converts typed object graphs into generic JSON objects and back. Which
//! types and fields are marshalled is controlled by directives declared with
//! [`dmaw_object!`]. Marshalled objects carry an envelope (`"_dmaw":
//! {"class": ...}`) naming their type, which the unmarshaller uses together
//! with a [`TypeRegistry`] to rebuild them without any external schema.
//!
//! # Design
//! - [`marshal`] and [`unmarshal`] are pure functions over their inputs; each
//!   call allocates its own output and its own cycle guard.
//! - The registry is filled once at startup and shared read-only.
//! - [`DmawClient`] follows the host-does-IO pattern: it builds `HttpRequest`
//!   values and wraps `HttpResponse` values. A [`Transport`] supplied by the
//!   caller performs the actual round-trip.

pub mod client;
pub mod config;
pub mod data;
pub mod directive;
pub mod error;
pub mod http;
pub mod info;
pub mod marshal;
pub mod object;
pub mod registry;
pub mod response;
pub mod unmarshal;

pub use client::DmawClient;
pub use config::ClientConfig;
pub use data::{Data, DataMap, FromData, IntoData, Mismatch, ObjectRef};
pub use directive::{resolve, Directive};
pub use error::DmawError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use info::{FieldInfo, TypeInfo, Typed};
pub use marshal::{marshal, marshal_with, ENVELOPE_KEY};
pub use object::Object;
pub use registry::{Registration, TypeRegistry};
pub use response::Response;
pub use unmarshal::{unmarshal, Unmarshaller};
