//! Visibility directives for types and fields.
//!
//! # Design
//! A directive is resolved once, when a descriptor is built, either from an
//! explicit `#[dmaw(...)]` declaration or by scanning documentation text for
//! the `@dmaw` marker. The marshaller only ever reads the stored value through
//! [`resolve`], so no string scanning happens per call.

use std::any::{type_name, Any};

use crate::data::ObjectRef;
use crate::error::DmawError;
use crate::info::{FieldInfo, TypeInfo};

/// Marker token introducing a directive inside documentation text.
pub const MARKER: &str = "@dmaw";

/// Per-type or per-field visibility instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Directive {
    /// Marshal the subject.
    Include,
    /// Never marshal the subject, whatever its container says.
    Exclude,
    /// No instruction; the container decides.
    #[default]
    Unspecified,
}

impl Directive {
    /// Match a keyword against the closed set `{"exclude", "include"}`.
    ///
    /// The comparison is case-sensitive; anything else is `Unspecified`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "include" => Directive::Include,
            "exclude" => Directive::Exclude,
            _ => Directive::Unspecified,
        }
    }

    /// Extract a directive from free-form documentation text.
    ///
    /// The marker is located case-insensitively; the first
    /// whitespace-delimited token after it is the keyword.
    ///
    /// ```
    /// use dmaw_core::Directive;
    ///
    /// assert_eq!(Directive::from_docs("/** @DMAW exclude */"), Directive::Exclude);
    /// assert_eq!(Directive::from_docs("@dmaw Include"), Directive::Unspecified);
    /// assert_eq!(Directive::from_docs("plain docs"), Directive::Unspecified);
    /// ```
    pub fn from_docs(docs: &str) -> Self {
        // ASCII lowercasing keeps byte offsets aligned with `docs`.
        let Some(at) = docs.to_ascii_lowercase().find(MARKER) else {
            return Directive::Unspecified;
        };
        docs[at + MARKER.len()..]
            .split_whitespace()
            .next()
            .map_or(Directive::Unspecified, Directive::from_keyword)
    }

    pub fn is_excluded(self) -> bool {
        self == Directive::Exclude
    }

    pub fn is_included(self) -> bool {
        self == Directive::Include
    }
}

/// Resolve the directive attached to a type descriptor, a field descriptor, or
/// the type of an object handle.
///
/// Any other subject is a programming error and yields
/// [`DmawError::InvalidSubjectError`].
pub fn resolve<S: Any>(subject: &S) -> Result<Directive, DmawError> {
    let any: &dyn Any = subject;
    if let Some(info) = any.downcast_ref::<TypeInfo>() {
        return Ok(info.directive());
    }
    if let Some(field) = any.downcast_ref::<FieldInfo>() {
        return Ok(field.directive());
    }
    if let Some(object) = any.downcast_ref::<ObjectRef>() {
        return Ok(object.info().directive());
    }
    Err(DmawError::InvalidSubjectError {
        found: type_name::<S>(),
    })
}
