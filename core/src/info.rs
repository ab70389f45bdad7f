//! Static type and field descriptors.
//!
//! # Design
//! Every participating type owns exactly one [`TypeInfo`], created lazily and
//! kept for the life of the process (see [`Typed::type_info`]). The descriptor
//! carries everything the marshaller needs: the fully-qualified name written
//! into envelopes, the type directive, and the fields in declaration order.

use crate::directive::Directive;
use crate::object::Object;

/// Descriptor of a single settable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    name: &'static str,
    directive: Directive,
    docs: Option<&'static str>,
}

impl FieldInfo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            directive: Directive::Unspecified,
            docs: None,
        }
    }

    /// Replace the directive.
    pub const fn with_directive(self, directive: Directive) -> Self {
        Self { directive, ..self }
    }

    /// Attach documentation text and take the directive from it.
    pub fn with_docs(self, docs: &'static str) -> Self {
        Self {
            directive: Directive::from_docs(docs),
            docs: Some(docs),
            ..self
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn directive(&self) -> Directive {
        self.directive
    }

    #[inline]
    pub const fn docs(&self) -> Option<&'static str> {
        self.docs
    }
}

/// Descriptor of a marshallable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    name: &'static str,
    directive: Directive,
    docs: Option<&'static str>,
    fields: Box<[FieldInfo]>,
}

impl TypeInfo {
    /// Create a descriptor. `fields` must be in declaration order; that order
    /// is the order of keys in marshalled output.
    pub fn new(name: &'static str, fields: Vec<FieldInfo>) -> Self {
        Self {
            name,
            directive: Directive::Unspecified,
            docs: None,
            fields: fields.into_boxed_slice(),
        }
    }

    /// Replace the directive.
    pub fn with_directive(self, directive: Directive) -> Self {
        Self { directive, ..self }
    }

    /// Attach documentation text and take the directive from it.
    pub fn with_docs(self, docs: &'static str) -> Self {
        Self {
            directive: Directive::from_docs(docs),
            docs: Some(docs),
            ..self
        }
    }

    /// The fully-qualified name used as the envelope `class` and registry key.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn directive(&self) -> Directive {
        self.directive
    }

    #[inline]
    pub const fn docs(&self) -> Option<&'static str> {
        self.docs
    }

    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Look up a field by its exact name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Types with a static [`TypeInfo`].
///
/// Usually implemented through [`dmaw_object!`](crate::dmaw_object).
pub trait Typed: Object + Sized {
    fn type_info() -> &'static TypeInfo;
}
