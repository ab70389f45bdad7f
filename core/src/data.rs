//! The typed side of marshalling: values that may embed objects.
//!
//! # Design
//! [`Data`] mirrors the JSON value model with one extra variant,
//! [`Data::Object`], holding a shared handle to a typed object. Objects are
//! reference-counted so graphs may share (and, by mistake, cycle back into)
//! nodes; the handle's allocation address is the identity the marshaller's
//! cycle guard tracks.
//!
//! Field values cross the `Object` boundary through [`IntoData`] and
//! [`FromData`], implemented here for the usual scalar and container types.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::DmawError;
use crate::info::{TypeInfo, Typed};
use crate::object::Object;

/// Insertion-ordered mapping of named values.
pub type DataMap = IndexMap<String, Data>;

/// A value on the typed side of the marshaller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Data {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Vec<Data>),
    Map(DataMap),
    Object(ObjectRef),
}

impl Data {
    /// Human-readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "boolean",
            Data::Number(_) => "number",
            Data::String(_) => "string",
            Data::Seq(_) => "sequence",
            Data::Map(_) => "mapping",
            Data::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Data::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Data::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Data::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Data]> {
        match self {
            Data::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            Data::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Data::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True for the empty mapping the marshaller leaves in place of a dropped
    /// object.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Data::Map(map) if map.is_empty())
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Data> {
        self.as_map().and_then(|map| map.get(key))
    }
}

/// Generic conversion; no envelope handling happens here.
impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => Data::Number(n),
            Value::String(s) => Data::String(s),
            Value::Array(items) => Data::Seq(items.into_iter().map(Data::from).collect()),
            Value::Object(map) => Data::Map(map.into_iter().map(|(k, v)| (k, Data::from(v))).collect()),
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Bool(b)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_owned())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl From<i64> for Data {
    fn from(n: i64) -> Self {
        Data::Number(n.into())
    }
}

impl From<Vec<Data>> for Data {
    fn from(items: Vec<Data>) -> Self {
        Data::Seq(items)
    }
}

impl From<DataMap> for Data {
    fn from(map: DataMap) -> Self {
        Data::Map(map)
    }
}

impl From<ObjectRef> for Data {
    fn from(object: ObjectRef) -> Self {
        Data::Object(object)
    }
}

// -----------------------------------------------------------------------------
// ObjectRef

/// Shared handle to a typed object.
///
/// Cloning the handle clones the reference, not the object. Equality is
/// identity.
#[derive(Clone)]
pub struct ObjectRef {
    info: &'static TypeInfo,
    cell: Rc<RefCell<dyn Object>>,
}

impl ObjectRef {
    pub fn new<T: Typed>(object: T) -> Self {
        Self {
            info: T::type_info(),
            cell: Rc::new(RefCell::new(object)),
        }
    }

    /// Descriptor of the object's concrete type.
    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        self.info
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.cell) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.id() == other.id()
    }

    pub fn borrow(&self) -> Result<Ref<'_, dyn Object>, DmawError> {
        self.cell.try_borrow().map_err(|_| DmawError::BorrowError {
            class: self.info.name(),
        })
    }

    pub fn borrow_mut(&self) -> Result<RefMut<'_, dyn Object>, DmawError> {
        self.cell.try_borrow_mut().map_err(|_| DmawError::BorrowError {
            class: self.info.name(),
        })
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrow the object as its concrete type.
    ///
    /// Returns `None` when the type does not match or the object is mutably
    /// borrowed elsewhere.
    pub fn downcast_ref<T: Any>(&self) -> Option<Ref<'_, T>> {
        let guard = self.cell.try_borrow().ok()?;
        Ref::filter_map(guard, |object| object.as_any().downcast_ref::<T>()).ok()
    }

    pub fn downcast_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        let guard = self.cell.try_borrow_mut().ok()?;
        RefMut::filter_map(guard, |object| object.as_any_mut().downcast_mut::<T>()).ok()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Only the identity is printed; graphs may be cyclic.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.info.name())
            .field("id", &format_args!("{:#x}", self.id()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Field conversions

/// Shape mismatch produced by [`FromData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Mismatch {
    pub fn new(expected: &'static str, found: &Data) -> Self {
        Self {
            expected,
            found: found.kind(),
        }
    }

    /// Attach the owning type and field.
    pub fn into_field_error(self, class: &str, field: &str) -> DmawError {
        DmawError::FieldTypeError {
            class: class.to_owned(),
            field: field.to_owned(),
            expected: self.expected,
            found: self.found,
        }
    }
}

/// Read a field value as [`Data`].
pub trait IntoData {
    fn to_data(&self) -> Data;
}

/// Assign a field value from [`Data`].
pub trait FromData: Sized {
    fn from_data(data: Data) -> Result<Self, Mismatch>;
}

impl IntoData for Data {
    fn to_data(&self) -> Data {
        self.clone()
    }
}

impl FromData for Data {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        Ok(data)
    }
}

impl IntoData for bool {
    fn to_data(&self) -> Data {
        Data::Bool(*self)
    }
}

impl FromData for bool {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        data.as_bool().ok_or_else(|| Mismatch::new("boolean", &data))
    }
}

impl IntoData for String {
    fn to_data(&self) -> Data {
        Data::String(self.clone())
    }
}

impl FromData for String {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        match data {
            Data::String(s) => Ok(s),
            other => Err(Mismatch::new("string", &other)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl IntoData for $ty {
            fn to_data(&self) -> Data {
                Data::Number(Number::from(*self))
            }
        }

        impl FromData for $ty {
            fn from_data(data: Data) -> Result<Self, Mismatch> {
                let Data::Number(n) = &data else {
                    return Err(Mismatch::new(stringify!($ty), &data));
                };
                n.as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .or_else(|| n.as_u64().and_then(|v| <$ty>::try_from(v).ok()))
                    .ok_or_else(|| Mismatch::new(stringify!($ty), &data))
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoData for f64 {
    fn to_data(&self) -> Data {
        // JSON has no NaN or infinities.
        Number::from_f64(*self).map_or(Data::Null, Data::Number)
    }
}

impl FromData for f64 {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        data.as_f64().ok_or_else(|| Mismatch::new("f64", &data))
    }
}

impl IntoData for f32 {
    fn to_data(&self) -> Data {
        f64::from(*self).to_data()
    }
}

impl FromData for f32 {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        data.as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| Mismatch::new("f32", &data))
    }
}

impl IntoData for ObjectRef {
    fn to_data(&self) -> Data {
        Data::Object(self.clone())
    }
}

impl FromData for ObjectRef {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        match data {
            Data::Object(object) => Ok(object),
            other => Err(Mismatch::new("object", &other)),
        }
    }
}

impl<T: IntoData> IntoData for Option<T> {
    fn to_data(&self) -> Data {
        self.as_ref().map_or(Data::Null, IntoData::to_data)
    }
}

impl<T: FromData> FromData for Option<T> {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        match data {
            Data::Null => Ok(None),
            // An empty mapping is the placeholder left by a dropped object.
            Data::Map(map) if map.is_empty() => Ok(T::from_data(Data::Map(map)).ok()),
            other => T::from_data(other).map(Some),
        }
    }
}

/// Convert a container element, skipping placeholders `T` cannot hold.
fn element<T: FromData>(data: Data) -> Option<Result<T, Mismatch>> {
    let placeholder = data.is_placeholder();
    match T::from_data(data) {
        Err(_) if placeholder => None,
        result => Some(result),
    }
}

impl<T: IntoData> IntoData for Vec<T> {
    fn to_data(&self) -> Data {
        Data::Seq(self.iter().map(IntoData::to_data).collect())
    }
}

impl<T: FromData> FromData for Vec<T> {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        match data {
            Data::Seq(items) => items.into_iter().filter_map(element).collect(),
            other => Err(Mismatch::new("sequence", &other)),
        }
    }
}

impl<T: IntoData> IntoData for IndexMap<String, T> {
    fn to_data(&self) -> Data {
        Data::Map(self.iter().map(|(k, v)| (k.clone(), v.to_data())).collect())
    }
}

impl<T: FromData> FromData for IndexMap<String, T> {
    fn from_data(data: Data) -> Result<Self, Mismatch> {
        match data {
            Data::Map(map) => map
                .into_iter()
                .filter_map(|(k, v)| element(v).map(|v| v.map(|v| (k, v))))
                .collect(),
            other => Err(Mismatch::new("mapping", &other)),
        }
    }
}
