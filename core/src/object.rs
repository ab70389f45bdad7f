//! The `Object` trait and the `dmaw_object!` declaration macro.

use std::any::Any;

use crate::data::Data;
use crate::error::DmawError;

/// A typed value whose fields the marshaller can read and the unmarshaller
/// can assign by name.
///
/// Implementations are normally generated by [`dmaw_object!`](crate::dmaw_object),
/// which keeps the field list in sync with the type's [`TypeInfo`](crate::TypeInfo).
pub trait Object: Any {
    /// Read a declared field. `None` if the type has no such field.
    fn field(&self, name: &str) -> Option<Data>;

    /// Assign a declared field, bypassing any visibility directive.
    ///
    /// Returns `Ok(false)` if the type has no such field.
    fn set_field(&mut self, name: &str, value: Data) -> Result<bool, DmawError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implement [`Typed`](crate::Typed) and [`Object`] for a struct.
///
/// Fields are listed in declaration order; that order is the key order of the
/// marshalled mapping. `#[dmaw(include)]` and `#[dmaw(exclude)]` may be
/// placed on the type and on any field. The registry name defaults to
/// `module_path!()::Type` and can be overridden with `as "name"`.
///
/// Each listed field must implement [`IntoData`](crate::IntoData) and
/// [`FromData`](crate::FromData); the struct must implement `Default` to be
/// registered.
///
/// ```
/// use dmaw_core::{dmaw_object, marshal, Data, DataMap, ObjectRef};
///
/// #[derive(Debug, Default)]
/// struct Person {
///     name: String,
///     age: u32,
///     password: String,
/// }
///
/// dmaw_object! {
///     #[dmaw(include)]
///     Person as "Person" {
///         name,
///         age,
///         #[dmaw(exclude)]
///         password,
///     }
/// }
///
/// let ann = Person { name: "Ann".into(), age: 30, password: "hunter2".into() };
/// let mut input = DataMap::new();
/// input.insert("x".into(), Data::Object(ObjectRef::new(ann)));
///
/// let output = marshal(&input).unwrap();
/// assert_eq!(
///     serde_json::to_string(&output["x"]).unwrap(),
///     r#"{"name":"Ann","age":30,"_dmaw":{"class":"Person"}}"#
/// );
/// ```
#[macro_export]
macro_rules! dmaw_object {
    (@name $ty:ident) => {
        ::core::concat!(::core::module_path!(), "::", ::core::stringify!($ty))
    };
    (@name $ty:ident $name:literal) => {
        $name
    };
    (@directive) => {
        $crate::Directive::Unspecified
    };
    (@directive include) => {
        $crate::Directive::Include
    };
    (@directive exclude) => {
        $crate::Directive::Exclude
    };
    (
        $(#[dmaw($type_directive:ident)])?
        $ty:ident $(as $name:literal)? {
            $(
                $(#[dmaw($field_directive:ident)])?
                $field:ident
            ),* $(,)?
        }
    ) => {
        impl $crate::Typed for $ty {
            fn type_info() -> &'static $crate::TypeInfo {
                static INFO: ::std::sync::OnceLock<$crate::TypeInfo> = ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    $crate::TypeInfo::new(
                        $crate::dmaw_object!(@name $ty $($name)?),
                        ::std::vec![
                            $(
                                $crate::FieldInfo::new(::core::stringify!($field))
                                    .with_directive($crate::dmaw_object!(@directive $($field_directive)?)),
                            )*
                        ],
                    )
                    .with_directive($crate::dmaw_object!(@directive $($type_directive)?))
                })
            }
        }

        impl $crate::Object for $ty {
            fn field(&self, name: &str) -> ::core::option::Option<$crate::Data> {
                match name {
                    $(::core::stringify!($field) => {
                        ::core::option::Option::Some($crate::IntoData::to_data(&self.$field))
                    })*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: $crate::Data,
            ) -> ::core::result::Result<bool, $crate::DmawError> {
                match name {
                    $(::core::stringify!($field) => {
                        let placeholder = value.is_placeholder();
                        match $crate::FromData::from_data(value) {
                            ::core::result::Result::Ok(value) => self.$field = value,
                            // A dropped object leaves the field at its default.
                            ::core::result::Result::Err(_) if placeholder => {}
                            ::core::result::Result::Err(mismatch) => {
                                return ::core::result::Result::Err(mismatch.into_field_error(
                                    <Self as $crate::Typed>::type_info().name(),
                                    name,
                                ));
                            }
                        }
                        ::core::result::Result::Ok(true)
                    })*
                    _ => ::core::result::Result::Ok(false),
                }
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{dmaw_object, Data, Directive, DmawError, Object, Typed};

    #[derive(Debug, Default)]
    struct Account {
        login: String,
        token: Option<String>,
        tags: Vec<String>,
    }

    dmaw_object! {
        #[dmaw(include)]
        Account {
            login,
            #[dmaw(exclude)]
            token,
            tags,
        }
    }

    #[derive(Debug, Default)]
    struct Plain {
        value: i64,
    }

    dmaw_object! {
        Plain as "tests::Plain" { value }
    }

    #[test]
    fn macro_builds_type_info() {
        let info = Account::type_info();
        assert_eq!(info.name(), concat!(module_path!(), "::Account"));
        assert_eq!(info.directive(), Directive::Include);
        let fields: Vec<_> = info
            .fields()
            .iter()
            .map(|f| (f.name(), f.directive()))
            .collect();
        assert_eq!(
            fields,
            [
                ("login", Directive::Unspecified),
                ("token", Directive::Exclude),
                ("tags", Directive::Unspecified),
            ]
        );
    }

    #[test]
    fn name_override_and_default_directive() {
        let info = Plain::type_info();
        assert_eq!(info.name(), "tests::Plain");
        assert_eq!(info.directive(), Directive::Unspecified);
    }

    #[test]
    fn fields_read_and_write_by_name() {
        let mut account = Account::default();
        assert!(account.set_field("login", Data::from("ann")).unwrap());
        assert!(account.set_field("token", Data::from("t0k3n")).unwrap());
        assert!(!account.set_field("missing", Data::Null).unwrap());

        assert_eq!(account.login, "ann");
        assert_eq!(account.token.as_deref(), Some("t0k3n"));
        assert_eq!(account.field("login"), Some(Data::from("ann")));
        assert_eq!(account.field("missing"), None);
    }

    #[test]
    fn wrong_shape_is_a_field_type_error() {
        let mut plain = Plain::default();
        let err = plain.set_field("value", Data::from("ten")).unwrap_err();
        match err {
            DmawError::FieldTypeError { class, field, expected, found } => {
                assert_eq!(class, "tests::Plain");
                assert_eq!(field, "value");
                assert_eq!(expected, "i64");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn placeholder_leaves_field_untouched() {
        let mut plain = Plain { value: 7 };
        assert!(plain.set_field("value", Data::Map(Default::default())).unwrap());
        assert_eq!(plain.value, 7);
    }
}
