//! Typed values to generic JSON values.
//!
//! # Design
//! Visibility is decided per object from two inputs: the directive of the
//! object's type and whether the object was reached through a field that was
//! already approved ("include mode"). `Exclude` always wins. Once an object is
//! marshalled, everything reachable through its non-excluded fields is
//! marshalled too, unless a nested type excludes itself.
//!
//! Dropped objects keep their key and marshal to an empty mapping; excluded
//! fields lose their key entirely.
//!
//! The objects on the current descent path are tracked by identity, so a graph
//! that loops back on itself fails with [`DmawError::CycleError`] instead of
//! recursing forever. Shared, acyclic references are marshalled once per
//! occurrence.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::trace;

use crate::data::{Data, DataMap, ObjectRef};
use crate::directive::{resolve, Directive};
use crate::error::DmawError;

/// Reserved key carrying origin-type metadata.
pub const ENVELOPE_KEY: &str = "_dmaw";

/// Envelope field holding the type name.
pub const ENVELOPE_CLASS: &str = "class";

/// Marshal a mapping of typed values into a generic JSON object.
///
/// Top-level objects are marshalled only if their type is `Include`.
pub fn marshal(input: &DataMap) -> Result<Map<String, Value>, DmawError> {
    marshal_with(input, false)
}

/// [`marshal`] with an explicit include mode. With `include_mode` set, every
/// object is treated as already approved unless its type is `Exclude`.
pub fn marshal_with(input: &DataMap, include_mode: bool) -> Result<Map<String, Value>, DmawError> {
    Marshaller::default().map(input, include_mode)
}

#[derive(Default)]
struct Marshaller {
    path: HashSet<usize>,
}

impl Marshaller {
    fn map(&mut self, input: &DataMap, include_mode: bool) -> Result<Map<String, Value>, DmawError> {
        let mut output = Map::with_capacity(input.len());
        for (key, data) in input {
            output.insert(key.clone(), self.value(data, include_mode)?);
        }
        Ok(output)
    }

    fn value(&mut self, data: &Data, include_mode: bool) -> Result<Value, DmawError> {
        Ok(match data {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Number(n) => Value::Number(n.clone()),
            Data::String(s) => Value::String(s.clone()),
            Data::Seq(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.value(item, include_mode))
                    .collect::<Result<_, _>>()?,
            ),
            Data::Map(map) => Value::Object(self.map(map, include_mode)?),
            Data::Object(object) => Value::Object(self.object(object, include_mode)?),
        })
    }

    fn object(&mut self, object: &ObjectRef, include_mode: bool) -> Result<Map<String, Value>, DmawError> {
        let info = object.info();
        match resolve(info)? {
            Directive::Exclude => {
                trace!(class = info.name(), "dropping excluded object");
                return Ok(Map::new());
            }
            Directive::Unspecified if !include_mode => {
                trace!(class = info.name(), "dropping unapproved object");
                return Ok(Map::new());
            }
            _ => {}
        }

        let id = object.id();
        if !self.path.insert(id) {
            return Err(DmawError::CycleError { class: info.name() });
        }
        let result = self.fields(object);
        self.path.remove(&id);
        result
    }

    fn fields(&mut self, object: &ObjectRef) -> Result<Map<String, Value>, DmawError> {
        let info = object.info();
        let guard = object.borrow()?;

        let mut output = Map::with_capacity(info.fields().len() + 1);
        for field in info.fields() {
            if resolve(field)?.is_excluded() {
                continue;
            }
            let data = guard.field(field.name()).unwrap_or_default();
            output.insert(field.name().to_owned(), self.value(&data, true)?);
        }

        let mut envelope = Map::with_capacity(1);
        envelope.insert(ENVELOPE_CLASS.to_owned(), Value::String(info.name().to_owned()));
        output.insert(ENVELOPE_KEY.to_owned(), Value::Object(envelope));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::indexmap;
    use serde_json::json;

    use super::*;
    use crate::dmaw_object;

    #[derive(Debug, Default)]
    struct Person {
        name: String,
        age: i64,
        password: String,
        address: Option<ObjectRef>,
    }

    dmaw_object! {
        #[dmaw(include)]
        Person as "Person" {
            name,
            age,
            #[dmaw(exclude)]
            password,
            address,
        }
    }

    #[derive(Debug, Default)]
    struct Address {
        city: String,
    }

    dmaw_object! {
        Address as "Address" { city }
    }

    #[derive(Debug, Default)]
    struct Secret {
        value: String,
    }

    dmaw_object! {
        #[dmaw(exclude)]
        Secret as "Secret" { value }
    }

    #[derive(Debug, Default)]
    struct Node {
        label: String,
        next: Option<ObjectRef>,
        children: Vec<ObjectRef>,
    }

    dmaw_object! {
        #[dmaw(include)]
        Node as "Node" { label, next, children }
    }

    fn ann() -> Person {
        Person {
            name: "Ann".into(),
            age: 30,
            password: "hunter2".into(),
            address: None,
        }
    }

    fn single(key: &str, data: Data) -> DataMap {
        indexmap! { key.to_owned() => data }
    }

    #[test]
    fn included_object_gets_envelope_last() {
        let output = marshal(&single("x", ObjectRef::new(ann()).into())).unwrap();
        assert_eq!(
            serde_json::to_string(&output["x"]).unwrap(),
            r#"{"name":"Ann","age":30,"address":null,"_dmaw":{"class":"Person"}}"#
        );
    }

    #[test]
    fn excluded_field_never_appears() {
        let output = marshal(&single("x", ObjectRef::new(ann()).into())).unwrap();
        assert!(output["x"].get("password").is_none());

        let output = marshal_with(&single("x", ObjectRef::new(ann()).into()), true).unwrap();
        assert!(output["x"].get("password").is_none());
    }

    #[test]
    fn top_level_unspecified_object_is_dropped() {
        let address = Address { city: "Oslo".into() };
        let output = marshal(&single("x", ObjectRef::new(address).into())).unwrap();
        assert_eq!(output["x"], json!({}));
    }

    #[test]
    fn include_mode_approves_unspecified_objects() {
        let address = Address { city: "Oslo".into() };
        let output = marshal_with(&single("x", ObjectRef::new(address).into()), true).unwrap();
        assert_eq!(output["x"], json!({"city": "Oslo", "_dmaw": {"class": "Address"}}));
    }

    #[test]
    fn nested_unspecified_object_inherits_include() {
        let person = Person {
            address: Some(ObjectRef::new(Address { city: "Oslo".into() })),
            ..ann()
        };
        let output = marshal(&single("x", ObjectRef::new(person).into())).unwrap();
        assert_eq!(
            output["x"]["address"],
            json!({"city": "Oslo", "_dmaw": {"class": "Address"}})
        );
    }

    #[test]
    fn excluded_type_wins_over_include_mode() {
        let secret = || ObjectRef::new(Secret { value: "s3cr3t".into() });
        let output = marshal_with(&single("x", secret().into()), true).unwrap();
        assert_eq!(output["x"], json!({}));

        let person = Person {
            address: Some(secret()),
            ..ann()
        };
        let output = marshal(&single("x", ObjectRef::new(person).into())).unwrap();
        assert_eq!(output["x"]["address"], json!({}));
    }

    #[test]
    fn containers_recurse_with_same_mode() {
        let input = indexmap! {
            "list".to_owned() => Data::Seq(vec![
                Data::from(1i64),
                ObjectRef::new(Address { city: "Oslo".into() }).into(),
                ObjectRef::new(ann()).into(),
            ]),
            "nested".to_owned() => Data::Map(single("deep", ObjectRef::new(ann()).into())),
        };
        let output = marshal(&input).unwrap();
        assert_eq!(output["list"][0], json!(1));
        assert_eq!(output["list"][1], json!({}));
        assert_eq!(output["list"][2]["name"], json!("Ann"));
        assert_eq!(output["nested"]["deep"]["_dmaw"]["class"], json!("Person"));
    }

    #[test]
    fn scalars_pass_through_in_order() {
        let input = indexmap! {
            "z".to_owned() => Data::from("last"),
            "a".to_owned() => Data::Bool(false),
            "m".to_owned() => Data::Null,
        };
        let output = marshal(&input).unwrap();
        let keys: Vec<_> = output.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(Value::Object(output), json!({"z": "last", "a": false, "m": null}));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let a = ObjectRef::new(Node { label: "a".into(), ..Node::default() });
        a.downcast_mut::<Node>().unwrap().next = Some(a.clone());

        let err = marshal(&single("a", a.clone().into())).unwrap_err();
        assert!(matches!(err, DmawError::CycleError { class: "Node" }));

        // Break the cycle so the test does not leak.
        a.downcast_mut::<Node>().unwrap().next = None;
    }

    #[test]
    fn mutual_reference_is_a_cycle() {
        let a = ObjectRef::new(Node { label: "a".into(), ..Node::default() });
        let b = ObjectRef::new(Node {
            label: "b".into(),
            next: Some(a.clone()),
            ..Node::default()
        });
        a.downcast_mut::<Node>().unwrap().children.push(b.clone());

        let err = marshal(&single("b", b.into())).unwrap_err();
        assert!(matches!(err, DmawError::CycleError { .. }));

        a.downcast_mut::<Node>().unwrap().children.clear();
    }

    #[test]
    fn shared_reference_is_not_a_cycle() {
        let leaf = ObjectRef::new(Node { label: "leaf".into(), ..Node::default() });
        let root = ObjectRef::new(Node {
            label: "root".into(),
            next: Some(leaf.clone()),
            children: vec![leaf.clone(), leaf],
        });

        let output = marshal(&single("root", root.into())).unwrap();
        assert_eq!(output["root"]["next"]["label"], json!("leaf"));
        assert_eq!(output["root"]["children"][1]["label"], json!("leaf"));
    }

    #[test]
    fn mutably_borrowed_object_is_reported() {
        let a = ObjectRef::new(ann());
        let _guard = a.downcast_mut::<Person>().unwrap();
        let err = marshal(&single("a", a.clone().into())).unwrap_err();
        assert!(matches!(err, DmawError::BorrowError { class: "Person" }));
    }
}
