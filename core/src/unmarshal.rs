//! Generic JSON values back to typed objects.
//!
//! # Design
//! Mappings are processed bottom-up: children are unmarshalled first, then the
//! mapping itself is checked for the envelope. An envelope is the only signal
//! that a mapping should become an object; everything else stays generic.
//!
//! Objects are allocated through the registry factory (a default value) and
//! then populated field by field. Keys the type does not declare are ignored;
//! declared fields are assigned whatever their directive says.
//!
//! Errors name the JSON path of the failing subtree. The input is only
//! borrowed, so a failure leaves the caller's data untouched. In lenient mode
//! an envelope that cannot be resolved keeps its subtree as a generic mapping
//! and the surrounding entries are still rehydrated.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::data::{Data, DataMap};
use crate::error::DmawError;
use crate::marshal::{ENVELOPE_CLASS, ENVELOPE_KEY};
use crate::registry::TypeRegistry;

const ROOT: &str = "$";

/// Unmarshal a generic JSON object against `registry`.
///
/// See [`Unmarshaller::unmarshal`].
pub fn unmarshal(input: &Map<String, Value>, registry: &TypeRegistry) -> Result<DataMap, DmawError> {
    Unmarshaller::new(registry).unmarshal(input)
}

/// Rehydrates enveloped mappings using a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Unmarshaller<'r> {
    registry: &'r TypeRegistry,
    lenient: bool,
}

impl<'r> Unmarshaller<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            lenient: false,
        }
    }

    /// Keep unresolvable envelopes as generic mappings instead of failing.
    ///
    /// Only `MetadataError` and `UnknownTypeError` are relaxed; field shape
    /// errors still fail the call.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Unmarshal each entry of `input`.
    ///
    /// The top-level mapping itself is never rehydrated, only its entries; use
    /// [`unmarshal_value`](Self::unmarshal_value) for that.
    pub fn unmarshal(&self, input: &Map<String, Value>) -> Result<DataMap, DmawError> {
        self.entries(input, ROOT)
    }

    /// Unmarshal a single value, rehydrating it if it is an enveloped mapping.
    pub fn unmarshal_value(&self, input: &Value) -> Result<Data, DmawError> {
        self.value(input, ROOT)
    }

    fn entries(&self, input: &Map<String, Value>, path: &str) -> Result<DataMap, DmawError> {
        input
            .iter()
            .map(|(key, value)| {
                let data = self.value(value, &format!("{path}.{key}"))?;
                Ok::<_, DmawError>((key.clone(), data))
            })
            .collect()
    }

    fn value(&self, input: &Value, path: &str) -> Result<Data, DmawError> {
        Ok(match input {
            Value::Array(items) => Data::Seq(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.value(item, &format!("{path}[{index}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let entries = self.entries(map, path)?;
                self.rehydrate(entries, path)?
            }
            scalar => Data::from(scalar.clone()),
        })
    }

    fn rehydrate(&self, mut entries: DataMap, path: &str) -> Result<Data, DmawError> {
        let Some((index, key, envelope)) = entries.shift_remove_full(ENVELOPE_KEY) else {
            return Ok(Data::Map(entries));
        };
        let registration = match envelope.get(ENVELOPE_CLASS).and_then(Data::as_str) {
            None => Err(DmawError::MetadataError {
                path: path.to_owned(),
            }),
            Some(class) => self.registry.get(class).ok_or_else(|| DmawError::UnknownTypeError {
                class: class.to_owned(),
                path: path.to_owned(),
            }),
        };
        let registration = match registration {
            Ok(registration) => registration,
            Err(err) if self.lenient => {
                warn!(path, %err, "keeping unresolved envelope as a mapping");
                entries.shift_insert(index, key, envelope);
                return Ok(Data::Map(entries));
            }
            Err(err) => return Err(err),
        };

        let info = registration.info();
        let object = registration.instantiate();
        {
            let mut target = object.borrow_mut()?;
            for (key, data) in entries {
                if info.has_field(&key) {
                    target.set_field(&key, data)?;
                }
            }
        }
        trace!(class = info.name(), path, "rehydrated object");
        Ok(Data::Object(object))
    }
}
