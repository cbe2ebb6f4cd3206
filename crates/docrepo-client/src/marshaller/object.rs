//! Marshaller for application-defined business objects.
//!
//! Any serde type can travel as a business object. On the wire it is an
//! adapter envelope `{"entity-type": <adapter>, "value": <T as JSON>}`;
//! the adapter tag selects the decoder and `T`'s type selects the encoder.

use std::any::{Any, TypeId};
use std::marker::PhantomData;

use docrepo_error::{ClientError, ClientResult};
use docrepo_types::{EntityObject, OperationResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::{Marshaller, Payload};

pub struct ObjectMarshaller<T> {
    entity_type: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ObjectMarshaller<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Marshaller exchanging `T` under the adapter tag `entity_type`
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            _marker: PhantomData,
        }
    }

    /// Wrap a value as an operation input of this adapter
    pub fn wrap(&self, value: T) -> EntityObject {
        EntityObject::new(self.entity_type.clone(), value)
    }
}

impl<T> Marshaller for ObjectMarshaller<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn entity_type(&self) -> Option<&str> {
        Some(&self.entity_type)
    }

    fn input_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<T>())
    }

    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            ClientError::encoding(format!(
                "{} marshaller received another input type",
                self.entity_type
            ))
        })?;
        let value = serde_json::to_value(value).map_err(|e| {
            ClientError::encoding(format!("Failed to encode {}: {}", self.entity_type, e))
        })?;
        Ok(json!({ "entity-type": self.entity_type, "value": value }))
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let mut body = payload.into_json()?;
        let value = body
            .get_mut("value")
            .map(Value::take)
            .ok_or_else(|| {
                ClientError::decoding(format!("{} body has no value", self.entity_type))
            })?;
        let value: T = serde_json::from_value(value)?;
        Ok(OperationResult::Object(EntityObject::new(self.entity_type.clone(), value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct BusinessBean {
        title: String,
        note: String,
        id: Option<String>,
    }

    #[test]
    fn test_encode_then_decode_yields_original() {
        let marshaller = ObjectMarshaller::<BusinessBean>::new("BusinessBeanAdapter");
        let bean = BusinessBean {
            title: "Note".to_string(),
            note: "File description".to_string(),
            id: None,
        };

        let wire = marshaller.encode(&bean).unwrap();
        assert_eq!(wire["entity-type"], "BusinessBeanAdapter");
        assert_eq!(wire["value"]["title"], "Note");

        let decoded: BusinessBean = marshaller
            .decode(Payload::Json(wire))
            .unwrap()
            .into_object()
            .unwrap();
        assert_eq!(decoded, bean);
    }

    #[test]
    fn test_wrapped_input_resolves_to_this_encoder() {
        let marshaller = ObjectMarshaller::<BusinessBean>::new("BusinessBeanAdapter");
        let object = marshaller.wrap(BusinessBean {
            title: "t".to_string(),
            note: "n".to_string(),
            id: None,
        });
        assert_eq!(Some(object.value_type_id()), marshaller.input_type());
        let untyped = Payload::Json(json!({"entity-type": "BusinessBeanAdapter"}));
        assert!(marshaller.decode(untyped).is_err());
    }
}
