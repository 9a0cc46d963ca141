use serde::{
    de::{self, value::Error as DeError, Deserializer, Error as _, IntoDeserializer},
    forward_to_deserialize_any,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types;

/// Version byte that prefixes binary `jsonb` values.
const JSONB_VERSION: u8 = 1;

#[derive(Debug)]
pub(crate) struct PgJson(pub(crate) serde_json::Value);

impl PgJson {
    pub(crate) fn from_text(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map(PgJson)
            .map_err(|e| Error::decode("JSON", e))
    }

    pub(crate) fn from_binary(oid: u32, buf: &[u8]) -> Result<Self> {
        let body = match (oid, buf.split_first()) {
            (types::JSONB, Some((&JSONB_VERSION, body))) => body,
            (types::JSONB, _) => return Err(Error::decode("JSONB", "unsupported jsonb version")),
            _ => buf,
        };

        serde_json::from_slice(body)
            .map(PgJson)
            .map_err(|e| Error::decode(types::name_of(oid), e))
    }
}

pub struct PgJsonDeserializer {
    value: Value,
}

impl<'de> Deserializer<'de> for PgJsonDeserializer {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        // Delegate to serde_json::Value's own Deserializer implementation.
        self.value.deserialize_any(visitor).map_err(DeError::custom)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.value.deserialize_option(visitor).map_err(DeError::custom)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.value
            .deserialize_enum(name, variants, visitor)
            .map_err(DeError::custom)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, DeError> for PgJson {
    type Deserializer = PgJsonDeserializer;

    fn into_deserializer(self) -> Self::Deserializer {
        PgJsonDeserializer { value: self.0 }
    }
}
