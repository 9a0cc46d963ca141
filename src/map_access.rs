use serde::de::{value::Error as DeError, DeserializeSeed, Error as _, IntoDeserializer, MapAccess};

use crate::{PgRowDeserializer, PgValueDeserializer};

/// Column names as keys, decoded values as values.
pub(crate) struct PgRowMapAccess<'a> {
    pub(crate) deserializer: PgRowDeserializer<'a>,
    pub(crate) num_cols: usize,
}

impl<'de, 'a> MapAccess<'de> for PgRowMapAccess<'a> {
    type Error = DeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        let index = self.deserializer.index;
        if index >= self.num_cols {
            return Ok(None);
        }

        let name = self.deserializer.row.columns[index].as_str();
        seed.deserialize(name.into_deserializer()).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let index = self.deserializer.index;
        let value = self
            .deserializer
            .row
            .get(index)
            .cloned()
            .ok_or_else(|| DeError::custom(format!("no column at index {index}")))?;
        self.deserializer.index += 1;

        seed.deserialize(PgValueDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.num_cols.saturating_sub(self.deserializer.index))
    }
}
