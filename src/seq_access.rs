use serde::de::{value::Error as DeError, DeserializeSeed, SeqAccess};

use crate::{PgRowDeserializer, PgValue, PgValueDeserializer};

/// A SeqAccess implementation that iterates over the row’s columns
pub(crate) struct PgRowSeqAccess<'a> {
    pub(crate) deserializer: PgRowDeserializer<'a>,
    pub(crate) num_cols: usize,
}

impl<'de, 'a> SeqAccess<'de> for PgRowSeqAccess<'a> {
    type Error = DeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        if self.deserializer.index < self.num_cols {
            let value = self.deserializer.row.values[self.deserializer.index].clone();

            log::trace!(
                "Deserializing column {} (`{}`)",
                self.deserializer.index,
                self.deserializer.row.columns[self.deserializer.index]
            );

            self.deserializer.index += 1;

            seed.deserialize(PgValueDeserializer::new(value)).map(Some)
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.num_cols - self.deserializer.index)
    }
}

/// SeqAccess over the elements of an array or the fields of a record.
/// NULL elements reach the seed as `PgValue::Null`, so they only
/// deserialize into `Option`s.
pub(crate) struct PgValueSeqAccess {
    iter: std::vec::IntoIter<PgValue>,
}

impl PgValueSeqAccess {
    pub(crate) fn new(items: Vec<PgValue>) -> Self {
        PgValueSeqAccess {
            iter: items.into_iter(),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.iter.len()
    }
}

impl<'de> SeqAccess<'de> for PgValueSeqAccess {
    type Error = DeError;

    fn next_element_seed<U>(&mut self, seed: U) -> Result<Option<U::Value>, Self::Error>
    where
        U: DeserializeSeed<'de>,
    {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };

        seed.deserialize(PgValueDeserializer::new(value)).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
