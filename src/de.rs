use serde::de::{
    value::Error as DeError, Deserializer, Error as _, IntoDeserializer, Unexpected, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::json::PgJson;
use crate::map_access::PgRowMapAccess;
use crate::numeric::PgNumeric;
use crate::row::DecodedRow;
use crate::seq_access::{PgRowSeqAccess, PgValueSeqAccess};
use crate::value::PgValue;

/// Deserializes a whole row.
///
/// Tuples read the columns in order, structs and maps read them by name.
/// Anything else expects a single column and reads its value.
#[derive(Clone, Copy)]
pub struct PgRowDeserializer<'a> {
    pub(crate) row: &'a DecodedRow,
    pub(crate) index: usize,
}

impl<'a> PgRowDeserializer<'a> {
    pub fn new(row: &'a DecodedRow) -> Self {
        PgRowDeserializer { row, index: 0 }
    }

    fn single_column(&self) -> Result<PgValueDeserializer, DeError> {
        match self.row.values.as_slice() {
            [value] => Ok(PgValueDeserializer::new(value.clone())),
            values => Err(DeError::custom(format!(
                "expected a single column, got {} ({:?})",
                values.len(),
                self.row.columns
            ))),
        }
    }

    fn visit_columns<'de, V>(self, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        let num_cols = self.row.len();
        let mut access = PgRowSeqAccess {
            deserializer: self,
            num_cols,
        };
        let value = visitor.visit_seq(&mut access)?;

        if access.deserializer.index < num_cols {
            return Err(DeError::invalid_length(num_cols, &"fewer columns"));
        }
        Ok(value)
    }
}

macro_rules! forward_to_single_column {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                self.single_column()?.$method(visitor)
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for PgRowDeserializer<'a> {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.row.len() {
            0 => visitor.visit_unit(),
            1 => self.single_column()?.deserialize_any(visitor),
            _ => self.deserialize_map(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.row.values.as_slice() {
            [PgValue::Null] => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.row.len() {
            1 => self.single_column()?.deserialize_seq(visitor),
            _ => self.visit_columns(visitor),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // A lone record column can fill a tuple of its own arity.
        if self.row.len() == 1 && len != 1 {
            return self.single_column()?.deserialize_tuple(len, visitor);
        }
        self.visit_columns(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    /// We treat the row as a map (each column is a key/value pair)
    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(PgRowMapAccess {
            deserializer: self,
            num_cols: self.row.len(),
        })
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // A lone record column whose name is not a field fills the struct
        // itself.
        if let ([column], [PgValue::Record(_)]) =
            (self.row.columns.as_slice(), self.row.values.as_slice())
        {
            if !fields.iter().any(|field| *field == column.as_str()) {
                return self
                    .single_column()?
                    .deserialize_struct(name, fields, visitor);
            }
        }
        self.deserialize_map(visitor)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.row.len() {
            0 => visitor.visit_unit(),
            _ => self.single_column()?.deserialize_unit(visitor),
        }
    }

    forward_to_single_column! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_identifier
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.single_column()?
            .deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Deserializes one decoded value; arrays and records become sequences.
pub struct PgValueDeserializer {
    value: PgValue,
}

impl PgValueDeserializer {
    pub fn new(value: PgValue) -> Self {
        PgValueDeserializer { value }
    }

    fn visit_items<'de, V>(items: Vec<PgValue>, visitor: V) -> Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        let len = items.len();
        let mut access = PgValueSeqAccess::new(items);
        let value = visitor.visit_seq(&mut access)?;

        if access.remaining() > 0 {
            return Err(DeError::invalid_length(len, &"fewer elements"));
        }
        Ok(value)
    }
}

impl<'de> Deserializer<'de> for PgValueDeserializer {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Null => visitor.visit_none(),
            PgValue::Bool(v) => visitor.visit_bool(v),
            PgValue::Int2(v) => visitor.visit_i16(v),
            PgValue::Int4(v) => visitor.visit_i32(v),
            PgValue::Int8(v) => visitor.visit_i64(v),
            PgValue::Float4(v) => visitor.visit_f32(v),
            PgValue::Float8(v) => visitor.visit_f64(v),
            // NUMERIC goes through f64, which keeps NaN and the infinities
            PgValue::Numeric(v) => visitor.visit_f64(v.to_f64()),
            PgValue::Text(v) => visitor.visit_string(v),
            PgValue::Bytea(v) => visitor.visit_byte_buf(v),
            PgValue::Json(v) => PgJson(v).into_deserializer().deserialize_any(visitor),
            PgValue::Uuid(v) => visitor.visit_string(v.to_string()),
            PgValue::Date(v) => visitor.visit_string(v.to_string()),
            PgValue::Time(v) => visitor.visit_string(v.to_string()),
            PgValue::Timestamp(v) => visitor.visit_string(v.to_string()),
            PgValue::Timestamptz(v) => visitor.visit_string(v.to_rfc3339()),
            PgValue::Array(items) | PgValue::Record(items) => Self::visit_items(items, visitor),
            PgValue::Unknown { data, .. } => visitor.visit_byte_buf(data),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Null => visitor.visit_none(),
            PgValue::Json(v) => PgJson(v).into_deserializer().deserialize_option(visitor),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            // Exact text, so `PgNumeric` and `String` targets lose nothing.
            PgValue::Numeric(v) => visitor.visit_string(v.to_string()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Null => visitor.visit_unit(),
            other => Err(DeError::invalid_type(
                Unexpected::Other(&other.to_string()),
                &"NULL",
            )),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Text(v) => {
                visitor.visit_enum(<String as IntoDeserializer<'de, DeError>>::into_deserializer(v))
            }
            PgValue::Json(v) => PgJson(v)
                .into_deserializer()
                .deserialize_enum(name, variants, visitor),
            other => Err(DeError::invalid_type(
                Unexpected::Other(&other.to_string()),
                &"an enum label",
            )),
        }
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Json(v) => PgJson(v).into_deserializer().deserialize_map(visitor),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            PgValue::Json(v) => PgJson(v)
                .into_deserializer()
                .deserialize_struct(name, fields, visitor),
            // Records have no field names, so structs read them positionally.
            _ => self.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char
        bytes byte_buf unit_struct seq tuple tuple_struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, DeError> for PgValue {
    type Deserializer = PgValueDeserializer;

    fn into_deserializer(self) -> Self::Deserializer {
        PgValueDeserializer::new(self)
    }
}

impl<'de> IntoDeserializer<'de, DeError> for PgNumeric {
    type Deserializer = PgValueDeserializer;

    fn into_deserializer(self) -> Self::Deserializer {
        PgValueDeserializer::new(PgValue::Numeric(self))
    }
}
