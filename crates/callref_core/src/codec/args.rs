//! Argument codec and MessagePack packer.

use crate::model::value::{ScriptTable, ScriptValue, TableKey};
use log::error;
use rmpv::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Encoded form of an absent or empty argument list (MessagePack nil).
pub const NIL_SENTINEL: &[u8] = &[0xC0];

/// Codec failures. These indicate host misconfiguration, not bad input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    Pack(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pack(message) => write!(f, "argument packing failed: {message}"),
        }
    }
}

impl Error for CodecError {}

/// Opaque, order-preserving encoded argument buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArgs(Vec<u8>);

impl EncodedArgs {
    pub fn nil() -> Self {
        Self(NIL_SENTINEL.to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == NIL_SENTINEL
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Binary packing routine the codec hands its intermediate table to.
pub trait Packer: Send + Sync {
    fn pack(&self, table: &ScriptTable) -> Result<Vec<u8>, CodecError>;
}

/// MessagePack packer following script-table conventions.
///
/// Tables keyed exactly `1..=n` pack as arrays; every other table packs as a
/// map in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackPacker;

impl Packer for MsgPackPacker {
    fn pack(&self, table: &ScriptTable) -> Result<Vec<u8>, CodecError> {
        let value = table_to_msgpack(table);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &value)
            .map_err(|err| CodecError::Pack(err.to_string()))?;
        Ok(buf)
    }
}

fn table_to_msgpack(table: &ScriptTable) -> Value {
    if let Some(len) = table.sequence_len() {
        let items = (1..=len as i64)
            .map(|index| {
                table
                    .get(&TableKey::Integer(index))
                    .map(value_to_msgpack)
                    .unwrap_or(Value::Nil)
            })
            .collect();
        return Value::Array(items);
    }

    Value::Map(
        table
            .iter()
            .map(|(key, value)| (key_to_msgpack(key), value_to_msgpack(value)))
            .collect(),
    )
}

fn key_to_msgpack(key: &TableKey) -> Value {
    match key {
        TableKey::Integer(index) => Value::from(*index),
        TableKey::String(name) => Value::from(name.as_str()),
    }
}

fn value_to_msgpack(value: &ScriptValue) -> Value {
    match value {
        ScriptValue::Nil => Value::Nil,
        ScriptValue::Boolean(flag) => Value::Boolean(*flag),
        ScriptValue::Integer(number) => Value::from(*number),
        ScriptValue::Number(number) => Value::F64(*number),
        ScriptValue::String(text) => Value::from(text.as_str()),
        ScriptValue::Table(table) => table_to_msgpack(table),
        ScriptValue::FuncRef(handle) => Value::Map(vec![
            (
                Value::from("__reference"),
                Value::from(i64::from(handle.reference_id)),
            ),
            (
                Value::from("__instance"),
                Value::from(u64::from(handle.instance_id)),
            ),
            (
                Value::from("__resource"),
                Value::from(handle.owner_name.as_str()),
            ),
        ]),
    }
}

/// Encodes argument lists and function results into portable buffers.
#[derive(Clone)]
pub struct ArgumentCodec {
    packer: Arc<dyn Packer>,
}

impl Default for ArgumentCodec {
    fn default() -> Self {
        Self::new(Arc::new(MsgPackPacker))
    }
}

impl ArgumentCodec {
    pub fn new(packer: Arc<dyn Packer>) -> Self {
        Self { packer }
    }

    /// Encodes an explicit argument list through a 1-indexed table.
    ///
    /// # Errors
    /// - Returns `CodecError` when the packer fails; callers treat this as
    ///   fatal host misconfiguration.
    pub fn encode(&self, values: Option<&[ScriptValue]>) -> Result<EncodedArgs, CodecError> {
        self.encode_with_base(values, 1)
    }

    /// Encodes a raw multi-value function result through a 0-indexed table.
    pub fn encode_results(
        &self,
        values: Option<&[ScriptValue]>,
    ) -> Result<EncodedArgs, CodecError> {
        self.encode_with_base(values, 0)
    }

    fn encode_with_base(
        &self,
        values: Option<&[ScriptValue]>,
        base: i64,
    ) -> Result<EncodedArgs, CodecError> {
        let values = match values {
            Some(values) if !values.is_empty() => values,
            _ => return Ok(EncodedArgs::nil()),
        };

        let table = ScriptTable::from_sequence(values, base);
        self.packer.pack(&table).map(EncodedArgs).map_err(|err| {
            error!(
                "event=codec_pack module=codec status=error count={} error={}",
                values.len(),
                err
            );
            err
        })
    }
}
