//! Dynamically typed script values.
//!
//! # Responsibility
//! - Define the value shapes that cross extension boundaries.
//! - Provide the ordered table used for argument lists and nested data.
//!
//! # Invariants
//! - `ScriptTable` preserves insertion order of its keys.
//! - A table built by `from_sequence` has contiguous integer keys starting at
//!   the requested base.

use crate::model::handle::HandleRef;
use indexmap::IndexMap;

/// Key of one script table slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    Integer(i64),
    String(String),
}

impl From<i64> for TableKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for TableKey {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// One dynamically typed value as seen by extension code.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Table(ScriptTable),
    /// Shared callback handle, passed by identity only.
    FuncRef(HandleRef),
}

impl ScriptValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ScriptTable> for ScriptValue {
    fn from(value: ScriptTable) -> Self {
        Self::Table(value)
    }
}

impl From<HandleRef> for ScriptValue {
    fn from(value: HandleRef) -> Self {
        Self::FuncRef(value)
    }
}

/// Insertion-ordered script table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptTable {
    entries: IndexMap<TableKey, ScriptValue>,
}

impl ScriptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table keyed `base, base + 1, ...` from an ordered sequence.
    ///
    /// `Nil` elements keep their slot so argument positions survive encoding.
    pub fn from_sequence(values: &[ScriptValue], base: i64) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .map(|(offset, value)| (TableKey::Integer(base + offset as i64), value.clone()))
            .collect();
        Self { entries }
    }

    /// Sets one slot. Assigning `Nil` removes the slot, like script tables do.
    pub fn set(&mut self, key: impl Into<TableKey>, value: impl Into<ScriptValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_nil() {
            self.entries.shift_remove(&key);
        } else {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: &TableKey) -> Option<&ScriptValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableKey, &ScriptValue)> {
        self.entries.iter()
    }

    /// Returns `Some(n)` when keys are exactly `1..=n` in any order.
    ///
    /// Empty tables report `Some(0)`.
    pub fn sequence_len(&self) -> Option<usize> {
        let len = self.entries.len();
        let contiguous =
            (1..=len as i64).all(|index| self.entries.contains_key(&TableKey::Integer(index)));
        contiguous.then_some(len)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScriptTable, ScriptValue, TableKey};

    #[test]
    fn from_sequence_uses_requested_base() {
        let values = vec![ScriptValue::from("a"), ScriptValue::from(2_i64)];
        let one_based = ScriptTable::from_sequence(&values, 1);
        assert_eq!(one_based.get(&TableKey::Integer(1)), Some(&values[0]));
        assert_eq!(one_based.get(&TableKey::Integer(2)), Some(&values[1]));
        assert_eq!(one_based.sequence_len(), Some(2));

        let zero_based = ScriptTable::from_sequence(&values, 0);
        assert_eq!(zero_based.get(&TableKey::Integer(0)), Some(&values[0]));
        assert_eq!(zero_based.sequence_len(), None);
    }

    #[test]
    fn from_sequence_keeps_nil_positions() {
        let values = vec![ScriptValue::from(1_i64), ScriptValue::Nil, ScriptValue::from(3_i64)];
        let table = ScriptTable::from_sequence(&values, 1);
        assert_eq!(table.sequence_len(), Some(3));
        assert_eq!(table.get(&TableKey::Integer(2)), Some(&ScriptValue::Nil));
    }

    #[test]
    fn assigning_nil_removes_slot() {
        let mut table = ScriptTable::new();
        table.set("name", "value");
        assert_eq!(table.len(), 1);
        table.set("name", ScriptValue::Nil);
        assert!(table.is_empty());
    }

    #[test]
    fn string_keys_break_sequence_shape() {
        let mut table = ScriptTable::from_sequence(&[ScriptValue::Boolean(true)], 1);
        table.set("extra", 1_i64);
        assert_eq!(table.sequence_len(), None);
    }
}
