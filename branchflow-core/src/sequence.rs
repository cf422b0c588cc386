use anyhow::{bail, Result};
use serde_json::Value;

/// A value that map and item-branch stages can split into items and rebuild.
pub trait Sequence: Sized {
    type Item;

    /// Split into items, failing if this value is not a sequence.
    fn into_items(self) -> Result<Vec<Self::Item>>;

    fn from_items(items: Vec<Self::Item>) -> Self;
}

impl<I> Sequence for Vec<I> {
    type Item = I;

    fn into_items(self) -> Result<Vec<I>> {
        Ok(self)
    }

    fn from_items(items: Vec<I>) -> Self {
        items
    }
}

impl Sequence for Value {
    type Item = Value;

    fn into_items(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => bail!("expected a sequence, got {}", json_kind(&other)),
        }
    }

    fn from_items(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
