//! proptest strategies shared by the unit tests.

use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_leaf() -> impl Strategy<Value = Value> {
  prop_oneof![
    Just(Value::Null),
    any::<bool>().prop_map(Value::Bool),
    any::<i32>().prop_map(|n| json!(n)),
    "[a-z]{0,4}".prop_map(Value::String),
  ]
}

fn arb_object(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
  prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(|m| Value::Object(m.into_iter().collect()))
}

/// Arbitrary documents with nested arrays and maps.
pub(crate) fn arb_json() -> impl Strategy<Value = Value> {
  arb_leaf().prop_recursive(3, 24, 4, |inner| {
    prop_oneof![
      prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
      arb_object(inner),
    ]
  })
}

/// Documents built from maps and scalars only.
pub(crate) fn arb_array_free_json() -> impl Strategy<Value = Value> {
  arb_leaf().prop_recursive(4, 32, 4, arb_object)
}
