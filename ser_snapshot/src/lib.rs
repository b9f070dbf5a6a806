//! Snapshot serializer.
//!
//! Converts graphs of [`Value`]s (which may contain shared references and
//! cycles) into a self-describing, JSON-safe [`SerializedNode`] tree, and back.
//!
//! ```
//! use ser_snapshot::{deserialize, object, serialize, DeserializeOptions, SerializeOptions};
//!
//! let user = object!("User"; "name" => "Ann");
//! user.insert("self", user.clone());
//!
//! let tree = serialize(&user, &SerializeOptions::default());
//! let json = tree.to_json_string();
//!
//! let restored = deserialize(
//! 	&ser_snapshot::SerializedNode::from_json_str(&json).unwrap(),
//! 	&DeserializeOptions::default().allow_constructor("User"),
//! )
//! .unwrap();
//! assert_eq!(restored.type_name(), "User");
//! assert!(restored.get("self").unwrap().ptr_eq(&restored));
//! ```

#[cfg(feature = "derive")]
pub use ser_snapshot_derive::ToValue;

mod deserializer;
pub use deserializer::Deserializer;

mod equality;
pub use equality::{nodes_equal, snapshots_equal};

mod error;
pub use error::{Error, Result};

pub mod escape;

mod impls;
mod json;
mod macros;

mod node;
pub use node::{Fields, Marker, MarkerKind, Primitive, Record, SerializedNode};

mod options;
pub use options::{
	DeserializeConfig, DeserializeOptions, Reviver, SerializeConfig, SerializeOptions, Transformer,
	DEFAULT_MAX_DEPTH, DEFAULT_TREE_DEPTH,
};

mod probe;
pub use probe::is_serializable;

mod serializer;
pub use serializer::Serializer;

mod to_value;
pub use to_value::{ToValue, ToValueWith};

mod value;
pub use value::{
	ErrorValue, FunctionValue, Object, Pattern, Shared, Value, ARRAY_TYPE, OBJECT_TYPE,
	PATTERN_FLAGS,
};

/// Serialize a value into a tree.
pub fn serialize(value: &Value, options: &SerializeOptions) -> SerializedNode {
	Serializer::new(options).serialize_value(value)
}

/// Rebuild a value from a tree.
///
/// Fails only if a `BigInt` payload is not a valid integer.
pub fn deserialize(node: &SerializedNode, options: &DeserializeOptions) -> Result<Value> {
	Deserializer::new(options).deserialize_node(node)
}

/// Serialize and then deserialize.
pub fn round_trip(
	value: &Value,
	serialize_options: &SerializeOptions,
	deserialize_options: &DeserializeOptions,
) -> Result<Value> {
	deserialize(&serialize(value, serialize_options), deserialize_options)
}

/// Create a serialization function with fixed options.
pub fn create_serializer(options: SerializeOptions) -> impl Fn(&Value) -> SerializedNode {
	move |value| serialize(value, &options)
}

/// Create a deserialization function with fixed options.
pub fn create_deserializer(
	options: DeserializeOptions,
) -> impl Fn(&SerializedNode) -> Result<Value> {
	move |node| deserialize(node, &options)
}
