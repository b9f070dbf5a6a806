//! JSON wire form of [`SerializedNode`].
//!
//! * Scalars map to JSON scalars. `undefined` and non-finite numbers, which
//!   JSON can't express, become `{"__type":"Undefined"}` and
//!   `{"__type":"Number","value":"NaN"}`.
//! * Markers become `{"__type": <kind>, ...payload}`.
//! * References become `{"__ref": <id>}`.
//! * Records become `{"__type": <type name>, "__id": <id>, ...fields}`.
//! * Sequences become arrays.
//!
//! Parsing is total: any JSON document maps to some tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as Json};

use crate::{
	escape::{ID_KEY, REF_KEY, TYPE_KEY},
	node::{Fields, Marker, MarkerKind, Primitive, Record},
	value::OBJECT_TYPE,
	Result, SerializedNode,
};

const UNDEFINED_TAG: &str = "Undefined";
const NUMBER_TAG: &str = "Number";

impl SerializedNode {
	/// Convert to a JSON value.
	pub fn to_json(&self) -> Json {
		match self {
			SerializedNode::Primitive(primitive) => primitive_to_json(primitive),
			SerializedNode::Marker(marker) => {
				let mut map = Map::with_capacity(marker.payload.len() + 1);
				map.insert(TYPE_KEY.to_string(), Json::from(marker.kind.tag()));
				for (key, node) in &marker.payload {
					map.insert(key.clone(), node.to_json());
				}
				Json::Object(map)
			}
			SerializedNode::Reference(id) => {
				let mut map = Map::with_capacity(1);
				map.insert(REF_KEY.to_string(), Json::from(id.as_str()));
				Json::Object(map)
			}
			SerializedNode::Record(record) => {
				let mut map = Map::with_capacity(record.fields.len() + 2);
				map.insert(TYPE_KEY.to_string(), Json::from(record.type_name.as_str()));
				if let Some(id) = &record.id {
					map.insert(ID_KEY.to_string(), Json::from(id.as_str()));
				}
				for (key, node) in &record.fields {
					map.insert(key.clone(), node.to_json());
				}
				Json::Object(map)
			}
			SerializedNode::Sequence(items) => {
				Json::Array(items.iter().map(SerializedNode::to_json).collect())
			}
		}
	}

	/// Parse from a JSON value.
	pub fn from_json(json: &Json) -> SerializedNode {
		match json {
			Json::Null => SerializedNode::null(),
			Json::Bool(b) => SerializedNode::bool(*b),
			Json::Number(n) => SerializedNode::number(n.as_f64().unwrap_or(f64::NAN)),
			Json::String(s) => SerializedNode::string(s.as_str()),
			Json::Array(items) => {
				SerializedNode::Sequence(items.iter().map(SerializedNode::from_json).collect())
			}
			Json::Object(map) => object_from_json(map),
		}
	}

	pub fn to_json_string(&self) -> String {
		self.to_json().to_string()
	}

	pub fn to_json_string_pretty(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(&self.to_json())?)
	}

	pub fn from_json_str(s: &str) -> Result<SerializedNode> {
		let json: Json = serde_json::from_str(s)?;
		Ok(SerializedNode::from_json(&json))
	}
}

fn primitive_to_json(primitive: &Primitive) -> Json {
	match primitive {
		Primitive::Null => Json::Null,
		Primitive::Bool(b) => Json::Bool(*b),
		Primitive::String(s) => Json::String(s.clone()),
		Primitive::Number(n) => match Number::from_f64(*n) {
			Some(n) => Json::Number(n),
			None => {
				let repr = if n.is_nan() {
					"NaN"
				} else if *n > 0.0 {
					"Infinity"
				} else {
					"-Infinity"
				};
				tagged(NUMBER_TAG, Some(repr))
			}
		},
		Primitive::Undefined => tagged(UNDEFINED_TAG, None),
	}
}

fn tagged(tag: &str, value: Option<&str>) -> Json {
	let mut map = Map::with_capacity(2);
	map.insert(TYPE_KEY.to_string(), Json::from(tag));
	if let Some(value) = value {
		map.insert("value".to_string(), Json::from(value));
	}
	Json::Object(map)
}

fn object_from_json(map: &Map<String, Json>) -> SerializedNode {
	if let Some(id) = map.get(REF_KEY).and_then(id_from_json) {
		return SerializedNode::Reference(id);
	}

	let type_tag = map.get(TYPE_KEY).and_then(Json::as_str);
	let id = map.get(ID_KEY).and_then(id_from_json);

	if id.is_none() {
		match type_tag {
			Some(UNDEFINED_TAG) => return SerializedNode::undefined(),
			Some(NUMBER_TAG) => {
				if let Some(n) = map.get("value").and_then(Json::as_str).and_then(special_number) {
					return SerializedNode::number(n);
				}
			}
			Some(tag) => {
				if let Some(kind) = MarkerKind::from_tag(tag) {
					return SerializedNode::Marker(Marker {
						kind,
						payload: fields_from_json(map),
					});
				}
			}
			None => {}
		}
	}

	SerializedNode::Record(Record {
		id,
		type_name: type_tag.unwrap_or(OBJECT_TYPE).to_string(),
		fields: fields_from_json(map),
	})
}

/// Ids are written as strings, but accept numbers from hand-written payloads.
fn id_from_json(json: &Json) -> Option<String> {
	match json {
		Json::String(s) => Some(s.clone()),
		Json::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn special_number(repr: &str) -> Option<f64> {
	match repr {
		"NaN" => Some(f64::NAN),
		"Infinity" => Some(f64::INFINITY),
		"-Infinity" => Some(f64::NEG_INFINITY),
		_ => None,
	}
}

fn fields_from_json(map: &Map<String, Json>) -> Fields {
	map
		.iter()
		.filter(|(key, _)| !matches!(key.as_str(), TYPE_KEY | ID_KEY | REF_KEY))
		.map(|(key, json)| (key.clone(), SerializedNode::from_json(json)))
		.collect()
}

impl Serialize for SerializedNode {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_json().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for SerializedNode {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let json = Json::deserialize(deserializer)?;
		Ok(SerializedNode::from_json(&json))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn record_wire_shape() {
		let node: SerializedNode = Record::new("User")
			.with_id("0")
			.with_field("name", SerializedNode::string("Ann"))
			.with_field("self", SerializedNode::Reference("0".to_string()))
			.into();
		assert_eq!(
			node.to_json(),
			json!({
				"__type": "User",
				"__id": "0",
				"name": "Ann",
				"self": { "__ref": "0" },
			})
		);
		assert_eq!(SerializedNode::from_json(&node.to_json()), node);
	}

	#[test]
	fn field_order_preserved() {
		let node = SerializedNode::from_json_str(r#"{"__id":"0","z":1,"a":2,"m":3}"#).unwrap();
		let record = node.as_record().unwrap();
		let keys: Vec<&str> = record.fields.keys().map(String::as_str).collect();
		assert_eq!(keys, ["z", "a", "m"]);
		assert_eq!(record.type_name, "Object");
	}

	#[test]
	fn marker_wire_shape() {
		let node: SerializedNode = Marker::new(MarkerKind::RegExp)
			.with("source", SerializedNode::string("test"))
			.with("flags", SerializedNode::string("gi"))
			.into();
		assert_eq!(
			node.to_json(),
			json!({ "__type": "RegExp", "source": "test", "flags": "gi" })
		);
		assert_eq!(SerializedNode::from_json(&node.to_json()), node);
	}

	#[test]
	fn non_json_scalars() {
		let node = SerializedNode::number(f64::NAN);
		let json = node.to_json();
		assert_eq!(json, json!({ "__type": "Number", "value": "NaN" }));
		let parsed = SerializedNode::from_json(&json);
		assert!(matches!(parsed, SerializedNode::Primitive(Primitive::Number(n)) if n.is_nan()));

		for n in [f64::INFINITY, f64::NEG_INFINITY, 1.5, -0.25] {
			let node = SerializedNode::number(n);
			assert_eq!(SerializedNode::from_json(&node.to_json()), node);
		}

		let node = SerializedNode::undefined();
		assert_eq!(node.to_json(), json!({ "__type": "Undefined" }));
		assert_eq!(SerializedNode::from_json(&node.to_json()), node);
	}

	#[test]
	fn unknown_type_tag_parses_as_record() {
		let node = SerializedNode::from_json(&json!({ "__type": "Malicious", "__id": "x" }));
		let record = node.as_record().unwrap();
		assert_eq!(record.type_name, "Malicious");
		assert_eq!(record.id.as_deref(), Some("x"));

		let node = SerializedNode::from_json(&json!({ "__type": "Money", "amount": 5 }));
		let record = node.as_record().unwrap();
		assert_eq!(record.type_name, "Money");
		assert_eq!(record.id, None);
	}

	#[test]
	fn numeric_ids_accepted() {
		let node = SerializedNode::from_json(&json!({ "__ref": 3 }));
		assert_eq!(node, SerializedNode::Reference("3".to_string()));
	}

	#[test]
	fn serde_round_trip() {
		let node = SerializedNode::Sequence(vec![
			SerializedNode::bool(true),
			SerializedNode::null(),
			SerializedNode::string("x"),
		]);
		let s = serde_json::to_string(&node).unwrap();
		assert_eq!(s, r#"[true,null,"x"]"#);
		let parsed: SerializedNode = serde_json::from_str(&s).unwrap();
		assert_eq!(parsed, node);
	}

	#[test]
	fn invalid_json_is_error() {
		assert!(SerializedNode::from_json_str("{").is_err());
	}
}
