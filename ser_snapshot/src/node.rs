use std::fmt;

use indexmap::IndexMap;

/// Ordered, string-keyed fields of a record or marker payload.
pub type Fields = IndexMap<String, SerializedNode>;

/// Output of serialization. A tree, never a graph - repeated and cyclic
/// occurrences of the same object are expressed with `Reference`s.
#[derive(Clone, Debug, PartialEq)]
pub enum SerializedNode {
	/// Trivially round-trippable scalar.
	Primitive(Primitive),
	/// Tagged payload for a non-JSON-native type.
	Marker(Marker),
	/// Back-pointer to a `Record` emitted earlier in the same tree.
	Reference(String),
	/// A plain or class-tagged object.
	Record(Record),
	/// An array.
	Sequence(Vec<SerializedNode>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
}

/// Kinds of marker the engine emits and understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
	BigInt,
	Date,
	RegExp,
	Map,
	Set,
	Error,
	Function,
	MaxDepthExceeded,
}

impl MarkerKind {
	pub const ALL: [MarkerKind; 8] = [
		MarkerKind::BigInt,
		MarkerKind::Date,
		MarkerKind::RegExp,
		MarkerKind::Map,
		MarkerKind::Set,
		MarkerKind::Error,
		MarkerKind::Function,
		MarkerKind::MaxDepthExceeded,
	];

	/// Tag written into the type field of the marker.
	pub const fn tag(self) -> &'static str {
		match self {
			MarkerKind::BigInt => "BigInt",
			MarkerKind::Date => "Date",
			MarkerKind::RegExp => "RegExp",
			MarkerKind::Map => "Map",
			MarkerKind::Set => "Set",
			MarkerKind::Error => "Error",
			MarkerKind::Function => "Function",
			MarkerKind::MaxDepthExceeded => "MaxDepthExceeded",
		}
	}

	pub fn from_tag(tag: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.tag() == tag)
	}
}

impl fmt::Display for MarkerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// A marker: kind plus payload fields.
///
/// Payload is kept loosely typed so a malformed payload received from outside
/// (e.g. a `Date` marker with no `value`) can still be represented, and is
/// dealt with by the deserializer.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
	pub kind: MarkerKind,
	pub payload: Fields,
}

impl Marker {
	pub fn new(kind: MarkerKind) -> Self {
		Self {
			kind,
			payload: Fields::new(),
		}
	}

	/// Add a payload field.
	pub fn with(mut self, key: &str, node: SerializedNode) -> Self {
		self.payload.insert(key.to_string(), node);
		self
	}

	#[inline]
	pub fn get(&self, key: &str) -> Option<&SerializedNode> {
		self.payload.get(key)
	}

	/// Get a payload field which is a string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(SerializedNode::as_str)
	}
}

/// A serialized object.
///
/// Records produced by the serializer always have an `id`. Records built by
/// custom transformers, or parsed from hand-written JSON, may not.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
	pub id: Option<String>,
	pub type_name: String,
	pub fields: Fields,
}

impl Record {
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			id: None,
			type_name: type_name.into(),
			fields: Fields::new(),
		}
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_field(mut self, key: impl Into<String>, node: SerializedNode) -> Self {
		self.fields.insert(key.into(), node);
		self
	}
}

impl SerializedNode {
	pub const fn null() -> Self {
		SerializedNode::Primitive(Primitive::Null)
	}

	pub const fn undefined() -> Self {
		SerializedNode::Primitive(Primitive::Undefined)
	}

	pub fn string(s: impl Into<String>) -> Self {
		SerializedNode::Primitive(Primitive::String(s.into()))
	}

	pub const fn number(n: f64) -> Self {
		SerializedNode::Primitive(Primitive::Number(n))
	}

	pub const fn bool(b: bool) -> Self {
		SerializedNode::Primitive(Primitive::Bool(b))
	}

	/// Marker replacing a subtree nested too deeply.
	pub fn max_depth_exceeded(max_depth: usize) -> Self {
		SerializedNode::Marker(Marker::new(MarkerKind::MaxDepthExceeded).with(
			"message",
			SerializedNode::string(format!("Maximum depth of {} exceeded", max_depth)),
		))
	}

	/// Error marker standing in for a value which could not be read.
	pub fn access_error(message: impl Into<String>) -> Self {
		SerializedNode::Marker(
			Marker::new(MarkerKind::Error)
				.with("name", SerializedNode::string("SerializationError"))
				.with("message", SerializedNode::string(message)),
		)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			SerializedNode::Primitive(Primitive::String(s)) => Some(s),
			_ => None,
		}
	}

	pub fn as_marker(&self) -> Option<&Marker> {
		match self {
			SerializedNode::Marker(marker) => Some(marker),
			_ => None,
		}
	}

	pub fn as_record(&self) -> Option<&Record> {
		match self {
			SerializedNode::Record(record) => Some(record),
			_ => None,
		}
	}

	pub fn as_sequence(&self) -> Option<&[SerializedNode]> {
		match self {
			SerializedNode::Sequence(items) => Some(items),
			_ => None,
		}
	}

	/// Type tag of this node, if it has one: marker kind or record type name.
	pub fn type_tag(&self) -> Option<&str> {
		match self {
			SerializedNode::Marker(marker) => Some(marker.kind.tag()),
			SerializedNode::Record(record) => Some(&record.type_name),
			_ => None,
		}
	}

	/// Visit this node and every node below it, depth first.
	pub fn walk<'a, F: FnMut(&'a SerializedNode)>(&'a self, visit: &mut F) {
		visit(self);
		match self {
			SerializedNode::Primitive(_) | SerializedNode::Reference(_) => {}
			SerializedNode::Marker(marker) => {
				for node in marker.payload.values() {
					node.walk(visit);
				}
			}
			SerializedNode::Record(record) => {
				for node in record.fields.values() {
					node.walk(visit);
				}
			}
			SerializedNode::Sequence(items) => {
				for node in items {
					node.walk(visit);
				}
			}
		}
	}
}

impl From<Marker> for SerializedNode {
	fn from(marker: Marker) -> Self {
		SerializedNode::Marker(marker)
	}
}

impl From<Record> for SerializedNode {
	fn from(record: Record) -> Self {
		SerializedNode::Record(record)
	}
}
