use std::{
	cell::RefCell,
	collections::{HashMap, HashSet},
	rc::Rc,
	str::FromStr,
};

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use tracing::{debug, trace};

use crate::{
	escape::{KeyEscaper, TYPE_KEY},
	node::{Marker, MarkerKind, Primitive, Record},
	value::{parse_date, valid_flags, ErrorValue, Object, Pattern, OBJECT_TYPE},
	DeserializeOptions, Error, Result, SerializedNode, Shared, Value,
};

/// Tree -> value transform.
///
/// A `Deserializer` lives for one call. It keeps a registry of every record
/// id seen so far. Each record's container is created and registered
/// *before* its fields are read, so a `Reference` met while the record is
/// still being populated resolves to the same container.
pub struct Deserializer<'o> {
	options: &'o DeserializeOptions,
	escaper: KeyEscaper<'o>,
	registry: HashMap<String, Value>,
	/// Ids referenced before their record was read. The placeholder registered
	/// for them is filled in if the record turns up later.
	pending: HashSet<String>,
	/// Nesting level of the node being read
	depth: usize,
}

impl<'o> Deserializer<'o> {
	pub fn new(options: &'o DeserializeOptions) -> Self {
		Self {
			options,
			escaper: KeyEscaper::new(&options.escape_prefix),
			registry: HashMap::new(),
			pending: HashSet::new(),
			depth: 0,
		}
	}

	/// Rebuild the value a tree represents.
	///
	/// Only fails on a corrupt `BigInt` payload. All other malformed input is
	/// recovered locally.
	///
	/// Containers nested `max_depth` levels deep or deeper aren't read. Each one
	/// comes back as the plain object a `MaxDepthExceeded` marker would.
	pub fn deserialize_node(&mut self, node: &SerializedNode) -> Result<Value> {
		if self.depth >= self.options.max_depth
			&& !matches!(node, SerializedNode::Primitive(_) | SerializedNode::Reference(_))
		{
			return Ok(self.depth_exceeded());
		}

		self.depth += 1;
		let value = self.read_node(node);
		self.depth -= 1;
		value
	}

	fn read_node(&mut self, node: &SerializedNode) -> Result<Value> {
		if let Some(tag) = node.type_tag() {
			if let Some(revive) = self.options.custom_revivers.get(tag) {
				trace!(tag, "using custom reviver");
				let value = revive(node);
				if let SerializedNode::Record(Record { id: Some(id), .. }) = node {
					self.registry.insert(id.clone(), value.clone());
				}
				return Ok(value);
			}
		}

		match node {
			SerializedNode::Primitive(primitive) => Ok(primitive_value(primitive)),
			SerializedNode::Sequence(items) => {
				let values = items
					.iter()
					.map(|item| self.deserialize_node(item))
					.collect::<Result<Vec<_>>>()?;
				Ok(Value::array(values))
			}
			SerializedNode::Reference(id) => Ok(self.resolve_reference(id)),
			SerializedNode::Record(record) => self.deserialize_record(record),
			SerializedNode::Marker(marker) => {
				if self.options.restore_special_types {
					self.restore_marker(marker)
				} else {
					self.raw_marker(marker)
				}
			}
		}
	}

	fn resolve_reference(&mut self, id: &str) -> Value {
		if let Some(value) = self.registry.get(id) {
			return value.clone();
		}

		// Target not read yet (or never will be). Stand in an empty object, and
		// register it so every reference to this id shares it.
		debug!(id, "unresolved reference, using placeholder");
		let placeholder = Value::empty_object();
		self.registry.insert(id.to_string(), placeholder.clone());
		self.pending.insert(id.to_string());
		placeholder
	}

	fn deserialize_record(&mut self, record: &Record) -> Result<Value> {
		let type_name = if self.options.is_allowed(&record.type_name) {
			record.type_name.as_str()
		} else {
			debug!(type_name = %record.type_name, "type not allowed, using plain object");
			OBJECT_TYPE
		};

		// Allocate and register first, populate after
		let object = self.allocate_object(record.id.as_deref(), type_name);

		for (key, field) in &record.fields {
			let key = self.escaper.unescape(key);
			let value = self.deserialize_node(field)?;
			object.borrow_mut().insert(key, value);
		}

		Ok(Value::Object(object))
	}

	fn allocate_object(&mut self, id: Option<&str>, type_name: &str) -> Shared<Object> {
		let Some(id) = id else {
			return Rc::new(RefCell::new(Object::new(type_name)));
		};

		if self.pending.remove(id) {
			if let Some(Value::Object(placeholder)) = self.registry.get(id) {
				trace!(id, "filling placeholder for forward reference");
				placeholder.borrow_mut().set_type_name(type_name);
				return placeholder.clone();
			}
		} else if self.registry.contains_key(id) {
			debug!(id, "duplicate record id, later record wins");
		}

		let object = Rc::new(RefCell::new(Object::new(type_name)));
		self
			.registry
			.insert(id.to_string(), Value::Object(object.clone()));
		object
	}

	fn restore_marker(&mut self, marker: &Marker) -> Result<Value> {
		let value = match marker.kind {
			MarkerKind::BigInt => return restore_bigint(marker),
			MarkerKind::Date => restore_date(marker),
			MarkerKind::RegExp => restore_pattern(marker),
			MarkerKind::Error => restore_error(marker),
			// Never reconstructed into anything callable
			MarkerKind::Function => Some(Value::Null),
			MarkerKind::Map => return self.restore_map(marker),
			MarkerKind::Set => return self.restore_set(marker),
			MarkerKind::MaxDepthExceeded => return self.raw_marker(marker),
		};

		Ok(value.unwrap_or_else(|| {
			debug!(kind = %marker.kind, "malformed marker");
			Value::Undefined
		}))
	}

	fn restore_map(&mut self, marker: &Marker) -> Result<Value> {
		let Some(pairs) = marker.get("entries").and_then(SerializedNode::as_sequence) else {
			debug!(kind = %marker.kind, "malformed marker");
			return Ok(Value::Undefined);
		};

		let mut entries = Vec::with_capacity(pairs.len());
		for pair in pairs {
			match pair.as_sequence() {
				Some([key, value]) => {
					let key = self.deserialize_node(key)?;
					let value = self.deserialize_node(value)?;
					entries.push((key, value));
				}
				_ => debug!("skipping malformed map entry"),
			}
		}
		Ok(Value::map(entries))
	}

	fn restore_set(&mut self, marker: &Marker) -> Result<Value> {
		let Some(members) = marker.get("values").and_then(SerializedNode::as_sequence) else {
			debug!(kind = %marker.kind, "malformed marker");
			return Ok(Value::Undefined);
		};

		let values = members
			.iter()
			.map(|member| self.deserialize_node(member))
			.collect::<Result<Vec<_>>>()?;
		Ok(Value::set(values))
	}

	fn depth_exceeded(&self) -> Value {
		let max_depth = self.options.max_depth;
		debug!(depth = self.depth, max_depth, "tree nested too deeply, truncating");
		let mut object = Object::plain();
		object.insert(TYPE_KEY, Value::string(MarkerKind::MaxDepthExceeded.tag()));
		object.insert(
			"message",
			Value::string(format!("Maximum depth of {} exceeded", max_depth)),
		);
		Value::from(object)
	}

	/// Marker as a plain object holding its type tag and payload fields.
	fn raw_marker(&mut self, marker: &Marker) -> Result<Value> {
		let mut object = Object::plain();
		object.insert(TYPE_KEY, Value::string(marker.kind.tag()));
		for (key, field) in &marker.payload {
			object.insert(key.as_str(), self.deserialize_node(field)?);
		}
		Ok(Value::from(object))
	}
}

fn primitive_value(primitive: &Primitive) -> Value {
	match primitive {
		Primitive::Undefined => Value::Undefined,
		Primitive::Null => Value::Null,
		Primitive::Bool(b) => Value::Bool(*b),
		Primitive::Number(n) => Value::Number(*n),
		Primitive::String(s) => Value::String(s.clone()),
	}
}

/// A `BigInt` marker with no payload is malformed, and recovered like any other
/// malformed marker. But a payload which is present and not an integer can't
/// be defaulted safely, so is an error.
fn restore_bigint(marker: &Marker) -> Result<Value> {
	match marker.get("value") {
		None => {
			debug!(kind = %marker.kind, "malformed marker");
			Ok(Value::Undefined)
		}
		Some(SerializedNode::Primitive(Primitive::String(s))) => BigInt::from_str(s.trim())
			.map(Value::BigInt)
			.map_err(|_| Error::InvalidBigInt { payload: s.clone() }),
		// Integral floats convert exactly, at any magnitude
		Some(SerializedNode::Primitive(Primitive::Number(n))) if n.fract() == 0.0 => {
			BigInt::from_f64(*n)
				.map(Value::BigInt)
				.ok_or_else(|| Error::InvalidBigInt { payload: n.to_string() })
		}
		Some(other) => Err(Error::InvalidBigInt {
			payload: format!("{:?}", other),
		}),
	}
}

fn restore_date(marker: &Marker) -> Option<Value> {
	let iso = marker.get_str("value")?;
	let instant = parse_date(iso);
	if instant.is_none() {
		debug!(iso, "invalid date");
	}
	instant.map(Value::Date)
}

fn restore_pattern(marker: &Marker) -> Option<Value> {
	let source = marker.get_str("source")?;
	let flags = marker.get_str("flags").unwrap_or("");
	if !valid_flags(flags) {
		debug!(flags, "invalid pattern flags");
		return None;
	}
	Some(Value::Pattern(Pattern {
		source: source.to_string(),
		flags: flags.to_string(),
	}))
}

fn restore_error(marker: &Marker) -> Option<Value> {
	let name = marker.get_str("name").unwrap_or("Error");
	let message = marker.get_str("message").unwrap_or("");
	let stack = marker.get_str("stack").map(str::to_string);
	Some(Value::Error(ErrorValue {
		name: name.to_string(),
		message: message.to_string(),
		stack,
	}))
}
