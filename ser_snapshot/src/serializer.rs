use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
	escape::KeyEscaper,
	node::{Fields, Marker, MarkerKind, Primitive, Record},
	value::{format_date, ARRAY_TYPE, OBJECT_TYPE},
	SerializeOptions, SerializedNode, Value,
};

/// Depth-first value -> tree transform.
///
/// A `Serializer` lives for one call. It records every object it enters,
/// keyed by the object's address, so a second encounter of the same object
/// (whether a cycle or just a shared reference) becomes a
/// `SerializedNode::Reference` instead of being serialized again.
///
/// Addresses are only compared while the input value is borrowed, so they
/// can't be reused by another allocation during the call.
pub struct Serializer<'o> {
	options: &'o SerializeOptions,
	escaper: KeyEscaper<'o>,
	/// Object address -> assigned id
	visited: HashMap<usize, String>,
	next_id: u64,
}

impl<'o> Serializer<'o> {
	pub fn new(options: &'o SerializeOptions) -> Self {
		Self {
			options,
			escaper: KeyEscaper::new(&options.escape_prefix),
			visited: HashMap::new(),
			next_id: 0,
		}
	}

	/// Serialize a value and everything reachable from it.
	///
	/// The entry point for serializing, which user will call.
	pub fn serialize_value(&mut self, value: &Value) -> SerializedNode {
		self.serialize_at(value, 0)
	}

	/// Number of objects assigned an id so far.
	pub fn records_emitted(&self) -> usize {
		self.visited.len()
	}

	fn serialize_at(&mut self, value: &Value, depth: usize) -> SerializedNode {
		// Custom transformers take priority over everything, built-ins included
		if !self.options.custom_transformers.is_empty() {
			let type_name = value.type_name();
			if let Some(transform) = self.options.custom_transformers.get(&type_name) {
				return match transform(value) {
					Ok(node) => node,
					Err(message) => {
						debug!(%type_name, %message, "custom transformer failed");
						SerializedNode::access_error(message)
					}
				};
			}
		}

		match value {
			Value::Undefined => SerializedNode::Primitive(Primitive::Undefined),
			Value::Null => SerializedNode::Primitive(Primitive::Null),
			Value::Bool(b) => SerializedNode::Primitive(Primitive::Bool(*b)),
			Value::Number(n) => SerializedNode::Primitive(Primitive::Number(*n)),
			Value::String(s) => SerializedNode::Primitive(Primitive::String(s.clone())),
			Value::BigInt(n) => {
				Marker::new(MarkerKind::BigInt)
					.with("value", SerializedNode::string(n.to_string()))
					.into()
			}
			Value::Date(instant) => {
				Marker::new(MarkerKind::Date)
					.with("value", SerializedNode::string(format_date(instant)))
					.into()
			}
			// Would be rejected on the way back in
			Value::Pattern(pattern) if !pattern.has_valid_flags() => {
				debug!(flags = %pattern.flags, "invalid pattern flags");
				SerializedNode::access_error(format!("Invalid pattern flags: {:?}", pattern.flags))
			}
			Value::Pattern(pattern) => {
				Marker::new(MarkerKind::RegExp)
					.with("source", SerializedNode::string(&pattern.source))
					.with("flags", SerializedNode::string(&pattern.flags))
					.into()
			}
			Value::Error(err) => {
				let mut marker = Marker::new(MarkerKind::Error)
					.with("name", SerializedNode::string(&err.name))
					.with("message", SerializedNode::string(&err.message));
				if let Some(stack) = &err.stack {
					marker = marker.with("stack", SerializedNode::string(stack));
				}
				marker.into()
			}
			// Functions are described, never executed
			Value::Function(func) => {
				Marker::new(MarkerKind::Function)
					.with("name", SerializedNode::string(&func.name))
					.with("source", SerializedNode::string(&func.source))
					.into()
			}
			Value::Object(_) => self.serialize_object(value, depth),
			Value::Array(_) | Value::Map(_) | Value::Set(_) => {
				if depth >= self.options.max_depth {
					return self.depth_exceeded(depth);
				}
				self.serialize_collection(value, depth)
			}
		}
	}

	fn serialize_object(&mut self, value: &Value, depth: usize) -> SerializedNode {
		let Value::Object(object) = value else {
			unreachable!();
		};

		// Already entered (cycle) or already emitted (shared reference)
		let addr = value.container_addr().unwrap_or_default();
		if let Some(id) = self.visited.get(&addr) {
			trace!(%id, "emitting reference");
			return SerializedNode::Reference(id.clone());
		}

		if depth >= self.options.max_depth {
			return self.depth_exceeded(depth);
		}

		let object = match object.try_borrow() {
			Ok(object) => object,
			Err(err) => {
				debug!(depth, "object unreadable: {}", err);
				return SerializedNode::access_error(format!("Could not read object: {}", err));
			}
		};

		// Register before descending so cycles back to this object resolve
		let id = self.next_id.to_string();
		self.next_id += 1;
		self.visited.insert(addr, id.clone());

		let type_name = if self.options.preserve_type {
			object.type_name().to_string()
		} else {
			OBJECT_TYPE.to_string()
		};

		let mut fields = Fields::with_capacity(object.len());
		for (key, field_value) in object.iter() {
			if self.options.is_skipped(key) {
				continue;
			}
			// Escape before metadata is added, so user keys can never be mistaken
			// for engine-owned ones
			let key = self.escaper.escape(key).into_owned();
			let node = self.serialize_at(field_value, depth + 1);
			fields.insert(key, node);
		}

		SerializedNode::Record(Record {
			id: Some(id),
			type_name,
			fields,
		})
	}

	fn serialize_collection(&mut self, value: &Value, depth: usize) -> SerializedNode {
		match value {
			Value::Array(items) => {
				let items = match items.try_borrow() {
					Ok(items) => items,
					Err(err) => return self.unreadable(ARRAY_TYPE, err),
				};
				let nodes = items
					.iter()
					.map(|item| self.serialize_at(item, depth + 1))
					.collect();
				SerializedNode::Sequence(nodes)
			}
			Value::Map(entries) => {
				let entries = match entries.try_borrow() {
					Ok(entries) => entries,
					Err(err) => return self.unreadable("Map", err),
				};
				let mut pairs = Vec::with_capacity(entries.len());
				for (key, entry_value) in entries.iter() {
					if let Value::String(key) = key {
						if self.options.is_skipped(key) {
							continue;
						}
					}
					let key_node = self.serialize_at(key, depth + 1);
					let value_node = self.serialize_at(entry_value, depth + 1);
					pairs.push(SerializedNode::Sequence(vec![key_node, value_node]));
				}
				Marker::new(MarkerKind::Map)
					.with("entries", SerializedNode::Sequence(pairs))
					.into()
			}
			Value::Set(values) => {
				let values = match values.try_borrow() {
					Ok(values) => values,
					Err(err) => return self.unreadable("Set", err),
				};
				let nodes = values
					.iter()
					.map(|member| self.serialize_at(member, depth + 1))
					.collect();
				Marker::new(MarkerKind::Set)
					.with("values", SerializedNode::Sequence(nodes))
					.into()
			}
			_ => unreachable!(),
		}
	}

	fn depth_exceeded(&self, depth: usize) -> SerializedNode {
		debug!(depth, max_depth = self.options.max_depth, "truncating subtree");
		SerializedNode::max_depth_exceeded(self.options.max_depth)
	}

	fn unreadable(&self, kind: &str, err: std::cell::BorrowError) -> SerializedNode {
		debug!(kind, "container unreadable: {}", err);
		SerializedNode::access_error(format!("Could not read {}: {}", kind, err))
	}
}
