use std::collections::HashSet;

use tracing::trace;

use crate::{SerializeOptions, Value};

/// Dry run of serialization. Reports whether `value` would round-trip without
/// loss under `options`.
///
/// `false` if any part of the value is a function or a pattern with invalid
/// flags, is nested at or beyond `max_depth`, or can't be read. Skipped keys aren't inspected, and a value
/// with a custom transformer is trusted to that transformer.
pub fn is_serializable(value: &Value, options: &SerializeOptions) -> bool {
	let mut probe = Probe {
		options,
		seen: HashSet::new(),
	};
	probe.check(value, 0)
}

struct Probe<'o> {
	options: &'o SerializeOptions,
	/// Objects already checked, or being checked. Meeting one again becomes a
	/// reference. Arrays, maps and sets aren't tracked, so a cycle through only
	/// those runs into `max_depth`, as it does when serializing.
	seen: HashSet<usize>,
}

impl<'o> Probe<'o> {
	fn check(&mut self, value: &Value, depth: usize) -> bool {
		if !self.options.custom_transformers.is_empty()
			&& self.options.custom_transformers.contains_key(&value.type_name())
		{
			return true;
		}

		let Some(addr) = value.container_addr() else {
			return match value {
				Value::Function(_) => false,
				Value::Pattern(pattern) => pattern.has_valid_flags(),
				_ => true,
			};
		};

		if matches!(value, Value::Object(_)) && !self.seen.insert(addr) {
			return true;
		}

		if depth >= self.options.max_depth {
			trace!(depth, "nested too deeply to serialize");
			return false;
		}

		match value {
			Value::Array(items) | Value::Set(items) => match items.try_borrow() {
				Ok(items) => items.iter().all(|item| self.check(item, depth + 1)),
				Err(_) => false,
			},
			Value::Map(entries) => match entries.try_borrow() {
				Ok(entries) => entries.iter().all(|(key, entry_value)| {
					if let Value::String(key) = key {
						if self.options.is_skipped(key) {
							return true;
						}
					}
					self.check(key, depth + 1) && self.check(entry_value, depth + 1)
				}),
				Err(_) => false,
			},
			Value::Object(object) => match object.try_borrow() {
				Ok(object) => {
					let options = self.options;
					object
						.iter()
						.filter(|(key, _)| !options.is_skipped(key))
						.all(|(_, field)| self.check(field, depth + 1))
				}
				Err(_) => false,
			},
			_ => true,
		}
	}
}
