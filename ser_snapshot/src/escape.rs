use std::borrow::Cow;

/// Key of the type tag field in the wire form.
pub const TYPE_KEY: &str = "__type";
/// Key of the record id field in the wire form.
pub const ID_KEY: &str = "__id";
/// Key of the reference target field in the wire form.
pub const REF_KEY: &str = "__ref";

/// Field names owned by the engine.
pub const RESERVED_KEYS: [&str; 3] = [TYPE_KEY, ID_KEY, REF_KEY];

/// Default prefix for escaping user field names.
pub const DEFAULT_ESCAPE_PREFIX: &str = "__esc__";

/// Reversible renaming of user field names which collide with engine
/// metadata keys.
///
/// A key is escaped if it is one of the reserved keys, or if it already
/// starts with the prefix. Unescaping strips exactly one prefix. Together
/// this makes `unescape(escape(k)) == k` for every `k`, and guarantees an
/// escaped key is never a reserved key.
#[derive(Clone, Debug)]
pub struct KeyEscaper<'p> {
	prefix: &'p str,
}

impl<'p> KeyEscaper<'p> {
	pub fn new(prefix: &'p str) -> Self {
		// An empty prefix could not mark anything as escaped
		let prefix = if prefix.is_empty() {
			DEFAULT_ESCAPE_PREFIX
		} else {
			prefix
		};
		Self { prefix }
	}

	#[inline]
	pub fn prefix(&self) -> &str {
		self.prefix
	}

	pub fn needs_escape(&self, key: &str) -> bool {
		RESERVED_KEYS.contains(&key) || key.starts_with(self.prefix)
	}

	pub fn escape<'k>(&self, key: &'k str) -> Cow<'k, str> {
		if self.needs_escape(key) {
			Cow::Owned(format!("{}{}", self.prefix, key))
		} else {
			Cow::Borrowed(key)
		}
	}

	pub fn unescape<'k>(&self, key: &'k str) -> &'k str {
		key.strip_prefix(self.prefix).unwrap_or(key)
	}
}

impl Default for KeyEscaper<'static> {
	fn default() -> Self {
		Self::new(DEFAULT_ESCAPE_PREFIX)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_keys_untouched() {
		let escaper = KeyEscaper::default();
		for key in ["name", "type", "id", "_type", "___", ""] {
			assert_eq!(escaper.escape(key), key);
			assert_eq!(escaper.unescape(key), key);
		}
	}

	#[test]
	fn reserved_keys_escaped() {
		let escaper = KeyEscaper::default();
		for key in RESERVED_KEYS {
			let escaped = escaper.escape(key);
			assert_eq!(escaped, format!("__esc__{}", key));
			assert!(!RESERVED_KEYS.contains(&escaped.as_ref()));
			assert_eq!(escaper.unescape(&escaped), key);
		}
	}

	#[test]
	fn underscore_variants() {
		let escaper = KeyEscaper::default();
		// Extra underscores don't make a key reserved
		assert_eq!(escaper.escape("___type"), "___type");
		assert_eq!(escaper.escape("_id"), "_id");
		assert_eq!(escaper.escape("__ref__"), "__ref__");

		// Keys which look already-escaped are escaped again
		let key = "__esc____type";
		let escaped = escaper.escape(key);
		assert_eq!(escaped, "__esc____esc____type");
		assert_eq!(escaper.unescape(&escaped), key);

		let key = "__esc__";
		assert_eq!(escaper.unescape(&escaper.escape(key)), key);
	}

	#[test]
	fn custom_prefix() {
		let escaper = KeyEscaper::new("$$");
		assert_eq!(escaper.escape("__id"), "$$__id");
		assert_eq!(escaper.escape("$$x"), "$$$$x");
		assert_eq!(escaper.unescape("$$$$x"), "$$x");
		assert_eq!(escaper.escape("__esc__id"), "__esc__id");
	}

	#[test]
	fn empty_prefix_falls_back_to_default() {
		let escaper = KeyEscaper::new("");
		assert_eq!(escaper.prefix(), DEFAULT_ESCAPE_PREFIX);
	}
}
