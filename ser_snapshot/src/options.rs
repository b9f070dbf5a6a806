use std::{
	collections::{HashMap, HashSet},
	fmt,
	sync::Arc,
};

use serde::Deserialize;

use crate::{
	escape::DEFAULT_ESCAPE_PREFIX,
	value::{ARRAY_TYPE, OBJECT_TYPE},
	SerializedNode, Value,
};

/// Default recursion ceiling, in nesting levels.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Default nesting ceiling when reading a tree, in tree levels. A map entry
/// takes 3 levels, so this leaves room for anything serialized with
/// [`DEFAULT_MAX_DEPTH`].
pub const DEFAULT_TREE_DEPTH: usize = 256;

/// Custom serialization for one type tag. Returning `Err` is recovered as an
/// inline error marker.
pub type Transformer = Arc<dyn Fn(&Value) -> Result<SerializedNode, String> + Send + Sync>;

/// Custom reconstruction for one type tag. Receives the raw node.
pub type Reviver = Arc<dyn Fn(&SerializedNode) -> Value + Send + Sync>;

/// Options for [`serialize`](crate::serialize).
#[derive(Clone)]
pub struct SerializeOptions {
	/// Containers nested this deep or deeper are replaced by a
	/// `MaxDepthExceeded` marker.
	pub max_depth: usize,
	/// Field names dropped everywhere in the tree.
	pub skip_keys: HashSet<String>,
	/// If `false`, every record is tagged as a plain `Object`.
	pub preserve_type: bool,
	/// Prefix for user field names colliding with metadata keys.
	pub escape_prefix: String,
	/// Keyed by [`Value::type_name`]. Checked before built-in handling.
	pub custom_transformers: HashMap<String, Transformer>,
}

impl Default for SerializeOptions {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			skip_keys: HashSet::new(),
			preserve_type: true,
			escape_prefix: DEFAULT_ESCAPE_PREFIX.to_string(),
			custom_transformers: HashMap::new(),
		}
	}
}

impl SerializeOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	pub fn skip_key(mut self, key: impl Into<String>) -> Self {
		self.skip_keys.insert(key.into());
		self
	}

	pub fn with_skip_keys<I, K>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = K>,
		K: Into<String>,
	{
		self.skip_keys.extend(keys.into_iter().map(Into::into));
		self
	}

	pub fn with_preserve_type(mut self, preserve_type: bool) -> Self {
		self.preserve_type = preserve_type;
		self
	}

	pub fn with_escape_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.escape_prefix = prefix.into();
		self
	}

	pub fn with_transformer<F>(mut self, type_name: impl Into<String>, transform: F) -> Self
	where F: Fn(&Value) -> Result<SerializedNode, String> + Send + Sync + 'static {
		self
			.custom_transformers
			.insert(type_name.into(), Arc::new(transform));
		self
	}

	#[inline]
	pub(crate) fn is_skipped(&self, key: &str) -> bool {
		self.skip_keys.contains(key)
	}
}

impl fmt::Debug for SerializeOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SerializeOptions")
			.field("max_depth", &self.max_depth)
			.field("skip_keys", &self.skip_keys)
			.field("preserve_type", &self.preserve_type)
			.field("escape_prefix", &self.escape_prefix)
			.field(
				"custom_transformers",
				&self.custom_transformers.keys().collect::<Vec<_>>(),
			)
			.finish()
	}
}

/// Options for [`deserialize`](crate::deserialize).
#[derive(Clone)]
pub struct DeserializeOptions {
	/// If `false`, markers come back as their raw field data.
	pub restore_special_types: bool,
	/// Record type names which may keep their type tag. Any other type name is
	/// replaced with the generic `Object` tag.
	pub allowed_constructors: HashSet<String>,
	/// Keyed by marker tag or record type name. Checked before built-in
	/// handling.
	pub custom_revivers: HashMap<String, Reviver>,
	/// Must match the prefix the tree was serialized with.
	pub escape_prefix: String,
	/// Tree nodes nested this deep or deeper are not read.
	pub max_depth: usize,
}

impl Default for DeserializeOptions {
	fn default() -> Self {
		Self {
			restore_special_types: true,
			allowed_constructors: [OBJECT_TYPE, ARRAY_TYPE]
				.into_iter()
				.map(String::from)
				.collect(),
			custom_revivers: HashMap::new(),
			escape_prefix: DEFAULT_ESCAPE_PREFIX.to_string(),
			max_depth: DEFAULT_TREE_DEPTH,
		}
	}
}

impl DeserializeOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_restore_special_types(mut self, restore: bool) -> Self {
		self.restore_special_types = restore;
		self
	}

	pub fn allow_constructor(mut self, type_name: impl Into<String>) -> Self {
		self.allowed_constructors.insert(type_name.into());
		self
	}

	pub fn with_allowed_constructors<I, K>(mut self, type_names: I) -> Self
	where
		I: IntoIterator<Item = K>,
		K: Into<String>,
	{
		self
			.allowed_constructors
			.extend(type_names.into_iter().map(Into::into));
		self
	}

	pub fn with_reviver<F>(mut self, tag: impl Into<String>, revive: F) -> Self
	where F: Fn(&SerializedNode) -> Value + Send + Sync + 'static {
		self.custom_revivers.insert(tag.into(), Arc::new(revive));
		self
	}

	pub fn with_escape_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.escape_prefix = prefix.into();
		self
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	#[inline]
	pub(crate) fn is_allowed(&self, type_name: &str) -> bool {
		self.allowed_constructors.contains(type_name)
	}
}

impl fmt::Debug for DeserializeOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeserializeOptions")
			.field("restore_special_types", &self.restore_special_types)
			.field("allowed_constructors", &self.allowed_constructors)
			.field(
				"custom_revivers",
				&self.custom_revivers.keys().collect::<Vec<_>>(),
			)
			.field("escape_prefix", &self.escape_prefix)
			.field("max_depth", &self.max_depth)
			.finish()
	}
}

/// Closure-free part of [`SerializeOptions`], loadable from config files.
///
/// ```
/// use ser_snapshot::{SerializeConfig, SerializeOptions};
///
/// let config: SerializeConfig =
/// 	serde_json::from_str(r#"{ "maxDepth": 8, "skipKeys": ["password"] }"#).unwrap();
/// let options = SerializeOptions::from(config);
/// assert_eq!(options.max_depth, 8);
/// assert!(options.preserve_type);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializeConfig {
	pub max_depth: usize,
	pub skip_keys: Vec<String>,
	pub preserve_type: bool,
	pub escape_prefix: String,
}

impl Default for SerializeConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			skip_keys: Vec::new(),
			preserve_type: true,
			escape_prefix: DEFAULT_ESCAPE_PREFIX.to_string(),
		}
	}
}

impl From<SerializeConfig> for SerializeOptions {
	fn from(config: SerializeConfig) -> Self {
		SerializeOptions::default()
			.with_max_depth(config.max_depth)
			.with_skip_keys(config.skip_keys)
			.with_preserve_type(config.preserve_type)
			.with_escape_prefix(config.escape_prefix)
	}
}

/// Closure-free part of [`DeserializeOptions`], loadable from config files.
///
/// `allowedConstructors` adds to the default allowlist, it doesn't replace it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DeserializeConfig {
	pub restore_special_types: bool,
	pub allowed_constructors: Vec<String>,
	pub escape_prefix: String,
	pub max_depth: usize,
}

impl Default for DeserializeConfig {
	fn default() -> Self {
		Self {
			restore_special_types: true,
			allowed_constructors: Vec::new(),
			escape_prefix: DEFAULT_ESCAPE_PREFIX.to_string(),
			max_depth: DEFAULT_TREE_DEPTH,
		}
	}
}

impl From<DeserializeConfig> for DeserializeOptions {
	fn from(config: DeserializeConfig) -> Self {
		DeserializeOptions::default()
			.with_restore_special_types(config.restore_special_types)
			.with_allowed_constructors(config.allowed_constructors)
			.with_escape_prefix(config.escape_prefix)
			.with_max_depth(config.max_depth)
	}
}
