use std::{cell::RefCell, fmt, rc::Rc};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

/// Shared, mutable handle to a container.
///
/// Cloning a handle does not clone the container, so two handles to the same
/// allocation are the "same object" as far as the serializer is concerned.
pub type Shared<T> = Rc<RefCell<T>>;

/// Type name given to objects with no class identity.
pub const OBJECT_TYPE: &str = "Object";
/// Type name given to arrays.
pub const ARRAY_TYPE: &str = "Array";

/// An in-memory value which can be snapshotted.
///
/// Scalars are held inline. `Array`, `Map`, `Set` and `Object` are handles to
/// shared containers, so a graph of values can contain repeated references
/// and cycles.
#[derive(Clone)]
pub enum Value {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	BigInt(BigInt),
	Date(DateTime<Utc>),
	Pattern(Pattern),
	Error(ErrorValue),
	Function(FunctionValue),
	Array(Shared<Vec<Value>>),
	Map(Shared<Vec<(Value, Value)>>),
	Set(Shared<Vec<Value>>),
	Object(Shared<Object>),
}

/// A pattern matcher: source text plus flag set, e.g. `/test/gi`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
	pub source: String,
	pub flags: String,
}

/// Flags a pattern may carry. Each at most once.
pub const PATTERN_FLAGS: &str = "dgimsuvy";

impl Pattern {
	/// Whether every flag is one of [`PATTERN_FLAGS`] and none is repeated.
	/// Patterns failing this can't be serialized.
	pub fn has_valid_flags(&self) -> bool {
		valid_flags(&self.flags)
	}
}

pub(crate) fn valid_flags(flags: &str) -> bool {
	flags
		.char_indices()
		.all(|(index, flag)| PATTERN_FLAGS.contains(flag) && !flags[..index].contains(flag))
}

/// RFC 3339 text for a date, in UTC.
///
/// Whole milliseconds are written with 3 fraction digits. Finer instants get
/// as many digits as they need, so no precision is lost.
pub(crate) fn format_date(instant: &DateTime<Utc>) -> String {
	let format = if instant.timestamp_subsec_nanos() % 1_000_000 == 0 {
		SecondsFormat::Millis
	} else {
		SecondsFormat::AutoSi
	};
	instant.to_rfc3339_opts(format, true)
}

/// Parse a date written by [`format_date`], or any RFC 3339 timestamp.
pub(crate) fn parse_date(iso: &str) -> Option<DateTime<Utc>> {
	if let Ok(instant) = DateTime::parse_from_rfc3339(iso) {
		return Some(instant.with_timezone(&Utc));
	}

	// Years outside 0000-9999 are written signed, e.g. `+10000-01-01T00:00:00.000Z`,
	// which RFC 3339 parsing rejects
	let naive = iso.strip_suffix('Z')?;
	NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
		.ok()
		.map(|naive| Utc.from_utc_datetime(&naive))
}

/// An exception value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
	pub name: String,
	pub message: String,
	pub stack: Option<String>,
}

/// A function. Only its name and source text are kept - it can never be
/// called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionValue {
	pub name: String,
	pub source: String,
}

/// A plain or class-tagged record.
#[derive(Clone)]
pub struct Object {
	type_name: String,
	fields: IndexMap<String, Value>,
}

impl Object {
	/// Create empty object tagged with `type_name`.
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			fields: IndexMap::new(),
		}
	}

	/// Create empty plain object.
	pub fn plain() -> Self {
		Self::new(OBJECT_TYPE)
	}

	#[inline]
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn set_type_name(&mut self, type_name: impl Into<String>) {
		self.type_name = type_name.into();
	}

	#[inline]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	/// Insert a field. Replaces any existing field with same key, keeping its
	/// position.
	pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
		self.fields.insert(key.into(), value)
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.fields.shift_remove(key)
	}

	#[inline]
	pub fn contains_key(&self, key: &str) -> bool {
		self.fields.contains_key(key)
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
		self.fields.iter()
	}

	pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
		self.fields.keys()
	}
}

impl Default for Object {
	fn default() -> Self {
		Self::plain()
	}
}

impl Value {
	/// Create a new array.
	pub fn array(items: Vec<Value>) -> Self {
		Value::Array(Rc::new(RefCell::new(items)))
	}

	/// Create a new map from its entries.
	pub fn map(entries: Vec<(Value, Value)>) -> Self {
		Value::Map(Rc::new(RefCell::new(entries)))
	}

	/// Create a new set.
	pub fn set(values: Vec<Value>) -> Self {
		Value::Set(Rc::new(RefCell::new(values)))
	}

	/// Create a new object tagged with `type_name`.
	pub fn object<K, I>(type_name: impl Into<String>, fields: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		let mut object = Object::new(type_name);
		for (key, value) in fields {
			object.insert(key, value);
		}
		Value::Object(Rc::new(RefCell::new(object)))
	}

	/// Create a new empty plain object.
	pub fn empty_object() -> Self {
		Value::Object(Rc::new(RefCell::new(Object::plain())))
	}

	pub fn string(s: impl Into<String>) -> Self {
		Value::String(s.into())
	}

	pub fn bigint(n: impl Into<BigInt>) -> Self {
		Value::BigInt(n.into())
	}

	pub fn date(instant: DateTime<Utc>) -> Self {
		Value::Date(instant)
	}

	pub fn pattern(source: impl Into<String>, flags: impl Into<String>) -> Self {
		Value::Pattern(Pattern {
			source: source.into(),
			flags: flags.into(),
		})
	}

	pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
		Value::Error(ErrorValue {
			name: name.into(),
			message: message.into(),
			stack: None,
		})
	}

	pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
		Value::Function(FunctionValue {
			name: name.into(),
			source: source.into(),
		})
	}

	/// Tag used to look up custom transformers for this value.
	///
	/// Objects report their own type name. Everything else reports the name of
	/// its kind (`"Date"`, `"RegExp"`, `"Map"`...).
	pub fn type_name(&self) -> String {
		match self {
			Value::Undefined => "undefined".to_string(),
			Value::Null => "null".to_string(),
			Value::Bool(_) => "boolean".to_string(),
			Value::Number(_) => "number".to_string(),
			Value::String(_) => "string".to_string(),
			Value::BigInt(_) => "BigInt".to_string(),
			Value::Date(_) => "Date".to_string(),
			Value::Pattern(_) => "RegExp".to_string(),
			Value::Error(_) => "Error".to_string(),
			Value::Function(_) => "Function".to_string(),
			Value::Array(_) => ARRAY_TYPE.to_string(),
			Value::Map(_) => "Map".to_string(),
			Value::Set(_) => "Set".to_string(),
			Value::Object(object) => match object.try_borrow() {
				Ok(object) => object.type_name.clone(),
				Err(_) => OBJECT_TYPE.to_string(),
			},
		}
	}

	/// Whether this is one of the identity-bearing container kinds.
	pub fn is_container(&self) -> bool {
		matches!(
			self,
			Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Object(_)
		)
	}

	/// Address of the container this value points to, if it's a container.
	pub(crate) fn container_addr(&self) -> Option<usize> {
		match self {
			Value::Array(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
			Value::Map(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
			Value::Set(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
			Value::Object(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
			_ => None,
		}
	}

	/// Identity comparison. `true` only if both values are handles to the same
	/// container.
	pub fn ptr_eq(&self, other: &Value) -> bool {
		match (self.container_addr(), other.container_addr()) {
			(Some(a), Some(b)) => a == b,
			_ => false,
		}
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bigint(&self) -> Option<&BigInt> {
		match self {
			Value::BigInt(n) => Some(n),
			_ => None,
		}
	}

	pub fn as_date(&self) -> Option<&DateTime<Utc>> {
		match self {
			Value::Date(instant) => Some(instant),
			_ => None,
		}
	}

	pub fn as_pattern(&self) -> Option<&Pattern> {
		match self {
			Value::Pattern(pattern) => Some(pattern),
			_ => None,
		}
	}

	pub fn as_error(&self) -> Option<&ErrorValue> {
		match self {
			Value::Error(err) => Some(err),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&Shared<Vec<Value>>> {
		match self {
			Value::Array(rc) => Some(rc),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&Shared<Vec<(Value, Value)>>> {
		match self {
			Value::Map(rc) => Some(rc),
			_ => None,
		}
	}

	pub fn as_set(&self) -> Option<&Shared<Vec<Value>>> {
		match self {
			Value::Set(rc) => Some(rc),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Shared<Object>> {
		match self {
			Value::Object(rc) => Some(rc),
			_ => None,
		}
	}

	/// Get a field of an object. `None` if not an object, or field not present.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.as_object()?.borrow().get(key).cloned()
	}

	/// Get an element of an array.
	pub fn index(&self, index: usize) -> Option<Value> {
		self.as_array()?.borrow().get(index).cloned()
	}

	/// Insert a field into an object. Returns `false` if not an object.
	pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
		match self.as_object() {
			Some(object) => {
				object.borrow_mut().insert(key, value);
				true
			}
			None => false,
		}
	}

	/// Append an element to an array. Returns `false` if not an array.
	pub fn push(&self, value: Value) -> bool {
		match self.as_array() {
			Some(items) => {
				items.borrow_mut().push(value);
				true
			}
			None => false,
		}
	}
}

impl From<Object> for Value {
	fn from(object: Object) -> Self {
		Value::Object(Rc::new(RefCell::new(object)))
	}
}

// `Debug` can't be derived - a cyclic graph would recurse forever.
// Containers already on the path being printed are shown as `[Circular]`.
impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut path = Vec::new();
		fmt_value(self, f, &mut path)
	}
}

fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
	if let Some(addr) = value.container_addr() {
		if path.contains(&addr) {
			return f.write_str("[Circular]");
		}
		path.push(addr);
		let result = fmt_container(value, f, path);
		path.pop();
		return result;
	}

	match value {
		Value::Undefined => f.write_str("undefined"),
		Value::Null => f.write_str("null"),
		Value::Bool(b) => write!(f, "{}", b),
		Value::Number(n) => write!(f, "{}", n),
		Value::String(s) => write!(f, "{:?}", s),
		Value::BigInt(n) => write!(f, "{}n", n),
		Value::Date(instant) => write!(f, "Date({})", instant.to_rfc3339()),
		Value::Pattern(pattern) => write!(f, "/{}/{}", pattern.source, pattern.flags),
		Value::Error(err) => write!(f, "{}: {}", err.name, err.message),
		Value::Function(func) => write!(f, "[Function {}]", func.name),
		_ => unreachable!(),
	}
}

fn fmt_container(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
	match value {
		Value::Array(items) => {
			let Ok(items) = items.try_borrow() else {
				return f.write_str("[Array <borrowed>]");
			};
			f.write_str("[")?;
			for (index, item) in items.iter().enumerate() {
				if index > 0 {
					f.write_str(", ")?;
				}
				fmt_value(item, f, path)?;
			}
			f.write_str("]")
		}
		Value::Map(entries) => {
			let Ok(entries) = entries.try_borrow() else {
				return f.write_str("Map <borrowed>");
			};
			f.write_str("Map {")?;
			for (index, (key, value)) in entries.iter().enumerate() {
				f.write_str(if index > 0 { ", " } else { " " })?;
				fmt_value(key, f, path)?;
				f.write_str(" => ")?;
				fmt_value(value, f, path)?;
			}
			f.write_str(" }")
		}
		Value::Set(values) => {
			let Ok(values) = values.try_borrow() else {
				return f.write_str("Set <borrowed>");
			};
			f.write_str("Set {")?;
			for (index, value) in values.iter().enumerate() {
				f.write_str(if index > 0 { ", " } else { " " })?;
				fmt_value(value, f, path)?;
			}
			f.write_str(" }")
		}
		Value::Object(object) => {
			let Ok(object) = object.try_borrow() else {
				return f.write_str("Object <borrowed>");
			};
			write!(f, "{} {{", object.type_name)?;
			for (index, (key, value)) in object.fields.iter().enumerate() {
				f.write_str(if index > 0 { ", " } else { " " })?;
				write!(f, "{}: ", key)?;
				fmt_value(value, f, path)?;
			}
			f.write_str(" }")
		}
		_ => unreachable!(),
	}
}

impl fmt::Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Object")
			.field("type_name", &self.type_name)
			.field("fields", &self.fields.keys().collect::<Vec<_>>())
			.finish()
	}
}
