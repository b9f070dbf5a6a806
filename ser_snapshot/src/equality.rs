use std::{collections::HashMap, str::FromStr};

use num_bigint::BigInt;

use crate::{
	node::{Fields, Marker, MarkerKind, Primitive, Record},
	serialize,
	value::parse_date,
	SerializeOptions, SerializedNode, Value,
};

/// Type-aware deep equality of two values.
///
/// Both sides are serialized independently, and the trees compared:
///
/// * `NaN` equals `NaN`.
/// * Dates compare by instant, patterns by source and flag set, big integers
///   by value.
/// * Maps and sets compare by content, ignoring order.
/// * Records compare by type name and fields, ignoring field order.
/// * Ids are call-scoped, so aren't compared directly. Instead the two trees
///   must use them in the same shape: each id on one side corresponds to
///   exactly one id on the other.
///
/// Members of a map or set are paired up with backtracking, but once a whole
/// map or set has matched, that pairing is final. If it only fails because of
/// a reference later in the tree, other pairings aren't tried, and the values
/// compare unequal even if they are isomorphic.
pub fn snapshots_equal(a: &Value, b: &Value, options: &SerializeOptions) -> bool {
	let a = serialize(a, options);
	let b = serialize(b, options);
	nodes_equal(&a, &b)
}

/// Type-aware deep equality of two trees. See [`snapshots_equal`].
pub fn nodes_equal(a: &SerializedNode, b: &SerializedNode) -> bool {
	let mut comparer = Comparer::default();
	comparer.eq(a, b)
}

/// Bijection between the ids of the two trees, built up as they're compared.
#[derive(Clone, Default)]
struct Comparer {
	a_to_b: HashMap<String, String>,
	b_to_a: HashMap<String, String>,
}

impl Comparer {
	fn eq(&mut self, a: &SerializedNode, b: &SerializedNode) -> bool {
		match (a, b) {
			(SerializedNode::Primitive(a), SerializedNode::Primitive(b)) => primitives_eq(a, b),
			(SerializedNode::Reference(a), SerializedNode::Reference(b)) => self.bind(a, b),
			(SerializedNode::Sequence(a), SerializedNode::Sequence(b)) => {
				a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.eq(a, b))
			}
			(SerializedNode::Record(a), SerializedNode::Record(b)) => self.records_eq(a, b),
			(SerializedNode::Marker(a), SerializedNode::Marker(b)) => self.markers_eq(a, b),
			_ => false,
		}
	}

	fn bind(&mut self, a: &str, b: &str) -> bool {
		match (self.a_to_b.get(a), self.b_to_a.get(b)) {
			(Some(mapped_b), Some(mapped_a)) => mapped_b == b && mapped_a == a,
			(None, None) => {
				self.a_to_b.insert(a.to_string(), b.to_string());
				self.b_to_a.insert(b.to_string(), a.to_string());
				true
			}
			_ => false,
		}
	}

	fn records_eq(&mut self, a: &Record, b: &Record) -> bool {
		if a.type_name != b.type_name {
			return false;
		}
		let ids_match = match (&a.id, &b.id) {
			(Some(a), Some(b)) => self.bind(a, b),
			(None, None) => true,
			_ => false,
		};
		ids_match && self.fields_eq(&a.fields, &b.fields)
	}

	fn fields_eq(&mut self, a: &Fields, b: &Fields) -> bool {
		a.len() == b.len()
			&& a
				.iter()
				.all(|(key, a)| b.get(key).map_or(false, |b| self.eq(a, b)))
	}

	fn markers_eq(&mut self, a: &Marker, b: &Marker) -> bool {
		if a.kind != b.kind {
			return false;
		}
		match a.kind {
			MarkerKind::Date => match (a.get_str("value"), b.get_str("value")) {
				(Some(a), Some(b)) => {
					match (parse_date(a), parse_date(b)) {
						(Some(a), Some(b)) => a == b,
						_ => a == b,
					}
				}
				_ => self.fields_eq(&a.payload, &b.payload),
			},
			MarkerKind::BigInt => match (a.get_str("value"), b.get_str("value")) {
				(Some(a), Some(b)) => match (BigInt::from_str(a), BigInt::from_str(b)) {
					(Ok(a), Ok(b)) => a == b,
					_ => a == b,
				},
				_ => self.fields_eq(&a.payload, &b.payload),
			},
			MarkerKind::RegExp => {
				a.get_str("source") == b.get_str("source")
					&& sorted_flags(a.get_str("flags")) == sorted_flags(b.get_str("flags"))
			}
			MarkerKind::Map => match (sequence(a, "entries"), sequence(b, "entries")) {
				(Some(a), Some(b)) => self.unordered_eq(a, b),
				_ => self.fields_eq(&a.payload, &b.payload),
			},
			MarkerKind::Set => match (sequence(a, "values"), sequence(b, "values")) {
				(Some(a), Some(b)) => self.unordered_eq(a, b),
				_ => self.fields_eq(&a.payload, &b.payload),
			},
			MarkerKind::Error | MarkerKind::Function | MarkerKind::MaxDepthExceeded => {
				self.fields_eq(&a.payload, &b.payload)
			}
		}
	}

	/// Every member of `a` matches a distinct member of `b`.
	fn unordered_eq(&mut self, a: &[SerializedNode], b: &[SerializedNode]) -> bool {
		a.len() == b.len() && self.match_members(a, b, &mut vec![false; b.len()])
	}

	/// Pair off the first member of `a`, then the rest. A pairing which leaves
	/// the rest unmatchable is undone, ids bound along the way included, and
	/// the next candidate tried.
	fn match_members(
		&mut self,
		a: &[SerializedNode],
		b: &[SerializedNode],
		matched: &mut [bool],
	) -> bool {
		let Some((a_member, rest)) = a.split_first() else {
			return true;
		};

		for (index, b_member) in b.iter().enumerate() {
			if matched[index] {
				continue;
			}
			let checkpoint = self.clone();
			if self.eq(a_member, b_member) {
				matched[index] = true;
				if self.match_members(rest, b, matched) {
					return true;
				}
				matched[index] = false;
			}
			*self = checkpoint;
		}
		false
	}
}

fn primitives_eq(a: &Primitive, b: &Primitive) -> bool {
	match (a, b) {
		(Primitive::Number(a), Primitive::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
		_ => a == b,
	}
}

fn sequence<'m>(marker: &'m Marker, key: &str) -> Option<&'m [SerializedNode]> {
	marker.get(key).and_then(SerializedNode::as_sequence)
}

fn sorted_flags(flags: Option<&str>) -> Vec<char> {
	let mut flags: Vec<char> = flags.unwrap_or("").chars().collect();
	flags.sort_unstable();
	flags
}
