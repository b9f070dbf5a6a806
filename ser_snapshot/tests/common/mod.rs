#![allow(dead_code)]

mod graph_data;
pub use graph_data::generate_graph;

use ser_snapshot::{Marker, MarkerKind, SerializedNode};

/// Install a test-writer subscriber, so `RUST_LOG=ser_snapshot=trace` shows
/// engine events for a failing test.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// Nesting levels at which `MaxDepthExceeded` markers appear in a tree.
///
/// Levels are counted the way the serializer counts them: record fields,
/// sequence items, map keys/values and set members are one level below their
/// container.
pub fn truncation_depths(node: &SerializedNode) -> Vec<usize> {
	let mut depths = Vec::new();
	collect_truncations(node, 0, &mut depths);
	depths
}

fn collect_truncations(node: &SerializedNode, depth: usize, out: &mut Vec<usize>) {
	match node {
		SerializedNode::Primitive(_) | SerializedNode::Reference(_) => {}
		SerializedNode::Record(record) => {
			for field in record.fields.values() {
				collect_truncations(field, depth + 1, out);
			}
		}
		SerializedNode::Sequence(items) => {
			for item in items {
				collect_truncations(item, depth + 1, out);
			}
		}
		SerializedNode::Marker(marker) => match marker.kind {
			MarkerKind::MaxDepthExceeded => out.push(depth),
			MarkerKind::Map => {
				for pair in sequence(marker, "entries") {
					for member in pair.as_sequence().unwrap_or(&[]) {
						collect_truncations(member, depth + 1, out);
					}
				}
			}
			MarkerKind::Set => {
				for member in sequence(marker, "values") {
					collect_truncations(member, depth + 1, out);
				}
			}
			_ => {}
		},
	}
}

fn sequence<'m>(marker: &'m Marker, key: &str) -> &'m [SerializedNode] {
	marker
		.get(key)
		.and_then(SerializedNode::as_sequence)
		.unwrap_or(&[])
}

/// All record ids in a tree, in document order.
pub fn record_ids(node: &SerializedNode) -> Vec<String> {
	let mut ids = Vec::new();
	node.walk(&mut |node| {
		if let SerializedNode::Record(record) = node {
			if let Some(id) = &record.id {
				ids.push(id.clone());
			}
		}
	});
	ids
}

/// All reference targets in a tree, in document order.
pub fn reference_ids(node: &SerializedNode) -> Vec<String> {
	let mut ids = Vec::new();
	node.walk(&mut |node| {
		if let SerializedNode::Reference(id) = node {
			ids.push(id.clone());
		}
	});
	ids
}

/// Every field name used by any record in a tree.
pub fn field_names(node: &SerializedNode) -> Vec<String> {
	let mut names = Vec::new();
	node.walk(&mut |node| {
		if let SerializedNode::Record(record) = node {
			names.extend(record.fields.keys().cloned());
		}
	});
	names
}

/// Nested chain of plain objects `{ "child": { "child": ... { "leaf": true } } }`
/// with `levels` objects.
pub fn nested_objects(levels: usize) -> ser_snapshot::Value {
	let mut value = ser_snapshot::object! { "leaf" => true };
	for _ in 1..levels {
		value = ser_snapshot::object! { "child" => value };
	}
	value
}
