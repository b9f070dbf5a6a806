use ser_snapshot::{
	deserialize, DeserializeOptions, Error, Marker, MarkerKind, SerializedNode, Value,
	DEFAULT_TREE_DEPTH,
};
use serde_json::json;

mod common;
use common::init_tracing;

fn load(json: serde_json::Value, options: &DeserializeOptions) -> Value {
	init_tracing();
	deserialize(&SerializedNode::from_json(&json), options).unwrap()
}

#[test]
fn unlisted_type_becomes_plain_object() {
	let restored = load(
		json!({
			"__type": "Malicious",
			"__id": "x",
			"payload": { "__type": "Evil", "__id": "y", "run": "rm -rf /" },
		}),
		&DeserializeOptions::default(),
	);
	assert_eq!(restored.type_name(), "Object");
	let payload = restored.get("payload").unwrap();
	assert_eq!(payload.type_name(), "Object");
	assert_eq!(payload.get("run").unwrap().as_str(), Some("rm -rf /"));
}

#[test]
fn allowlist_is_opt_in() {
	let json = json!({ "__type": "User", "__id": "0", "name": "Ann" });

	let restored = load(json.clone(), &DeserializeOptions::default());
	assert_eq!(restored.type_name(), "Object");

	let restored = load(json, &DeserializeOptions::default().allow_constructor("User"));
	assert_eq!(restored.type_name(), "User");
	assert_eq!(restored.get("name").unwrap().as_str(), Some("Ann"));
}

#[test]
fn malformed_markers_are_recovered_locally() {
	let restored = load(
		json!({
			"__type": "Object",
			"__id": "0",
			"no_value": { "__type": "Date" },
			"bad_date": { "__type": "Date", "value": "not a date" },
			"numeric_date": { "__type": "Date", "value": 42 },
			"no_source": { "__type": "RegExp", "flags": "g" },
			"bad_flags": { "__type": "RegExp", "source": "a", "flags": "gq" },
			"repeated_flags": { "__type": "RegExp", "source": "a", "flags": "gg" },
			"no_entries": { "__type": "Map" },
			"no_values": { "__type": "Set", "values": "oops" },
			"no_bigint": { "__type": "BigInt" },
			"ok": 1,
		}),
		&DeserializeOptions::default(),
	);

	for key in [
		"no_value",
		"bad_date",
		"numeric_date",
		"no_source",
		"bad_flags",
		"repeated_flags",
		"no_entries",
		"no_values",
		"no_bigint",
	] {
		assert!(restored.get(key).unwrap().is_undefined(), "{} not recovered", key);
	}
	assert_eq!(restored.get("ok").unwrap().as_f64(), Some(1.0));
}

#[test]
fn malformed_map_entries_are_skipped() {
	let restored = load(
		json!({
			"__type": "Map",
			"entries": [["a", 1], ["lonely"], "junk", ["b", 2, 3], ["c", 3]],
		}),
		&DeserializeOptions::default(),
	);
	let entries = restored.as_map().unwrap().borrow();
	let keys: Vec<&str> = entries.iter().filter_map(|(key, _)| key.as_str()).collect();
	assert_eq!(keys, ["a", "c"]);
}

#[test]
fn error_marker_defaults() {
	let restored = load(json!({ "__type": "Error" }), &DeserializeOptions::default());
	let err = restored.as_error().unwrap();
	assert_eq!(err.name, "Error");
	assert_eq!(err.message, "");
	assert_eq!(err.stack, None);
}

#[test]
fn invalid_bigint_is_fatal() {
	init_tracing();
	for payload in [json!("12x"), json!(""), json!(1.5), json!(true)] {
		let node = SerializedNode::from_json(&json!({
			"__type": "Object",
			"__id": "0",
			"n": { "__type": "BigInt", "value": payload },
		}));
		let result = deserialize(&node, &DeserializeOptions::default());
		assert!(
			matches!(result, Err(Error::InvalidBigInt { .. })),
			"{:?} accepted",
			payload
		);
	}
}

#[test]
fn bigint_accepts_integral_number() {
	let restored = load(
		json!({ "__type": "BigInt", "value": 42 }),
		&DeserializeOptions::default(),
	);
	assert_eq!(restored.as_bigint().unwrap().to_string(), "42");
}

#[test]
fn bigint_from_large_number_keeps_full_width() {
	for (payload, expected) in [
		(json!(1e20), "100000000000000000000"),
		(json!(-1e20), "-100000000000000000000"),
		(json!(2f64.powi(70)), "1180591620717411303424"),
	] {
		let restored = load(
			json!({ "__type": "BigInt", "value": payload }),
			&DeserializeOptions::default(),
		);
		assert_eq!(restored.as_bigint().unwrap().to_string(), expected);
	}
}

/// Sequences nested `levels` deep around a string.
fn nested_sequences(levels: usize) -> SerializedNode {
	let mut node = SerializedNode::string("leaf");
	for _ in 0..levels {
		node = SerializedNode::Sequence(vec![node]);
	}
	node
}

#[test]
fn deep_tree_is_truncated() {
	init_tracing();
	let options = DeserializeOptions::default().with_max_depth(5);
	let mut value = deserialize(&nested_sequences(20), &options).unwrap();
	for _ in 0..5 {
		value = value.index(0).unwrap();
	}
	assert_eq!(value.type_name(), "Object");
	assert_eq!(value.get("__type").unwrap().as_str(), Some("MaxDepthExceeded"));
	assert_eq!(
		value.get("message").unwrap().as_str(),
		Some("Maximum depth of 5 exceeded")
	);

	// Shallower trees are untouched
	let value = deserialize(&nested_sequences(4), &options).unwrap();
	let leaf = (0..4).fold(value, |value, _| value.index(0).unwrap());
	assert_eq!(leaf.as_str(), Some("leaf"));
}

#[test]
fn default_tree_depth_limit() {
	init_tracing();
	let options = DeserializeOptions::default();
	let mut value = deserialize(&nested_sequences(1000), &options).unwrap();
	for _ in 0..DEFAULT_TREE_DEPTH {
		value = value.index(0).unwrap();
	}
	assert_eq!(value.get("__type").unwrap().as_str(), Some("MaxDepthExceeded"));
}

#[test]
fn unknown_reference_yields_shared_placeholder() {
	let restored = load(
		json!([{ "__ref": "999" }, { "__ref": "999" }]),
		&DeserializeOptions::default(),
	);
	let first = restored.index(0).unwrap();
	assert_eq!(first.type_name(), "Object");
	assert!(first.as_object().unwrap().borrow().is_empty());
	assert!(first.ptr_eq(&restored.index(1).unwrap()));
}

#[test]
fn forward_reference_is_filled_in() {
	let restored = load(
		json!([
			{ "__ref": "7" },
			{ "__type": "User", "__id": "7", "name": "late" },
		]),
		&DeserializeOptions::default().allow_constructor("User"),
	);
	let early = restored.index(0).unwrap();
	let late = restored.index(1).unwrap();
	assert!(early.ptr_eq(&late));
	assert_eq!(early.type_name(), "User");
	assert_eq!(early.get("name").unwrap().as_str(), Some("late"));
}

#[test]
fn reference_spoofing_is_escaped() {
	// A user field named `__ref` comes back escaped, not as a reference
	let restored = load(
		json!({ "__type": "Object", "__id": "0", "__esc____ref": "0", "__esc____type": "Evil" }),
		&DeserializeOptions::default(),
	);
	assert_eq!(restored.get("__ref").unwrap().as_str(), Some("0"));
	assert_eq!(restored.get("__type").unwrap().as_str(), Some("Evil"));
	assert_eq!(restored.type_name(), "Object");
}

#[test]
fn functions_are_never_revived_as_code() {
	let json = json!({ "__type": "Function", "name": "f", "source": "() => process.exit()" });
	let restored = load(json.clone(), &DeserializeOptions::default());
	assert!(restored.is_null());

	let options = DeserializeOptions::default().with_reviver("Function", |node| {
		let name = node
			.as_marker()
			.and_then(|marker| marker.get_str("name"))
			.unwrap_or_default();
		Value::string(format!("[Function {}]", name))
	});
	let restored = load(json, &options);
	assert_eq!(restored.as_str(), Some("[Function f]"));
}

#[test]
fn restore_special_types_off() {
	let options = DeserializeOptions::default().with_restore_special_types(false);
	let restored = load(
		json!({ "__type": "Date", "value": "2023-06-15T10:30:00.000Z" }),
		&options,
	);
	assert!(restored.as_date().is_none());
	assert_eq!(restored.type_name(), "Object");
	assert_eq!(restored.get("__type").unwrap().as_str(), Some("Date"));
	assert_eq!(
		restored.get("value").unwrap().as_str(),
		Some("2023-06-15T10:30:00.000Z")
	);

	// Even a corrupt BigInt is left as data
	let restored = load(json!({ "__type": "BigInt", "value": "12x" }), &options);
	assert_eq!(restored.get("value").unwrap().as_str(), Some("12x"));
}

#[test]
fn reviver_overrides_built_in() {
	let options = DeserializeOptions::default().with_reviver("Date", |node| {
		let iso = node
			.as_marker()
			.and_then(|marker| marker.get_str("value"))
			.unwrap_or_default();
		Value::string(iso)
	});
	let restored = load(
		json!({ "__type": "Date", "value": "2023-06-15T10:30:00.000Z" }),
		&options,
	);
	assert_eq!(restored.as_str(), Some("2023-06-15T10:30:00.000Z"));
}

#[test]
fn revived_record_is_registered() {
	let options = DeserializeOptions::default().with_reviver("Point", |_| Value::string("point"));
	let restored = load(
		json!([{ "__type": "Point", "__id": "3", "x": 1 }, { "__ref": "3" }]),
		&options,
	);
	assert_eq!(restored.index(1).unwrap().as_str(), Some("point"));
}

#[test]
fn unknown_tags_and_junk_parse() {
	// Anything JSON parses to some tree
	let node = SerializedNode::from_json(&json!({ "__type": "NoSuchThing", "x": [1, null] }));
	let record = node.as_record().unwrap();
	assert_eq!(record.type_name, "NoSuchThing");
	assert_eq!(record.id, None);

	let node = SerializedNode::from_json(&json!({ "plain": true }));
	assert_eq!(node.as_record().unwrap().type_name, "Object");

	assert_eq!(
		SerializedNode::from_json(&json!({ "__type": "Map", "entries": [] })),
		SerializedNode::Marker(
			Marker::new(MarkerKind::Map).with("entries", SerializedNode::Sequence(vec![]))
		)
	);
}
