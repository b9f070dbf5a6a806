use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use rand::{seq::SliceRandom, Rng};
use rand_pcg::Lcg64Xsh32;
use ser_snapshot::Value;

const TYPE_NAMES: [&str; 4] = ["Object", "User", "Team", "Settings"];
const KEYS: [&str; 10] = [
	"id", "name", "owner", "members", "tags", "created", "__type", "__id", "score", "password",
];

/// Generate a random value graph from `seed`. Same seed, same graph.
///
/// Graph contains every kind of value, objects shared between several
/// parents, and cycles back to earlier objects.
pub fn generate_graph(seed: u64, size: usize) -> Value {
	let mut generator = Generator {
		rng: Lcg64Xsh32::new(seed, 0xa02bdbf7bb3c0a7),
		objects: Vec::new(),
		budget: size,
	};
	let root = generator.object(0);
	// Close a few cycles back to the root
	for _ in 0..3 {
		let target = generator.objects.choose(&mut generator.rng).cloned();
		if let Some(target) = target {
			target.insert("back", root.clone());
		}
	}
	root
}

struct Generator {
	rng: Lcg64Xsh32,
	objects: Vec<Value>,
	budget: usize,
}

impl Generator {
	fn value(&mut self, depth: usize) -> Value {
		if self.budget == 0 || depth > 6 {
			return self.scalar();
		}
		self.budget -= 1;

		match self.rng.gen_range(0..10) {
			0..=3 => self.scalar(),
			4 => self.object(depth),
			5 => {
				// Reuse an existing object
				let existing = self.objects.choose(&mut self.rng).cloned();
				match existing {
					Some(object) => object,
					None => self.object(depth),
				}
			}
			6 => {
				let len = self.rng.gen_range(0..4);
				Value::array((0..len).map(|_| self.value(depth + 1)).collect())
			}
			7 => {
				let len = self.rng.gen_range(0..3);
				let entries = (0..len)
					.map(|index| {
						let key = if index % 2 == 0 {
							Value::string(format!("k{}", index))
						} else {
							self.value(depth + 1)
						};
						(key, self.value(depth + 1))
					})
					.collect();
				Value::map(entries)
			}
			8 => {
				let len = self.rng.gen_range(0..3);
				Value::set((0..len).map(|index| Value::Number(index as f64)).collect())
			}
			_ => self.special(),
		}
	}

	fn object(&mut self, depth: usize) -> Value {
		let type_name = *TYPE_NAMES.choose(&mut self.rng).unwrap();
		let object = Value::object(type_name, Vec::<(String, Value)>::new());
		self.objects.push(object.clone());

		let num_fields = self.rng.gen_range(1..5);
		for _ in 0..num_fields {
			let key = *KEYS.choose(&mut self.rng).unwrap();
			let value = self.value(depth + 1);
			object.insert(key, value);
		}
		object
	}

	fn scalar(&mut self) -> Value {
		match self.rng.gen_range(0..6) {
			0 => Value::Null,
			1 => Value::Undefined,
			2 => Value::Bool(self.rng.gen()),
			3 => Value::Number(self.rng.gen_range(-1000.0..1000.0)),
			4 => Value::Number(f64::NAN),
			_ => Value::string(format!("s{}", self.rng.gen::<u16>())),
		}
	}

	fn special(&mut self) -> Value {
		match self.rng.gen_range(0..4) {
			0 => Value::bigint(BigInt::from(self.rng.gen::<i64>()) * BigInt::from(u64::MAX)),
			1 => {
				let millis = self.rng.gen_range(0..4_000_000_000_000i64);
				Value::date(Utc.timestamp_millis_opt(millis).unwrap())
			}
			2 => Value::pattern("^a+b*$", "gi"),
			_ => Value::error("TypeError", "bad input"),
		}
	}
}
