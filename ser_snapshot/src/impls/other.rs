use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use num_bigint::{BigInt, BigUint};

use crate::{ToValue, Value};

// Handle clone, so identity is preserved
impl ToValue for Value {
	#[inline]
	fn to_value(&self) -> Value {
		self.clone()
	}
}

impl ToValue for BigInt {
	fn to_value(&self) -> Value {
		Value::BigInt(self.clone())
	}
}

impl ToValue for BigUint {
	fn to_value(&self) -> Value {
		Value::BigInt(BigInt::from(self.clone()))
	}
}

impl ToValue for DateTime<Utc> {
	#[inline]
	fn to_value(&self) -> Value {
		Value::Date(*self)
	}
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
	fn to_value(&self) -> Value {
		Value::map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
	}
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
	fn to_value(&self) -> Value {
		Value::map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
	}
}

impl<T: ToValue, S> ToValue for HashSet<T, S> {
	fn to_value(&self) -> Value {
		Value::set(self.iter().map(ToValue::to_value).collect())
	}
}

impl<T: ToValue> ToValue for BTreeSet<T> {
	fn to_value(&self) -> Value {
		Value::set(self.iter().map(ToValue::to_value).collect())
	}
}

macro_rules! impl_tuple {
	($($name:ident: $index:tt),+) => {
		impl<$($name: ToValue),+> ToValue for ($($name,)+) {
			fn to_value(&self) -> Value {
				Value::array(vec![$(self.$index.to_value()),+])
			}
		}
	};
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
