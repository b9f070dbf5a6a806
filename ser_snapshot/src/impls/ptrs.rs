use std::{rc::Rc, sync::Arc};

use crate::{ToValue, Value};

impl<T: ToValue + ?Sized> ToValue for &T {
	#[inline]
	fn to_value(&self) -> Value {
		(**self).to_value()
	}
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
	#[inline]
	fn to_value(&self) -> Value {
		(**self).to_value()
	}
}

// NB: Each conversion produces new containers, so two `Rc`s to the same value
// are not the same object once converted. Use `Value` handles directly where
// identity matters.
impl<T: ToValue + ?Sized> ToValue for Rc<T> {
	#[inline]
	fn to_value(&self) -> Value {
		(**self).to_value()
	}
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
	#[inline]
	fn to_value(&self) -> Value {
		(**self).to_value()
	}
}

impl<T: ToValue> ToValue for Option<T> {
	fn to_value(&self) -> Value {
		match self {
			Some(value) => value.to_value(),
			None => Value::Null,
		}
	}
}

impl<T: ToValue> ToValue for [T] {
	fn to_value(&self) -> Value {
		Value::array(self.iter().map(ToValue::to_value).collect())
	}
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
	fn to_value(&self) -> Value {
		self.as_slice().to_value()
	}
}

impl<T: ToValue> ToValue for Vec<T> {
	fn to_value(&self) -> Value {
		self.as_slice().to_value()
	}
}
