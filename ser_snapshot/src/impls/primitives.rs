use std::num;

use num_bigint::BigInt;

use crate::{ToValue, Value};

macro_rules! impl_number {
	($ty:ty) => {
		impl ToValue for $ty {
			#[inline]
			fn to_value(&self) -> Value {
				Value::Number(*self as f64)
			}
		}
	};
}

impl_number!(u8);
impl_number!(u16);
impl_number!(u32);
impl_number!(u64);
impl_number!(usize);

impl_number!(i8);
impl_number!(i16);
impl_number!(i32);
impl_number!(i64);
impl_number!(isize);

impl_number!(f32);
impl_number!(f64);

// Too wide for a double without losing precision
macro_rules! impl_big {
	($ty:ty) => {
		impl ToValue for $ty {
			#[inline]
			fn to_value(&self) -> Value {
				Value::BigInt(BigInt::from(*self))
			}
		}
	};
}

impl_big!(u128);
impl_big!(i128);

macro_rules! impl_non_zero {
	($ty:ty) => {
		impl ToValue for $ty {
			#[inline]
			fn to_value(&self) -> Value {
				self.get().to_value()
			}
		}
	};
}

impl_non_zero!(num::NonZeroU8);
impl_non_zero!(num::NonZeroU16);
impl_non_zero!(num::NonZeroU32);
impl_non_zero!(num::NonZeroU64);
impl_non_zero!(num::NonZeroU128);
impl_non_zero!(num::NonZeroUsize);

impl_non_zero!(num::NonZeroI8);
impl_non_zero!(num::NonZeroI16);
impl_non_zero!(num::NonZeroI32);
impl_non_zero!(num::NonZeroI64);
impl_non_zero!(num::NonZeroI128);
impl_non_zero!(num::NonZeroIsize);

impl ToValue for bool {
	#[inline]
	fn to_value(&self) -> Value {
		Value::Bool(*self)
	}
}

impl ToValue for char {
	fn to_value(&self) -> Value {
		Value::String(self.to_string())
	}
}

impl ToValue for str {
	fn to_value(&self) -> Value {
		Value::String(self.to_string())
	}
}

impl ToValue for String {
	fn to_value(&self) -> Value {
		Value::String(self.clone())
	}
}

impl ToValue for () {
	#[inline]
	fn to_value(&self) -> Value {
		Value::Null
	}
}
