use crate::Value;

/// Trait for types which can be converted into a [`Value`] for snapshotting.
///
/// Can be derived with `#[derive(ToValue)]`. Structs become records tagged with
/// the struct's name.
pub trait ToValue {
	fn to_value(&self) -> Value;
}

/// Trait for use with `#[value_with]`, to convert foreign types which don't
/// implement `ToValue`.
///
/// ```
/// use ser_snapshot::{ToValue, ToValueWith, Value};
/// use std::net::Ipv4Addr;
///
/// struct IpProxy;
/// impl ToValueWith<Ipv4Addr> for IpProxy {
/// 	fn to_value_with(ip: &Ipv4Addr) -> Value {
/// 		Value::string(ip.to_string())
/// 	}
/// }
///
/// #[derive(ToValue)]
/// struct Server {
/// 	#[value_with(IpProxy)]
/// 	ip: Ipv4Addr,
/// }
///
/// let value = Server { ip: Ipv4Addr::LOCALHOST }.to_value();
/// assert_eq!(value.get("ip").unwrap().as_str(), Some("127.0.0.1"));
/// ```
pub trait ToValueWith<T: ?Sized> {
	fn to_value_with(t: &T) -> Value;
}
