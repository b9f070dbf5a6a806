/// Build an object [`Value`](crate::Value).
///
/// Values are converted with [`ToValue`](crate::ToValue), so anything
/// implementing it can be used, including other `Value`s (which keeps their
/// identity).
///
/// The following input variations can be used:
///
/// ```
/// use ser_snapshot::object;
///
/// // Plain object
/// let point = object! { "x" => 1, "y" => 2 };
/// // Class-tagged object
/// let user = object!("User"; "name" => "Ann", "location" => point.clone());
/// // Empty
/// let empty = object! {};
///
/// assert_eq!(user.type_name(), "User");
/// assert!(user.get("location").unwrap().ptr_eq(&point));
/// # let _ = empty;
/// ```
#[macro_export]
macro_rules! object {
	// `object!("User"; "name" => "Ann")`
	($type_name:literal; $($key:expr => $value:expr),* $(,)?) => {{
		let fields: ::std::vec::Vec<(::std::string::String, $crate::Value)> = ::std::vec![$((
			::std::string::String::from($key),
			$crate::ToValue::to_value(&$value),
		)),*];
		$crate::Value::object($type_name, fields)
	}};

	// `object! { "name" => "Ann" }`
	($($key:expr => $value:expr),* $(,)?) => {
		$crate::object!("Object"; $($key => $value),*)
	};
}

/// Build an array [`Value`](crate::Value). Elements are converted with
/// [`ToValue`](crate::ToValue).
///
/// ```
/// use ser_snapshot::array;
///
/// let list = array![1, "two", 3.5];
/// assert_eq!(list.index(1).unwrap().as_str(), Some("two"));
/// ```
#[macro_export]
macro_rules! array {
	($($value:expr),* $(,)?) => {
		$crate::Value::array(::std::vec![$($crate::ToValue::to_value(&$value)),*])
	};
}
