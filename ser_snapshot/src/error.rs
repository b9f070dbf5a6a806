/// Errors which abort a call.
///
/// Almost everything the engine meets is recovered locally (inline markers,
/// placeholders, generic containers). These are the cases where carrying on
/// would silently produce wrong data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A `BigInt` marker's payload is not a valid integer.
	#[error("Invalid BigInt payload: {payload:?}")]
	InvalidBigInt { payload: String },

	/// Snapshot wire form could not be parsed as JSON.
	#[error("Invalid snapshot JSON: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
