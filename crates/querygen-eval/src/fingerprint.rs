//! Cache fingerprints.
//!
//! A fingerprint identifies an evaluator request by the expression source,
//! the projection type, the argument types and the runtime types of the
//! constants. Constant values do not take part, so requests differing only
//! in literal values share one compiled unit.

use indexmap::IndexMap;
use querygen_core::Type;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{EvalError, Result};
use crate::value::Value;

/// Prefix making every fingerprint a valid class name.
pub const PREFIX: &str = "Q";

/// Computes the fingerprint of a request.
///
/// # Errors
///
/// Returns [`EvalError::NullConstant`] for a null constant, which has no
/// runtime type.
pub fn fingerprint(
    source: &str,
    projection: &Type,
    types: &[Type],
    constants: &IndexMap<String, Value>,
) -> Result<String> {
    let mut id = String::from(PREFIX);
    push_hash(&mut id, source);
    push_hash(&mut id, projection.full_name());
    for ty in types {
        push_hash(&mut id, ty.full_name());
    }
    for (name, value) in constants {
        let ty = value
            .runtime_type()
            .ok_or_else(|| EvalError::NullConstant { name: name.clone() })?;
        push_hash(&mut id, ty.full_name());
    }
    Ok(id)
}

fn push_hash(id: &mut String, text: &str) {
    let hash = xxh3_64(text.as_bytes()) as i64;
    id.push('_');
    id.push_str(&hash.to_string().replace('-', "0"));
}
