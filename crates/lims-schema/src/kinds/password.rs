//! Password fields: a `new`/`confirm` pair stored as a one-way digest.

use lims_core::errors::CoreError;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::field::{FieldSpec, Parsed};
use crate::request::{RequestValues, normalize};

/// SHA-256 hex digest of a password. Always 64 characters.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub(crate) fn parse(field: &FieldSpec, values: &RequestValues) -> Result<Parsed, CoreError> {
    let new = values
        .first(&format!("new_{}", field.name))
        .and_then(normalize);
    let confirm = values
        .first(&format!("confirm_{}", field.name))
        .and_then(normalize);
    let (new, confirm) = match (new, confirm) {
        (None, None) => return Ok(Parsed::Absent),
        (None, Some(_)) if field.required => {
            return Err(CoreError::invalid(field.name, "new value is missing"));
        }
        (None, Some(_)) => return Ok(Parsed::Provided(Value::Null)),
        (Some(new), confirm) => (new, confirm),
    };
    if confirm.as_deref() != Some(new.as_str()) {
        return Err(CoreError::invalid(
            field.name,
            "new and confirm values do not match",
        ));
    }
    Ok(Parsed::Provided(Value::String(hash_password(&new))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn field() -> FieldSpec {
        FieldSpec::new("password", FieldKind::Password).required()
    }

    #[test]
    fn mismatch_is_rejected() {
        let values = RequestValues::new()
            .with("new_password", "secret1")
            .with("confirm_password", "secret2");
        let error = parse(&field(), &values).unwrap_err();
        assert!(error.to_string().contains("do not match"));
    }

    #[test]
    fn match_stores_fixed_length_digest() {
        let values = RequestValues::new()
            .with("new_password", "secret1")
            .with("confirm_password", "secret1");
        let Parsed::Provided(Value::String(digest)) = parse(&field(), &values).unwrap() else {
            panic!("expected a digest");
        };
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, "secret1");
        assert_eq!(digest, hash_password("secret1"));
    }

    #[test]
    fn missing_new_on_required_field() {
        let values = RequestValues::new().with("confirm_password", "secret1");
        assert!(parse(&field(), &values).is_err());
    }

    #[test]
    fn blank_pair_is_absent() {
        let values = RequestValues::new()
            .with("new_password", " ")
            .with("confirm_password", "");
        assert_eq!(parse(&field(), &values).unwrap(), Parsed::Absent);
    }
}
