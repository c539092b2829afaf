use crate::errors;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r#"^[A-Za-z_][A-Za-z0-9_]*$"#).unwrap();
}

/// Validates a table, column or database name against the identifier regex.
///
/// # Arguments
/// * `name` - The name to validate.
///
/// # Returns
/// A `Result` containing the validated name or an `errors::Error`.
pub fn validate_identifier(name: &str) -> Result<String, errors::Error> {
    if name.is_empty() {
        return Err(errors::Error::Syntax("Name cannot be empty.".to_owned()));
    }
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(errors::Error::Syntax(format!(
            "Name ({}) must match regex {}.",
            name,
            IDENTIFIER_REGEX.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert_eq!(validate_identifier("products").unwrap(), "products");
        assert_eq!(validate_identifier("_id").unwrap(), "_id");
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("9lives").is_err());
        assert!(validate_identifier("../etc").is_err());
    }
}
