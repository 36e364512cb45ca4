/// Section name validation for the update API.
use thiserror::Error;

use super::model::is_provenance_key;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionNameError {
    #[error("section name cannot be empty")]
    Empty,
    #[error("section `{0}` is write provenance and cannot be edited")]
    Reserved(String),
}

/// Validate that `name` addresses an editable top-level section.
pub fn validate_section_name(name: &str) -> Result<(), SectionNameError> {
    if name.trim().is_empty() {
        return Err(SectionNameError::Empty);
    }
    if is_provenance_key(name) {
        return Err(SectionNameError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_and_custom_sections() {
        assert!(validate_section_name("hero").is_ok());
        assert!(validate_section_name("testimonials").is_ok());
    }

    #[test]
    fn rejects_empty_and_provenance_names() {
        assert_eq!(validate_section_name(" "), Err(SectionNameError::Empty));
        assert_eq!(
            validate_section_name("lastUpdated"),
            Err(SectionNameError::Reserved("lastUpdated".to_string()))
        );
        assert!(validate_section_name("ownerUid").is_err());
    }
}
