/// Section update payloads.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The shape of an update decides how it is applied: ordered sequences
/// replace the section, mappings are merged into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionData {
    Replace(Vec<Value>),
    Merge(Map<String, Value>),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("section data must be an array or an object, got {found}")]
pub struct UnsupportedSectionData {
    pub found: &'static str,
}

impl TryFrom<Value> for SectionData {
    type Error = UnsupportedSectionData;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(Self::Replace(items)),
            Value::Object(fields) => Ok(Self::Merge(fields)),
            Value::Null => Err(UnsupportedSectionData { found: "null" }),
            Value::Bool(_) => Err(UnsupportedSectionData { found: "a boolean" }),
            Value::Number(_) => Err(UnsupportedSectionData { found: "a number" }),
            Value::String(_) => Err(UnsupportedSectionData { found: "a string" }),
        }
    }
}

impl From<Vec<Value>> for SectionData {
    fn from(items: Vec<Value>) -> Self {
        Self::Replace(items)
    }
}

impl From<Map<String, Value>> for SectionData {
    fn from(fields: Map<String, Value>) -> Self {
        Self::Merge(fields)
    }
}

impl SectionData {
    /// Build an update from any serializable value, e.g. a typed section
    /// struct or a `Vec` of them.
    pub fn from_serializable<T: Serialize>(data: &T) -> Result<Self, SectionDataError> {
        let value = serde_json::to_value(data)?;
        Ok(Self::try_from(value)?)
    }
}

#[derive(Debug, Error)]
pub enum SectionDataError {
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedSectionData),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::model::{Hero, Stat};

    #[test]
    fn shape_selects_strategy() {
        assert!(matches!(
            SectionData::try_from(json!([1, 2])),
            Ok(SectionData::Replace(items)) if items.len() == 2
        ));
        assert!(matches!(
            SectionData::try_from(json!({ "title": "x" })),
            Ok(SectionData::Merge(_))
        ));
        assert_eq!(
            SectionData::try_from(json!("hero")),
            Err(UnsupportedSectionData { found: "a string" })
        );
    }

    #[test]
    fn typed_sections_convert() {
        let stats = vec![Stat {
            number: "10".to_string(),
            label: "Tours".to_string(),
        }];
        assert!(matches!(
            SectionData::from_serializable(&stats).unwrap(),
            SectionData::Replace(_)
        ));
        assert!(matches!(
            SectionData::from_serializable(&Hero::default()).unwrap(),
            SectionData::Merge(_)
        ));
    }
}
