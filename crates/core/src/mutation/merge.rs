use serde_json::{Map, Value};

use super::types::SectionData;
use crate::document::SiteConfig;

/// Apply `data` to the named section of `config`.
///
/// `Replace` stores the array as-is, including an empty one. `Merge` keeps
/// every previous key that `data` does not name; a previous value that is
/// missing or not an object merges as if it were `{}`.
pub fn apply_section_update(config: &mut SiteConfig, section: &str, data: SectionData) {
    let next = match data {
        SectionData::Replace(items) => Value::Array(items),
        SectionData::Merge(fields) => {
            let mut merged = match config.sections.remove(section) {
                Some(Value::Object(previous)) => previous,
                _ => Map::new(),
            };
            merged.extend(fields);
            Value::Object(merged)
        }
    };
    config.sections.insert(section.to_string(), next);
}
