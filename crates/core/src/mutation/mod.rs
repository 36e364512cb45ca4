pub mod merge;
pub mod types;

pub use merge::apply_section_update;
pub use types::{SectionData, SectionDataError, UnsupportedSectionData};
