pub mod section_id;
pub mod style;
pub mod types;
pub mod updates;

pub use section_id::SectionId;
pub use style::StyleToken;
pub use types::{ScrollState, Section};
pub use updates::NavUpdate;
