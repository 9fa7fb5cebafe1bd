pub mod entity;
pub mod invariants;

pub use entity::{ActivityInfo, AppSelectionHistory, DisplayActivityInfo, PreferredApp};
pub use invariants::{validate_app_selection_history, validate_preferred_app};
