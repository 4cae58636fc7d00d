pub mod gating;
pub mod privileges;
pub mod stages;
pub mod validation;

pub use stages::Stage;
