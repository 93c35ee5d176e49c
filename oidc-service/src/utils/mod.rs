pub mod redirects;
pub mod validation;

pub use validation::{ValidatedForm, ValidatedJson};
