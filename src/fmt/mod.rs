#[cfg(feature = "json")]
pub mod json;
pub mod line;
pub mod text;
