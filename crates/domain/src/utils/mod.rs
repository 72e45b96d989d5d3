//! Pure helpers shared by the domain types

pub mod serde;
pub mod version;
