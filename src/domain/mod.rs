pub mod lead;
pub mod profile;
