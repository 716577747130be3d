pub mod base_storage;
pub mod file_storage;
pub mod preferences;
