pub mod directory;
pub mod file_lock;
pub mod layout;
pub mod manifest;
pub mod segment;
