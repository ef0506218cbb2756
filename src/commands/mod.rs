pub mod inventory;
pub mod process;
pub mod status;
pub mod structure;
