
pub mod address;
pub mod cell;
pub mod db;
pub mod document;
pub mod memory;
pub mod plugin;

pub use address::*;
pub use cell::*;
pub use db::*;
pub use document::*;
pub use memory::*;
pub use plugin::*;
