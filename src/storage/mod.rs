// Flat-file persistence shared by every store

mod json_store;
pub mod timestamp;

pub use json_store::JsonStore;
