// Member directory
//
// Notes, known display names and alternate accounts, keyed by the canonical
// username an alias resolves to.

pub mod directory;

pub use directory::{MemberDirectory, MemberError, MemberRecord};
