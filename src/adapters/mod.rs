//! External integrations.
//!
//! Only one collaborator lives here: the patient directory. Persistence is
//! in-memory and owned by the engines, so there is no database adapter.

pub mod directory;

pub use directory::{DirectoryLookup, HttpDirectoryClient, NameResolver, Person, UNKNOWN_NAME};
