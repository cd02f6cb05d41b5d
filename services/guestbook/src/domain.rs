// Domain layer modules
pub mod guest_entry;
pub mod route;

// Re-exports
pub use guest_entry::{GuestEntry, GuestEntryError};
pub use route::Route;
