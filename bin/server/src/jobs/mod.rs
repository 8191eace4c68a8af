//! Background jobs: the catalog sync and the notification dispatch
//! that follows it.

pub mod notify;
pub mod sync;

pub use notify::Notifier;
pub use sync::CatalogSync;
