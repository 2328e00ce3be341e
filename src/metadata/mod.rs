//! Read-only clients for the external metadata services.
//!
//! Both clients are constructed once at startup and handed to the server
//! through its state; neither retries nor caches.

pub mod open_library;
pub mod wikipedia;

pub use open_library::{BookLookupResult, OpenLibraryClient};
pub use wikipedia::{Biography, WikipediaClient};
