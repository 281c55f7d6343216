//! Client-side cache for the plain-word vocabulary notebook service.
//!
//! Wordbooks hold chapters, chapters hold words, words carry tags. The
//! [`NotebookCache`] mirrors those collections locally and keeps the mirrors
//! consistent with the service through a [`Gateway`]; [`view`] derives the
//! filtered and shuffled word lists shown to the user.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod preferences;
pub mod session;
pub mod view;

pub use cache::NotebookCache;
pub use config::ClientConfig;
pub use error::{ErrorKind, RemoteError, RemoteResult};
pub use gateway::{Gateway, HttpGateway, Method};
pub use preferences::{FileStorage, LocalStorage, Locale, MemoryStorage, Preferences};
pub use session::SessionGuard;
