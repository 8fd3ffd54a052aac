pub mod config;
pub mod demo;
pub mod observability;
pub mod pages;
pub mod portal;
pub mod queries;

pub use config::Config;
pub use portal::Portal;

use aulanet_auth::RedirectMap;
use aulanet_backend::MemoryBackend;
use aulanet_notify::BufferNotifier;
use std::sync::Arc;

/// Portal wired to a fresh in-memory backend.
///
/// Integration tests and the offline demo both start here: the returned
/// backend handle seeds rows and inspects state, the notifier captures
/// what the user would have seen.
pub fn create_memory_portal() -> (
    Portal<MemoryBackend, BufferNotifier>,
    Arc<MemoryBackend>,
    BufferNotifier,
) {
    let backend = Arc::new(MemoryBackend::new());
    let notices = BufferNotifier::new();
    let portal = Portal::new(backend.clone(), notices.clone(), RedirectMap::default());
    (portal, backend, notices)
}
