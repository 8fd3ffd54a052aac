//! Shared setup for the panel integration tests
//!
//! Every test starts from the seeded demo world: one account per role, a
//! pending docente application, and rows in every table.

#![allow(dead_code)]

use aulanet::Portal;
use aulanet::demo::{self, DEMO_PASSWORD, DemoWorld};
use aulanet_auth::{SignInInput, SignInOutcome};
use aulanet_backend::MemoryBackend;
use aulanet_notify::BufferNotifier;
use aulanet_shared::Role;
use std::sync::Arc;

pub struct TestPortal {
    pub portal: Portal<MemoryBackend, BufferNotifier>,
    pub backend: Arc<MemoryBackend>,
    pub notices: BufferNotifier,
    pub world: DemoWorld,
}

pub async fn seeded_portal() -> TestPortal {
    let (portal, backend, notices) = aulanet::create_memory_portal();
    let world = demo::seed(&backend).await.expect("seed demo world");
    notices.clear();
    TestPortal {
        portal,
        backend,
        notices,
        world,
    }
}

impl TestPortal {
    /// Signs in with the shared demo password and asserts the attempt was
    /// routed, because a test that continues unauthenticated would fail
    /// later in a misleading place.
    pub async fn sign_in(&self, email: &str, panel: Role) {
        let outcome = self
            .portal
            .flow
            .sign_in(SignInInput {
                email: email.to_string(),
                password: DEMO_PASSWORD.to_string(),
                intended_role: panel,
            })
            .await;
        assert!(
            matches!(outcome, SignInOutcome::Redirect { .. }),
            "expected {email} to reach the {panel} panel, got {outcome:?}"
        );
        self.notices.clear();
    }

    pub async fn try_sign_in(&self, email: &str, panel: Role) -> SignInOutcome {
        self.portal
            .flow
            .sign_in(SignInInput {
                email: email.to_string(),
                password: DEMO_PASSWORD.to_string(),
                intended_role: panel,
            })
            .await
    }
}
