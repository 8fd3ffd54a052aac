use crate::config::Config;
use crate::pages::{AdminPanel, ParentPanel, StudentPanel, TeacherPanel};
use aulanet_auth::{AuthFlow, RedirectMap};
use aulanet_backend::{Backend, HostedBackend};
use aulanet_notify::{Notifier, TermNotifier};
use std::sync::Arc;

/// The whole client wired together: one auth flow serving every panel's
/// login and registration, plus one controller per panel, all sharing the
/// same backend.
pub struct Portal<B, N> {
    pub flow: AuthFlow<B, N>,
    pub student: StudentPanel<B>,
    pub teacher: TeacherPanel<B>,
    pub parent: ParentPanel<B>,
    pub admin: AdminPanel<B>,
}

impl<B: Backend, N: Notifier> Portal<B, N> {
    pub fn new(backend: Arc<B>, notifier: N, redirects: RedirectMap) -> Self {
        Self {
            flow: AuthFlow::new(backend.clone(), notifier, redirects),
            student: StudentPanel::new(backend.clone()),
            teacher: TeacherPanel::new(backend.clone()),
            parent: ParentPanel::new(backend.clone()),
            admin: AdminPanel::new(backend),
        }
    }
}

impl Portal<HostedBackend, TermNotifier> {
    /// Client against the deployment named in the config. Call
    /// [`Config::validate`] first; construction only fails on an
    /// unparseable URL.
    pub fn hosted(config: &Config) -> anyhow::Result<Self> {
        let backend = HostedBackend::new(
            &config.backend.url,
            config.backend.anon_key.clone(),
            config.backend.timeout(),
        )?;
        Ok(Self::new(
            Arc::new(backend),
            TermNotifier,
            config.redirect_map(),
        ))
    }
}
