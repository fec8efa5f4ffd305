use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::export::{DownloadArea, Exporter};
use crate::http::ApiClient;
use crate::navigation::{guard, Navigator, Route, ViewState};
use crate::session::{FileTokenStore, SessionStore, TokenStore};

/// Everything a front end needs, wired once and passed around explicitly.
#[derive(Debug, Clone)]
pub struct App {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub view: Arc<ViewState>,
    pub client: ApiClient,
}

impl App {
    /// Wire the app with the token persisted at the configured path.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let tokens = FileTokenStore::new(config.token_path());
        Self::with_token_store(config, tokens)
    }

    pub fn with_token_store(config: ClientConfig, tokens: impl TokenStore + 'static) -> Result<Self> {
        let session = Arc::new(SessionStore::new(tokens));
        let view = Arc::new(ViewState::default());
        let client = ApiClient::new(&config, session.clone(), view.clone())?;
        Ok(Self {
            config,
            session,
            view,
            client,
        })
    }

    /// Restore the persisted session and move the view to where the guard
    /// allows.
    pub async fn start(&self, requested: Route) -> Route {
        self.session.load(&self.client).await;
        let landed = guard(requested, self.session.snapshot().is_authenticated());
        self.view.navigate(landed);
        landed
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(
            self.client.clone(),
            DownloadArea::new(self.config.download_dir()),
        )
    }
}
