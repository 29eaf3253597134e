//! Root application state

use std::sync::Arc;

use auth::{Identity, SessionManager, SessionState};
use catalog::{ImageUploader, ProductRepository, ProductStore, ProductsScreen};
use common::error::AppResult;
use tracing::{info, warn};

use crate::login::LoginScreen;

/// Data store and image storage shared by every products screen
#[derive(Clone)]
pub struct Backends {
    pub repository: Arc<dyn ProductRepository>,
    pub uploader: ImageUploader,
}

/// Screen shown for the current session
pub enum View {
    Loading,
    Login(LoginScreen),
    Products(ProductsScreen),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Loading => "loading",
            View::Login(_) => "login",
            View::Products(_) => "products",
        }
    }
}

pub struct App {
    session: Arc<SessionManager>,
    backends: Backends,
    view: View,
}

impl App {
    pub fn new(session: Arc<SessionManager>, backends: Backends) -> Self {
        Self {
            session,
            backends,
            view: View::Loading,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Resolve the startup session and show the matching screen
    ///
    /// A failed session check ends on the login screen with the error
    /// logged.
    pub async fn start(&mut self) -> &View {
        if let Err(e) = self.session.check_initial_session().await {
            warn!("Starting without a session: {}", e);
        }
        self.sync().await
    }

    /// Bring the view in line with the session state
    pub async fn sync(&mut self) -> &View {
        match self.session.current() {
            SessionState::Unknown => {
                if !matches!(self.view, View::Loading) {
                    self.view = View::Loading;
                }
            }
            SessionState::Unauthenticated => {
                if !matches!(self.view, View::Login(_)) {
                    info!("Showing login");
                    self.view = View::Login(LoginScreen::new(Arc::clone(&self.session)));
                }
            }
            SessionState::Authenticated(identity) => {
                let current_owner = match &self.view {
                    View::Products(screen) => Some(screen.store().owner().id),
                    _ => None,
                };
                if current_owner != Some(identity.id) {
                    self.view = View::Products(self.open_products(identity).await);
                }
            }
        }
        &self.view
    }

    /// Sign out and return to the login screen
    pub async fn sign_out(&mut self) -> AppResult<()> {
        let result = self.session.sign_out().await;
        self.sync().await;
        result
    }

    async fn open_products(&self, owner: Identity) -> ProductsScreen {
        info!("Opening products for {}", owner.id);
        let store = ProductStore::new(
            owner,
            Arc::clone(&self.backends.repository),
            self.backends.uploader.clone(),
        );
        let mut screen = ProductsScreen::new(Arc::new(store));
        screen.load().await;
        screen
    }
}
