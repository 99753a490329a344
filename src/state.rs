use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::database::DrinkStore;

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn DrinkStore>, verifier: Arc<TokenVerifier>) -> Self {
        Self { store, verifier }
    }
}
