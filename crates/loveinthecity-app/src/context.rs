//! Application context.
//!
//! [`AppContext`] is the explicit dependency container replacing
//! module-level singletons: one constructed [`StorageManager`], one
//! [`ProfileManager`], and one [`DeepLinkRouter`] per process, wired
//! together here and handed to consumers. The router never reads storage
//! itself; this context pushes the authentication flag and user context
//! into it.

use std::sync::Arc;

use tracing::info;

use loveinthecity_deeplink::{CurrentUser, DeepLinkRouter, RouterConfig};
use loveinthecity_store::{ProfileManager, ProfileUpdate, StorageManager, UserProfile, keys};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::signup::{SignupData, SignupError, build_profile, build_snapshot};

/// Process-wide application state: storage, profiles, and routing.
pub struct AppContext {
    storage: Arc<StorageManager>,
    profiles: ProfileManager,
    router: DeepLinkRouter,
}

impl AppContext {
    /// Construct and bootstrap the context from `config`.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let storage = Arc::new(match &config.db_path {
            Some(path) => StorageManager::open(path)?,
            None => StorageManager::in_memory(),
        });
        let profiles = ProfileManager::new(Arc::clone(&storage));
        let router = DeepLinkRouter::new(RouterConfig {
            origin: config.origin,
            support_chat_url: config.support_chat_url,
        });

        let mut context = Self {
            storage,
            profiles,
            router,
        };
        context.bootstrap();
        Ok(context)
    }

    /// Read the session predicate and push auth state plus user context
    /// into the router. Safe to call again after external storage changes.
    pub fn bootstrap(&mut self) {
        let authenticated = self.profiles.is_authenticated();
        self.router.set_authenticated(authenticated);
        self.router
            .set_current_user(self.profiles.profile().map(current_user_from_profile));
        info!(authenticated, "application context ready");
    }

    // ── accessors ────────────────────────────────────────────────────

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    pub fn profiles(&self) -> &ProfileManager {
        &self.profiles
    }

    pub fn router(&self) -> &DeepLinkRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut DeepLinkRouter {
        &mut self.router
    }

    /// The session predicate: a session record exists and its flag is set.
    pub fn is_authenticated(&self) -> bool {
        self.profiles.is_authenticated()
    }

    // ── account flows ────────────────────────────────────────────────

    /// Log in: create/update the profile, open a session, write the login
    /// marker, and flip the router's gate. Returns `None` when the session
    /// record could not be written.
    pub fn login(&mut self, update: ProfileUpdate) -> Option<UserProfile> {
        let profile = self.profiles.create_or_update(update);
        self.profiles.login()?;

        let token = format!("mock_jwt_token_{}", self.storage.clock().now_millis());
        self.storage.set(keys::AUTH_TOKEN, &token, None);

        self.router.set_authenticated(true);
        self.router
            .set_current_user(Some(current_user_from_profile(profile.clone())));
        info!(id = %profile.id, "logged in");
        Some(profile)
    }

    /// Log out: drop the login marker, close the session (which clears the
    /// profile), and flip the router's gate off.
    pub fn logout(&mut self) -> bool {
        let token_removed = self.storage.remove(keys::AUTH_TOKEN);
        let session_closed = self.profiles.logout();

        self.router.set_authenticated(false);
        self.router.set_current_user(None);
        info!("logged out");
        token_removed && session_closed
    }

    /// Create an account: validate, persist the profile / token / support
    /// snapshot, open the session, and authenticate the router.
    pub fn signup(&mut self, data: SignupData) -> Result<UserProfile, SignupError> {
        data.validate()?;

        let profile = build_profile(&data, self.storage.clock());
        if !self.profiles.store_profile(&profile) {
            return Err(SignupError::Persistence);
        }

        let token = format!("mock_jwt_token_{}", self.storage.clock().now_millis());
        self.storage.set(keys::AUTH_TOKEN, &token, None);

        let snapshot = build_snapshot(&data, &profile, self.storage.clock());
        self.storage.set(keys::SUPPORT_DATA, &snapshot, None);

        self.profiles.login().ok_or(SignupError::Persistence)?;

        self.router.set_authenticated(true);
        self.router
            .set_current_user(Some(current_user_from_signup(&data, &profile)));
        info!(id = %profile.id, name = %profile.name, "account created");
        Ok(profile)
    }

    /// Resolve a deep link through the router.
    pub fn resolve_link(&mut self, url: &str) -> String {
        self.router.handle_deep_link(url)
    }
}

/// Project the stored profile into the router's support context.
fn current_user_from_profile(profile: UserProfile) -> CurrentUser {
    let email = (!profile.email.is_empty()).then_some(profile.email);
    let phone = (!profile.phone.is_empty()).then_some(profile.phone);
    CurrentUser {
        id: Some(profile.id),
        name: Some(profile.name),
        email,
        phone,
        residence: profile.preferences.location,
        tags: profile.preferences.interests,
        created_at: Some(profile.created_at),
        ..CurrentUser::default()
    }
}

/// Like [`current_user_from_profile`], enriched with the signup-only
/// fields (age, city, state).
fn current_user_from_signup(data: &SignupData, profile: &UserProfile) -> CurrentUser {
    CurrentUser {
        age: Some(data.age),
        city: Some(data.city.clone()),
        state: Some(data.state.clone()),
        ..current_user_from_profile(profile.clone())
    }
}
