//! Integration tests for the loveinthecity-app crate.
//!
//! These drive the full user journey through the context: signup, gated
//! deep-link resolution, support requests, logout, and persistence of the
//! whole flow across a restart (on-disk SQLite via tempfile).

use loveinthecity_app::{AppConfig, AppContext, SignupData, SignupError};
use loveinthecity_store::{UserSession, keys};

fn signup_data() -> SignupData {
    SignupData {
        name: "Kira".to_string(),
        age: 31,
        phone: "(555) 867-5309".to_string(),
        city: "Chicago".to_string(),
        state: "Illinois".to_string(),
        password: "letmein".to_string(),
    }
}

#[test]
fn signup_authenticates_and_persists_the_record_set() {
    let mut ctx = AppContext::new(AppConfig::default()).unwrap();
    assert!(!ctx.is_authenticated());
    assert_eq!(ctx.resolve_link("/#/vip"), "/login");

    let profile = ctx.signup(signup_data()).unwrap();
    assert!(profile.id.starts_with("USER-"));
    assert!(ctx.is_authenticated());

    // All four records went through the canonical store.
    assert!(ctx.storage().has(keys::USER_PROFILE));
    assert!(ctx.storage().has(keys::USER_SESSION));
    assert!(ctx.storage().has(keys::AUTH_TOKEN));
    assert!(ctx.storage().has(keys::SUPPORT_DATA));

    let token: String = ctx.storage().get(keys::AUTH_TOKEN).unwrap();
    assert!(token.starts_with("mock_jwt_token_"));

    let session: UserSession = ctx.storage().get(keys::USER_SESSION).unwrap();
    assert!(session.is_authenticated);

    // Gated routes now resolve.
    assert_eq!(ctx.resolve_link("/#/vip"), "/vip");
    assert_eq!(ctx.resolve_link("/#/user/42"), "/user/42");
}

#[test]
fn invalid_signup_leaves_no_trace() {
    let mut ctx = AppContext::new(AppConfig::default()).unwrap();

    let mut data = signup_data();
    data.age = 16;
    assert_eq!(ctx.signup(data), Err(SignupError::AgeOutOfRange));

    assert!(!ctx.is_authenticated());
    assert!(ctx.storage().keys().is_empty());
    assert_eq!(ctx.resolve_link("/#/home"), "/login");
}

#[test]
fn signup_enables_support_requests_with_user_context() {
    let mut ctx = AppContext::new(AppConfig::default()).unwrap();

    // Without a profile the support handler drops the request.
    ctx.resolve_link("/#/support/vip");
    assert!(ctx.router().support_log().is_empty());

    let profile = ctx.signup(signup_data()).unwrap();
    ctx.resolve_link("/#/support/vip");

    let log = ctx.router().support_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user_id, profile.id);
    assert_eq!(log[0].user_name, "Kira");
    assert_eq!(log[0].context.user_profile.city.as_deref(), Some("Chicago"));
    assert_eq!(log[0].support.preferred_channel, "telegram");
}

#[test]
fn login_and_logout_flip_the_router_gate() {
    let mut ctx = AppContext::new(AppConfig::default()).unwrap();

    let profile = ctx
        .login(loveinthecity_store::ProfileUpdate {
            name: Some("Luca".to_string()),
            phone: Some("5552223333".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(profile.id.starts_with("USER_"));
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.resolve_link("/#/mine"), "/mine");

    assert!(ctx.logout());
    assert!(!ctx.is_authenticated());
    assert_eq!(ctx.resolve_link("/#/mine"), "/login");
    assert!(!ctx.storage().has(keys::AUTH_TOKEN));
    assert!(!ctx.storage().has(keys::USER_PROFILE));
}

#[test]
fn authentication_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        db_path: Some(dir.path().join("app.db")),
        ..AppConfig::default()
    };

    let profile_id = {
        let mut ctx = AppContext::new(config.clone()).unwrap();
        ctx.signup(signup_data()).unwrap().id
    };

    // A fresh context over the same database bootstraps as authenticated.
    let mut ctx = AppContext::new(config).unwrap();
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.resolve_link("/#/messages"), "/messages");

    // The restored profile still feeds support requests.
    ctx.resolve_link("/#/support/password");
    let log = ctx.router().support_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user_id, profile_id);
}
