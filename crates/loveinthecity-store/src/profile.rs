//! User profile and session persistence.
//!
//! [`ProfileManager`] owns the `userProfile` and `userSession` records on
//! top of the [`StorageManager`]. Profiles carry a write-once `id` and
//! `createdAt`; every other field is shallow-merged on update, with the
//! incoming value winning when present. The `supportMetadata` counters are
//! monotonic.
//!
//! Persisted field names are camelCase so the stored JSON matches the
//! layout consumed by the rest of the application.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::keys;
use crate::manager::StorageManager;

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// The canonical user profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Globally unique, generated once, never changed after creation.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// ISO-8601 creation timestamp; write-once.
    pub created_at: String,
    /// ISO-8601 timestamp, updated on every login/creation call.
    pub last_login: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub support_metadata: SupportMetadata,
}

/// Discovery preferences; all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

/// Monotonically incremented support counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportMetadata {
    pub session_count: u64,
    pub total_visits: u64,
    #[serde(default)]
    pub referral_source: String,
}

/// The authenticated session record.
///
/// Its presence plus `is_authenticated == true` is the sole authentication
/// predicate consulted at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub is_authenticated: bool,
    pub login_time: String,
}

/// Partial profile update; absent fields preserve the existing value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferences: Option<Preferences>,
    pub referral_source: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
//  ID generation
// ═══════════════════════════════════════════════════════════════════════

const ID_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(ID_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ID_DIGITS[rng.random_range(0..ID_DIGITS.len())] as char)
        .collect()
}

/// Generate a profile id: `user_<base36-millis>_<rand7>`, uppercased.
pub fn generate_user_id(now_millis: i64) -> String {
    format!(
        "user_{}_{}",
        base36(now_millis.max(0) as u64),
        random_suffix(7)
    )
    .to_uppercase()
}

/// Generate a signup-flow user id: `USER-<millis>-<RAND9>`.
pub fn generate_signup_user_id(now_millis: i64) -> String {
    format!(
        "USER-{}-{}",
        now_millis,
        random_suffix(9).to_uppercase()
    )
}

fn generate_session_id(now_millis: i64) -> String {
    format!("session_{}_{}", now_millis, random_suffix(9))
}

// ═══════════════════════════════════════════════════════════════════════
//  ProfileManager
// ═══════════════════════════════════════════════════════════════════════

/// Profile and session operations over the shared [`StorageManager`].
#[derive(Clone)]
pub struct ProfileManager {
    store: Arc<StorageManager>,
}

/// First non-empty candidate, else the fallback.
fn first_non_empty(candidates: [Option<String>; 2], fallback: &str) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl ProfileManager {
    /// Create a manager over the shared store.
    pub fn new(store: Arc<StorageManager>) -> Self {
        Self { store }
    }

    /// Create the profile if none exists, otherwise merge `update` onto it.
    ///
    /// `id` and `createdAt` are preserved from the existing profile;
    /// `lastLogin` is refreshed and both support counters increment by one.
    pub fn create_or_update(&self, update: ProfileUpdate) -> UserProfile {
        let existing = self.store.get::<UserProfile>(keys::USER_PROFILE);
        let now_iso = self.store.clock().now_iso();

        let mut preferences = existing
            .as_ref()
            .map(|p| p.preferences.clone())
            .unwrap_or_default();
        if let Some(incoming) = update.preferences {
            if incoming.age_range.is_some() {
                preferences.age_range = incoming.age_range;
            }
            if incoming.location.is_some() {
                preferences.location = incoming.location;
            }
            if incoming.interests.is_some() {
                preferences.interests = incoming.interests;
            }
        }

        let metadata = existing
            .as_ref()
            .map(|p| p.support_metadata.clone())
            .unwrap_or_default();

        let profile = UserProfile {
            id: existing.as_ref().map_or_else(
                || generate_user_id(self.store.clock().now_millis()),
                |p| p.id.clone(),
            ),
            name: first_non_empty(
                [update.name, existing.as_ref().map(|p| p.name.clone())],
                "User",
            ),
            email: first_non_empty(
                [update.email, existing.as_ref().map(|p| p.email.clone())],
                "",
            ),
            phone: first_non_empty(
                [update.phone, existing.as_ref().map(|p| p.phone.clone())],
                "",
            ),
            created_at: existing
                .as_ref()
                .map_or_else(|| now_iso.clone(), |p| p.created_at.clone()),
            last_login: now_iso,
            preferences,
            support_metadata: SupportMetadata {
                session_count: metadata.session_count + 1,
                total_visits: metadata.total_visits + 1,
                referral_source: first_non_empty(
                    [update.referral_source, Some(metadata.referral_source)],
                    "direct",
                ),
            },
        };

        if !self.store.set(keys::USER_PROFILE, &profile, None) {
            warn!(id = %profile.id, "profile write failed; returning unpersisted profile");
        }
        debug!(id = %profile.id, name = %profile.name, "profile created/updated");
        profile
    }

    /// The stored profile, if any.
    pub fn profile(&self) -> Option<UserProfile> {
        self.store.get(keys::USER_PROFILE)
    }

    /// Replace the stored profile wholesale (signup flow).
    pub fn store_profile(&self, profile: &UserProfile) -> bool {
        self.store.set(keys::USER_PROFILE, profile, None)
    }

    /// Remove the stored profile.
    pub fn clear_profile(&self) -> bool {
        self.store.remove(keys::USER_PROFILE)
    }

    /// The profile id, lazily creating a default anonymous profile when no
    /// profile exists yet. Never returns without a valid id.
    pub fn user_id(&self) -> String {
        if let Some(profile) = self.profile() {
            return profile.id;
        }
        self.create_or_update(ProfileUpdate {
            name: Some("Anonymous".to_string()),
            ..ProfileUpdate::default()
        })
        .id
    }

    /// Formatted identity line for customer support.
    pub fn support_summary(&self) -> String {
        match self.profile() {
            None => "User ID: Unknown | Name: Anonymous".to_string(),
            Some(profile) => {
                let email = if profile.email.is_empty() {
                    "N/A"
                } else {
                    profile.email.as_str()
                };
                let created = profile
                    .created_at
                    .split('T')
                    .next()
                    .unwrap_or(&profile.created_at);
                format!(
                    "User ID: {} | Name: {} | Email: {} | Created: {}",
                    profile.id, profile.name, email, created
                )
            }
        }
    }

    // ── session lifecycle ────────────────────────────────────────────

    /// Write a fresh authenticated session record.
    pub fn login(&self) -> Option<UserSession> {
        let session = UserSession {
            id: generate_session_id(self.store.clock().now_millis()),
            is_authenticated: true,
            login_time: self.store.clock().now_iso(),
        };
        if !self.store.set(keys::USER_SESSION, &session, None) {
            warn!("session write failed");
            return None;
        }
        debug!(session_id = %session.id, "session opened");
        Some(session)
    }

    /// Remove the session record and clear the profile.
    pub fn logout(&self) -> bool {
        let removed = self.store.remove(keys::USER_SESSION);
        let cleared = self.clear_profile();
        debug!(removed, cleared, "session closed");
        removed && cleared
    }

    /// The sole authentication predicate: a session record exists and its
    /// flag is set.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some_and(|s| s.is_authenticated)
    }

    /// The stored session record, if any.
    pub fn session(&self) -> Option<UserSession> {
        self.store.get(keys::USER_SESSION)
    }
}

// ── tests ────────────────────────────────────────────────────────────
