//! Signup flow: validation and the records it persists.
//!
//! A successful signup writes four records through the canonical store:
//! the `userProfile` (with a signup-format id), the `funloves_token`
//! marker, the `customerSupportData` snapshot, and the authenticated
//! session. The password is validated but never persisted — authentication
//! is a locally asserted placeholder with no legitimate reader for it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use loveinthecity_store::{
    Clock, Preferences, SupportMetadata, UserProfile, generate_signup_user_id,
};

/// Support address recorded in the signup snapshot.
pub const SUPPORT_CONTACT_EMAIL: &str = "support@loveinthecity.com";

/// Raw signup form input.
#[derive(Debug, Clone)]
pub struct SignupData {
    pub name: String,
    pub age: u32,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub password: String,
}

/// Why a signup was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("name is required")]
    NameRequired,
    #[error("age must be between 18 and 120")]
    AgeOutOfRange,
    #[error("phone number must have at least 10 digits")]
    PhoneTooShort,
    #[error("city is required")]
    CityRequired,
    #[error("state is required")]
    StateRequired,
    #[error("password must be at least 3 characters")]
    PasswordTooShort,
    #[error("signup could not be persisted")]
    Persistence,
}

impl SignupData {
    /// Field validation, first failure wins.
    pub fn validate(&self) -> Result<(), SignupError> {
        if self.name.trim().is_empty() {
            return Err(SignupError::NameRequired);
        }
        if !(18..=120).contains(&self.age) {
            return Err(SignupError::AgeOutOfRange);
        }
        if self.phone.chars().filter(char::is_ascii_digit).count() < 10 {
            return Err(SignupError::PhoneTooShort);
        }
        if self.city.trim().is_empty() {
            return Err(SignupError::CityRequired);
        }
        if self.state.trim().is_empty() {
            return Err(SignupError::StateRequired);
        }
        if self.password.trim().len() < 3 {
            return Err(SignupError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Signup-time customer support snapshot, persisted under
/// `customerSupportData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportSnapshot {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub age: u32,
    pub signup_date: String,
    pub account_status: String,
    pub last_activity: String,
}

/// Build the canonical profile a signup creates.
pub(crate) fn build_profile(data: &SignupData, clock: &Arc<dyn Clock>) -> UserProfile {
    let now_iso = clock.now_iso();
    UserProfile {
        id: generate_signup_user_id(clock.now_millis()),
        name: data.name.clone(),
        email: String::new(),
        phone: data.phone.clone(),
        created_at: now_iso.clone(),
        last_login: now_iso,
        preferences: Preferences {
            age_range: Some([18, 50]),
            location: Some(data.city.clone()),
            interests: Some(Vec::new()),
        },
        support_metadata: SupportMetadata {
            session_count: 1,
            total_visits: 1,
            referral_source: "signup".to_string(),
        },
    }
}

/// Build the support snapshot for a freshly created profile.
pub(crate) fn build_snapshot(
    data: &SignupData,
    profile: &UserProfile,
    clock: &Arc<dyn Clock>,
) -> SupportSnapshot {
    SupportSnapshot {
        user_id: profile.id.clone(),
        name: data.name.clone(),
        phone: data.phone.clone(),
        email: SUPPORT_CONTACT_EMAIL.to_string(),
        city: data.city.clone(),
        state: data.state.clone(),
        age: data.age,
        signup_date: profile.created_at.clone(),
        account_status: "active".to_string(),
        last_activity: clock.now_iso(),
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use loveinthecity_store::ManualClock;

    fn valid_data() -> SignupData {
        SignupData {
            name: "Iris".to_string(),
            age: 27,
            phone: "(555) 123-4567".to_string(),
            city: "Portland".to_string(),
            state: "Oregon".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn valid_data_passes() {
        assert_eq!(valid_data().validate(), Ok(()));
    }

    #[test]
    fn each_field_is_checked() {
        let mut data = valid_data();
        data.name = "   ".to_string();
        assert_eq!(data.validate(), Err(SignupError::NameRequired));

        let mut data = valid_data();
        data.age = 17;
        assert_eq!(data.validate(), Err(SignupError::AgeOutOfRange));
        data.age = 121;
        assert_eq!(data.validate(), Err(SignupError::AgeOutOfRange));

        let mut data = valid_data();
        data.phone = "555-1234".to_string();
        assert_eq!(data.validate(), Err(SignupError::PhoneTooShort));

        let mut data = valid_data();
        data.city = String::new();
        assert_eq!(data.validate(), Err(SignupError::CityRequired));

        let mut data = valid_data();
        data.state = String::new();
        assert_eq!(data.validate(), Err(SignupError::StateRequired));

        let mut data = valid_data();
        data.password = "ab".to_string();
        assert_eq!(data.validate(), Err(SignupError::PasswordTooShort));
    }

    #[test]
    fn phone_counts_digits_not_punctuation() {
        let mut data = valid_data();
        data.phone = "(55) 123-456".to_string();
        assert_eq!(data.validate(), Err(SignupError::PhoneTooShort));

        data.phone = "+1 (555) 000-1111".to_string();
        assert_eq!(data.validate(), Ok(()));
    }

    #[test]
    fn built_profile_uses_signup_conventions() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(1_700_000_000_000));
        let profile = build_profile(&valid_data(), &clock);

        assert!(profile.id.starts_with("USER-1700000000000-"));
        assert_eq!(profile.name, "Iris");
        assert_eq!(profile.preferences.age_range, Some([18, 50]));
        assert_eq!(profile.preferences.location.as_deref(), Some("Portland"));
        assert_eq!(profile.support_metadata.session_count, 1);
        assert_eq!(profile.support_metadata.referral_source, "signup");
        assert_eq!(profile.created_at, profile.last_login);
    }

    #[test]
    fn snapshot_mirrors_the_signup() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(1_700_000_000_000));
        let data = valid_data();
        let profile = build_profile(&data, &clock);
        let snapshot = build_snapshot(&data, &profile, &clock);

        assert_eq!(snapshot.user_id, profile.id);
        assert_eq!(snapshot.email, SUPPORT_CONTACT_EMAIL);
        assert_eq!(snapshot.account_status, "active");
        assert_eq!(snapshot.signup_date, profile.created_at);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("accountStatus").is_some());
        assert!(json.get("signupDate").is_some());
    }
}
