//! `UserRecord` — one record per authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::Email;

/// Profile metadata fetched from Graph's `/me` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phones: Vec<String>,
    pub preferred_language: Option<String>,
}

/// A registered user, upserted on every successful authentication.
///
/// Never deleted by the core (see `spec.md` §3); only the associated
/// [`crate::domain::TokenRecord`] is removed on explicit logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    email: Email,
    azure_object_id: String,
    display_name: String,
    profile: UserProfile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        email: Email,
        azure_object_id: impl Into<String>,
        display_name: impl Into<String>,
        profile: UserProfile,
    ) -> Self {
        let now = Utc::now();
        Self {
            email,
            azure_object_id: azure_object_id.into(),
            display_name: display_name.into(),
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a record from storage (row mapping); does not touch
    /// `created_at`/`updated_at`.
    pub fn from_parts(
        email: Email,
        azure_object_id: String,
        display_name: String,
        profile: UserProfile,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            azure_object_id,
            display_name,
            profile,
            created_at,
            updated_at,
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn azure_object_id(&self) -> &str {
        &self.azure_object_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merges newly fetched profile data, bumping `updated_at`.
    pub fn update_profile(&mut self, display_name: impl Into<String>, profile: UserProfile) {
        self.display_name = display_name.into();
        self.profile = profile;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_profile_bumps_updated_at() {
        let mut user = UserRecord::new(
            Email::new("a@example.com").unwrap(),
            "obj-1",
            "Ada",
            UserProfile::default(),
        );
        let before = user.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        user.update_profile(
            "Ada L.",
            UserProfile {
                job_title: Some("Engineer".into()),
                ..Default::default()
            },
        );
        assert!(user.updated_at() >= before);
        assert_eq!(user.display_name(), "Ada L.");
    }
}
