//! Creator profile model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CreatorName, Package};
use crate::validation::{
    FieldError, FieldErrors, Validate, validate_custom_url, validate_text_length,
};

/// Creator profile entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub professional_title: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub website: Option<String>,
    pub custom_url: Option<String>,
    pub stripe_account_id: Option<String>,
    pub is_stripe_connected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New creator profile creation payload
#[derive(Debug, Clone)]
pub struct NewCreatorProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub custom_url: Option<String>,
}

/// Creator profile update payload; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCreatorProfile {
    pub display_name: Option<String>,
    pub professional_title: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub website: Option<String>,
    pub custom_url: Option<String>,
    pub stripe_account_id: Option<String>,
    pub is_stripe_connected: Option<bool>,
}

impl Validate for UpdateCreatorProfile {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check_opt("displayName", self.display_name.as_deref(), |v| {
                validate_text_length(v, 100)
            })
            .check_opt("professionalTitle", self.professional_title.as_deref(), |v| {
                validate_text_length(v, 120)
            })
            .check_opt("bio", self.bio.as_deref(), |v| validate_text_length(v, 2000))
            .check_opt("profileImage", self.profile_image.as_deref(), |v| {
                validate_text_length(v, 2048)
            })
            .check_opt("website", self.website.as_deref(), |v| {
                validate_text_length(v, 2048)
            })
            .check_opt("customUrl", self.custom_url.as_deref(), validate_custom_url)
            .check_opt("stripeAccountId", self.stripe_account_id.as_deref(), |v| {
                validate_text_length(v, 255)
            });
        errors.finish()
    }
}

/// Data behind a creator's public booking page
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub profile: CreatorProfile,
    pub packages: Vec<Package>,
    pub creator: Option<CreatorName>,
}

/// Default public slug for a creator: the digits of their mobile number
pub fn default_custom_url(mobile: &str) -> String {
    mobile.chars().filter(|c| c.is_ascii_digit()).collect()
}
