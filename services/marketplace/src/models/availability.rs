//! Weekly availability window model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    FieldError, FieldErrors, Validate, validate_day_of_week, validate_time_of_day,
};

/// Availability entity; a recurring window on one day of the week
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: Uuid,
    pub creator_id: Uuid,
    /// 0 = Sunday, 1 = Monday, ...
    pub day_of_week: i32,
    /// `HH:mm`
    pub start_time: String,
    /// `HH:mm`
    pub end_time: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// New availability window payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAvailability {
    pub creator_id: Uuid,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl Validate for NewAvailability {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("dayOfWeek", validate_day_of_week(self.day_of_week))
            .check("startTime", validate_time_of_day(&self.start_time))
            .check("endTime", validate_time_of_day(&self.end_time));
        errors.finish()
    }
}

/// Availability update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailability {
    pub day_of_week: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_enabled: Option<bool>,
}

impl Validate for UpdateAvailability {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check_opt("dayOfWeek", self.day_of_week.as_ref(), |d| {
                validate_day_of_week(*d)
            })
            .check_opt("startTime", self.start_time.as_deref(), validate_time_of_day)
            .check_opt("endTime", self.end_time.as_deref(), validate_time_of_day);
        errors.finish()
    }
}
