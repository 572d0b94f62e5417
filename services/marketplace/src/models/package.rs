//! Consultation package model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    FieldError, FieldErrors, Validate, validate_money, validate_required_text,
    validate_session_minutes, validate_text_length,
};

/// Package entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Session length in minutes
    pub duration: i32,
    pub price: Decimal,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// New package creation payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPackage {
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub price: Decimal,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for NewPackage {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("title", validate_required_text(&self.title, 200))
            .check_opt("description", self.description.as_deref(), |v| {
                validate_text_length(v, 5000)
            })
            .check("duration", validate_session_minutes(self.duration))
            .check("price", validate_money(&self.price));
        errors.finish()
    }
}

/// Package update payload; the owning creator cannot be changed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub price: Option<Decimal>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

impl Validate for UpdatePackage {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check_opt("title", self.title.as_deref(), |v| {
                validate_required_text(v, 200)
            })
            .check_opt("description", self.description.as_deref(), |v| {
                validate_text_length(v, 5000)
            })
            .check_opt("duration", self.duration.as_ref(), |d| {
                validate_session_minutes(*d)
            })
            .check_opt("price", self.price.as_ref(), validate_money);
        errors.finish()
    }
}
