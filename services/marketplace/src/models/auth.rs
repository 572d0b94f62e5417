//! Request and response payloads of the registration / login flow

use serde::{Deserialize, Serialize};

use crate::models::UserSummary;
use crate::validation::{
    FieldError, FieldErrors, Validate, validate_mobile, validate_otp_code, validate_password,
    validate_required_text,
};

/// Request for account registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("firstName", validate_required_text(&self.first_name, 100))
            .check("lastName", validate_required_text(&self.last_name, 100))
            .check("mobile", validate_mobile(&self.mobile))
            .check("password", validate_password(&self.password));
        errors.finish()
    }
}

/// Response for account registration
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    /// Only populated outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Request for OTP verification
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub mobile: String,
    pub otp: String,
}

impl Validate for VerifyOtpRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("mobile", validate_mobile(&self.mobile))
            .check("otp", validate_otp_code(&self.otp));
        errors.finish()
    }
}

/// Request for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("mobile", validate_required_text(&self.mobile, 32))
            .check("password", validate_required_text(&self.password, 128));
        errors.finish()
    }
}

/// Response for OTP verification and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_collects_all_errors() {
        let request = RegisterRequest {
            first_name: "".to_string(),
            last_name: "Doe".to_string(),
            mobile: "abc".to_string(),
            password: "short".to_string(),
        };

        let errors = request.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "mobile", "password"]);
    }

    #[test]
    fn test_register_response_hides_missing_otp() {
        let response = RegisterResponse {
            success: true,
            message: "OTP sent to mobile number".to_string(),
            otp: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("otp").is_none());
    }

    #[test]
    fn test_login_request_does_not_judge_password_strength() {
        let request = LoginRequest {
            mobile: "+15551234567".to_string(),
            password: "x".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
