//! Registration, OTP verification and login

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{Duration, Utc};
use common::error::DatabaseError;
use rand::Rng;
use tracing::{error, info, warn};

use crate::config::Environment;
use crate::error::{ApiError, ApiResult};
use crate::integrations::SharedOtpSender;
use crate::models::profile::default_custom_url;
use crate::models::{
    AuthResponse, LoginRequest, NewCreatorProfile, NewOtp, NewUser, RegisterRequest,
    RegisterResponse, User, VerifyOtpRequest,
};
use crate::rate_limiter::RateLimiter;
use crate::store::{SharedStore, constraints};

/// How long an issued code stays valid
pub const OTP_TTL_MINUTES: i64 = 10;

/// Attempts at finding a free custom URL before giving up
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalServerError
        })
}

/// Check a password against a stored PHC hash string
pub fn verify_password(password_hash: &str, password: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Six-digit numeric code
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    otp_sender: SharedOtpSender,
    rate_limiter: RateLimiter,
    environment: Environment,
}

impl AuthService {
    pub fn new(
        store: SharedStore,
        otp_sender: SharedOtpSender,
        rate_limiter: RateLimiter,
        environment: Environment,
    ) -> Self {
        Self {
            store,
            otp_sender,
            rate_limiter,
            environment,
        }
    }

    /// Create an unverified creator account and issue its first OTP
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<RegisterResponse> {
        info!("Registration attempt for mobile: {}", request.mobile);

        if self.store.get_user_by_mobile(&request.mobile).await?.is_some() {
            warn!("Mobile {} is already registered", request.mobile);
            return Err(ApiError::Conflict(
                "Mobile number already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .store
            .create_user(&NewUser {
                first_name: request.first_name,
                last_name: request.last_name,
                mobile: request.mobile,
                password_hash,
            })
            .await?;

        let code = generate_otp();
        self.store
            .create_otp(&NewOtp {
                mobile: user.mobile.clone(),
                code: code.clone(),
                expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
            })
            .await?;
        self.otp_sender.send(&user.mobile, &code).await?;

        info!("User {} registered, awaiting OTP verification", user.id);

        Ok(RegisterResponse {
            success: true,
            message: "OTP sent to mobile number".to_string(),
            otp: self.environment.exposes_otp().then_some(code),
        })
    }

    /// Consume an OTP, mark the account verified and give it a profile
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> ApiResult<AuthResponse> {
        let mobile = request.mobile.as_str();

        if !self.rate_limiter.is_allowed(mobile).await {
            warn!("Too many OTP attempts for mobile: {}", mobile);
            return Err(ApiError::TooManyAttempts);
        }

        let Some(otp) = self
            .store
            .find_valid_otp(mobile, &request.otp, Utc::now())
            .await?
        else {
            warn!("Invalid or expired OTP for mobile: {}", mobile);
            return Err(ApiError::InvalidOtp);
        };

        if !self.store.mark_otp_verified(otp.id).await? {
            warn!("OTP {} was consumed concurrently", otp.id);
            return Err(ApiError::InvalidOtp);
        }

        self.store.set_user_verified(mobile, true).await?;
        let user = self
            .store
            .get_user_by_mobile(mobile)
            .await?
            .ok_or(ApiError::NotFound("User"))?;

        self.ensure_profile(&user).await?;
        self.rate_limiter.reset(mobile).await;

        info!("User {} verified", user.id);

        Ok(AuthResponse {
            success: true,
            user: (&user).into(),
        })
    }

    /// Check credentials of a verified account. No session is issued.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<AuthResponse> {
        let mobile = request.mobile.as_str();
        info!("Login attempt for mobile: {}", mobile);

        if !self.rate_limiter.is_allowed(mobile).await {
            warn!("Too many login attempts for mobile: {}", mobile);
            return Err(ApiError::TooManyAttempts);
        }

        let Some(user) = self.store.get_user_by_mobile(mobile).await? else {
            warn!("Login failed: unknown mobile {}", mobile);
            return Err(ApiError::InvalidCredentials);
        };

        if !user.is_verified {
            warn!("Login refused: user {} is not verified", user.id);
            return Err(ApiError::NotVerified);
        }

        if !verify_password(&user.password_hash, &request.password)? {
            warn!("Login failed: wrong password for user {}", user.id);
            return Err(ApiError::InvalidCredentials);
        }

        self.rate_limiter.reset(mobile).await;
        info!("User {} logged in", user.id);

        Ok(AuthResponse {
            success: true,
            user: (&user).into(),
        })
    }

    async fn ensure_profile(&self, user: &User) -> ApiResult<()> {
        if self.store.get_profile_by_user(user.id).await?.is_some() {
            return Ok(());
        }

        let base = default_custom_url(&user.mobile);
        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let slug = match attempt {
                0 => base.clone(),
                n => format!("{}-{}", base, n),
            };
            if self.store.get_profile_by_custom_url(&slug).await?.is_some() {
                continue;
            }

            let profile = NewCreatorProfile {
                user_id: user.id,
                display_name: Some(user.display_name()),
                custom_url: Some(slug),
            };
            match self.store.create_profile(&profile).await {
                Ok(created) => {
                    info!("Created profile {} for user {}", created.id, user.id);
                    return Ok(());
                }
                Err(e) if e.is_unique_violation_of(constraints::PROFILES_USER_ID) => {
                    return Ok(());
                }
                Err(e) if e.is_unique_violation_of(constraints::PROFILES_CUSTOM_URL) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        error!("No free custom URL for user {} after {} attempts", user.id, MAX_SLUG_ATTEMPTS);
        Err(ApiError::Database(DatabaseError::UniqueViolation {
            constraint: constraints::PROFILES_CUSTOM_URL.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::LogOtpSender;
    use crate::models::UserRole;
    use crate::rate_limiter::RateLimiterConfig;
    use crate::store::{MemoryStore, Store};
    use std::sync::Arc;

    fn service_with(store: Arc<MemoryStore>, max_attempts: u32) -> AuthService {
        AuthService::new(
            store,
            Arc::new(LogOtpSender),
            RateLimiter::new(RateLimiterConfig {
                max_attempts,
                ..Default::default()
            }),
            Environment::Test,
        )
    }

    fn register_request(mobile: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            mobile: mobile.to_string(),
            password: "Abc12345".to_string(),
        }
    }

    async fn register_and_verify(service: &AuthService, mobile: &str) -> AuthResponse {
        let registered = service.register(register_request(mobile)).await.unwrap();
        service
            .verify_otp(VerifyOtpRequest {
                mobile: mobile.to_string(),
                otp: registered.otp.unwrap(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("Abc12345").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "Abc12345").unwrap());
        assert!(!verify_password(&hash, "Abc123456").unwrap());
    }

    #[test]
    fn test_generated_otp_is_six_digits() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[tokio::test]
    async fn test_register_hides_otp_in_production() {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService {
            environment: Environment::Production,
            ..service_with(store.clone(), 5)
        };

        let response = service.register(register_request("+15551234567")).await.unwrap();
        assert!(response.success);
        assert!(response.otp.is_none());

        let user = store.get_user_by_mobile("+15551234567").await.unwrap().unwrap();
        assert!(!user.is_verified);
        assert_eq!(user.role, UserRole::Creator);
        assert_ne!(user.password_hash, "Abc12345");
    }

    #[tokio::test]
    async fn test_register_duplicate_mobile_conflicts() {
        let service = service_with(Arc::new(MemoryStore::new()), 5);
        service.register(register_request("+15551234567")).await.unwrap();

        let err = service.register(register_request("+15551234567")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_verify_creates_profile_with_mobile_slug() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone(), 5);

        let response = register_and_verify(&service, "+15551234567").await;
        assert!(response.success);

        let profile = store.get_profile_by_user(response.user.id).await.unwrap().unwrap();
        assert_eq!(profile.custom_url.as_deref(), Some("15551234567"));
        assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_colliding_slug_gets_suffix() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone(), 5);

        register_and_verify(&service, "+15551234567").await;
        let second = register_and_verify(&service, "15551234567").await;

        let profile = store.get_profile_by_user(second.user.id).await.unwrap().unwrap();
        assert_eq!(profile.custom_url.as_deref(), Some("15551234567-1"));
    }

    #[tokio::test]
    async fn test_otp_cannot_be_reused() {
        let service = service_with(Arc::new(MemoryStore::new()), 5);
        let registered = service.register(register_request("+15551234567")).await.unwrap();
        let request = VerifyOtpRequest {
            mobile: "+15551234567".to_string(),
            otp: registered.otp.unwrap(),
        };

        service.verify_otp(request.clone()).await.unwrap();
        let err = service.verify_otp(request).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidOtp));
    }

    #[tokio::test]
    async fn test_login_flow() {
        let service = service_with(Arc::new(MemoryStore::new()), 5);
        let registered = service.register(register_request("+15551234567")).await.unwrap();

        let unverified = service
            .login(LoginRequest {
                mobile: "+15551234567".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unverified, ApiError::NotVerified));

        service
            .verify_otp(VerifyOtpRequest {
                mobile: "+15551234567".to_string(),
                otp: registered.otp.unwrap(),
            })
            .await
            .unwrap();

        let wrong = service
            .login(LoginRequest {
                mobile: "+15551234567".to_string(),
                password: "wrong-pass1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, ApiError::InvalidCredentials));

        let ok = service
            .login(LoginRequest {
                mobile: "+15551234567".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.mobile, "+15551234567");
        assert_eq!(ok.user.role, UserRole::Creator);
    }

    #[tokio::test]
    async fn test_unknown_mobile_is_invalid_credentials() {
        let service = service_with(Arc::new(MemoryStore::new()), 5);
        let err = service
            .login(LoginRequest {
                mobile: "+15550000000".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_repeated_wrong_codes_are_rate_limited() {
        let service = service_with(Arc::new(MemoryStore::new()), 2);
        service.register(register_request("+15551234567")).await.unwrap();

        let wrong = || VerifyOtpRequest {
            mobile: "+15551234567".to_string(),
            otp: "000000".to_string(),
        };
        assert!(matches!(service.verify_otp(wrong()).await, Err(ApiError::InvalidOtp)));
        assert!(matches!(service.verify_otp(wrong()).await, Err(ApiError::InvalidOtp)));
        assert!(matches!(service.verify_otp(wrong()).await, Err(ApiError::TooManyAttempts)));
    }
}
