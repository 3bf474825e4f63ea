//! Signup, login, password reset and self-service profile edits.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{PasswordHasher, UserRepository};
use super::{
    Application, Email, Error, NewUser, OtpCode, OtpPurpose, OtpService, Role, User, UserId,
    UserPatch, UserStatus, Verification, VerificationService,
};

/// Signup form after transport decoding.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub role: Role,
    pub otp: OtpCode,
    pub rera_id: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// What a successful signup produced.
#[derive(Debug, Clone)]
pub enum SignupOutcome {
    /// The account exists and may sign in.
    Registered(User),
    /// Vendors and brokers wait for an administrator.
    PendingVerification(Verification),
}

/// Fields the account holder may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Credential flows over the user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    otp: OtpService,
    verifications: VerificationService,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        otp: OtpService,
        verifications: VerificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            otp,
            verifications,
            clock,
        }
    }

    /// Mail a signup code to an address that has no account yet.
    pub async fn request_signup_otp(&self, email: &Email) -> Result<(), Error> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(Error::invalid_request("Email is already registered"));
        }
        self.otp.issue(email, OtpPurpose::Signup).await?;
        Ok(())
    }

    /// Create an account, or stage an application for roles that need
    /// review.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, Error> {
        if request.role.is_administrative() {
            return Err(Error::invalid_request(
                "Administrative roles cannot be self-assigned",
            ));
        }
        if request.name.trim().is_empty() {
            return Err(Error::invalid_request("Name is required"));
        }
        if request.password.is_empty() {
            return Err(Error::invalid_request("Password is required"));
        }
        let rera_id = non_blank(request.rera_id);
        if request.role.requires_verification() && rera_id.is_none() {
            return Err(Error::invalid_request(
                "RERA ID is required for vendor and broker accounts",
            ));
        }
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(Error::invalid_request("Email is already registered"));
        }
        if request.role.requires_verification() {
            self.verifications.ensure_accepting(&request.email).await?;
        }

        self.otp
            .verify(&request.email, &request.otp, OtpPurpose::Signup)
            .await?;

        if let Some(rera_id) = rera_id.filter(|_| request.role.requires_verification()) {
            let staged = self
                .verifications
                .submit(Application {
                    name: request.name,
                    email: request.email,
                    password: request.password,
                    role: request.role,
                    rera_id,
                    phone: non_blank(request.phone),
                    company: non_blank(request.company),
                })
                .await?;
            return Ok(SignupOutcome::PendingVerification(staged));
        }

        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(|err| Error::internal(err.to_string()))?;
        let user = NewUser {
            name: request.name.trim().to_owned(),
            email: request.email,
            password_hash,
            role: request.role,
            status: UserStatus::Active,
            verified: false,
            is_email_verified: true,
            is_rera_verified: false,
            rera_id: None,
            phone: non_blank(request.phone),
            company: non_blank(request.company),
        }
        .into_user(UserId::random(), self.clock.utc());
        self.users.create(&user).await?;
        info!(user_id = %user.id, role = %user.role, "account created");
        Ok(SignupOutcome::Registered(user))
    }

    /// Check credentials. Unknown addresses and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, Error> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        if user.status == UserStatus::Inactive {
            return Err(Error::forbidden("Account is inactive. Contact support."));
        }
        info!(user_id = %user.id, "login succeeded");
        Ok(user)
    }

    /// Account for an authenticated session.
    pub async fn current_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::unauthorized("Authentication required"))
    }

    /// Start a reset. Never reveals whether the address is registered.
    pub async fn request_password_reset(&self, email: &Email) -> Result<(), Error> {
        if self.users.find_by_email(email).await?.is_none() {
            return Ok(());
        }
        if let Err(err) = self.otp.issue(email, OtpPurpose::PasswordReset).await {
            warn!(%email, error = %err, "password reset otp not delivered");
        }
        Ok(())
    }

    /// Finish a reset with the mailed code.
    pub async fn confirm_password_reset(
        &self,
        email: &Email,
        otp: &OtpCode,
        new_password: &str,
    ) -> Result<(), Error> {
        if new_password.is_empty() {
            return Err(Error::invalid_request("New password is required"));
        }
        self.otp
            .verify(email, otp, OtpPurpose::PasswordReset)
            .await?;
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        let password_hash = self
            .hasher
            .hash(new_password)
            .map_err(|err| Error::internal(err.to_string()))?;
        let patch = UserPatch {
            password_hash: Some(password_hash),
            ..UserPatch::default()
        };
        self.users.update(&user.id, patch, self.clock.utc()).await?;
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Apply the caller's own profile edits.
    pub async fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        let patch = UserPatch {
            name: non_blank(update.name),
            phone: non_blank(update.phone),
            company: non_blank(update.company),
            avatar: non_blank(update.avatar),
            ..UserPatch::default()
        };
        self.users
            .update(id, patch, self.clock.utc())
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
