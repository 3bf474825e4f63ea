//! Tests for the credential flows.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{ErrorCode, NotificationService, OtpPolicy};
use crate::outbound::memory::MemoryStore;
use crate::test_support::{MutableClock, PlainHasher, RecordingMailer, RecordingPublisher};

struct Harness {
    auth: AuthService,
    otp: OtpService,
    store: Arc<MemoryStore>,
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = MutableClock::fixed();
    let mailer = Arc::new(RecordingMailer::default());
    let hasher = Arc::new(PlainHasher);
    let otp = OtpService::new(store.clone(), mailer.clone(), clock.clone(), OtpPolicy::default());
    let notifications = NotificationService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        clock.clone(),
    );
    let verifications = VerificationService::new(
        store.clone(),
        store.clone(),
        hasher.clone(),
        mailer,
        notifications,
        clock.clone(),
    );
    let auth = AuthService::new(store.clone(), hasher, otp.clone(), verifications, clock);
    Harness { auth, otp, store }
}

fn email(raw: &str) -> Email {
    Email::new(raw).expect("email")
}

fn signup(role: Role, otp: OtpCode) -> SignupRequest {
    SignupRequest {
        name: "Priya".to_owned(),
        email: email("priya@x.com"),
        password: "secret".to_owned(),
        role,
        otp,
        rera_id: None,
        phone: Some("  ".to_owned()),
        company: None,
    }
}

async fn code_for(harness: &Harness, raw: &str, purpose: OtpPurpose) -> OtpCode {
    harness
        .otp
        .issue(&email(raw), purpose)
        .await
        .expect("issue")
        .code
}

#[rstest]
#[tokio::test]
async fn customer_signup_creates_active_account_and_can_log_in(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let outcome = harness
        .auth
        .signup(signup(Role::Customer, code))
        .await
        .expect("signup");
    let SignupOutcome::Registered(user) = outcome else {
        panic!("expected a registered account");
    };
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.is_email_verified);
    assert_eq!(user.phone, None);

    let logged_in = harness
        .auth
        .login(&email("PRIYA@x.com"), "secret")
        .await
        .expect("login");
    assert_eq!(logged_in.id, user.id);
}

#[rstest]
#[tokio::test]
async fn broker_signup_is_staged_for_review(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let request = SignupRequest {
        rera_id: Some("RERA9".to_owned()),
        ..signup(Role::Broker, code)
    };
    let outcome = harness.auth.signup(request).await.expect("signup");
    assert!(matches!(outcome, SignupOutcome::PendingVerification(ref v) if v.rera_id == "RERA9"));
    let err = harness
        .auth
        .login(&email("priya@x.com"), "secret")
        .await
        .expect_err("no account yet");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn second_application_keeps_the_signup_code(harness: Harness) {
    let first = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    harness
        .auth
        .signup(SignupRequest {
            rera_id: Some("RERA9".to_owned()),
            ..signup(Role::Broker, first)
        })
        .await
        .expect("first application staged");

    let second = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let err = harness
        .auth
        .signup(SignupRequest {
            rera_id: Some("RERA9".to_owned()),
            ..signup(Role::Vendor, second.clone())
        })
        .await
        .expect_err("duplicate application");
    assert_eq!(err.code(), ErrorCode::Conflict);

    harness
        .otp
        .verify(&email("priya@x.com"), &second, OtpPurpose::Signup)
        .await
        .expect("code survives the refused application");
}

#[rstest]
#[case(Role::Admin)]
#[case(Role::SuperAdmin)]
#[tokio::test]
async fn administrative_roles_cannot_sign_up(harness: Harness, #[case] role: Role) {
    let err = harness
        .auth
        .signup(signup(role, OtpCode::new("000000")))
        .await
        .expect_err("refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn wrong_signup_code_is_rejected(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let wrong = if code.as_str() == "000000" { "111111" } else { "000000" };
    let err = harness
        .auth
        .signup(signup(Role::Customer, OtpCode::new(wrong)))
        .await
        .expect_err("mismatch");
    assert_eq!(err.message(), "Invalid OTP");
}

#[rstest]
#[tokio::test]
async fn login_failures_are_uniform(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    harness
        .auth
        .signup(signup(Role::Customer, code))
        .await
        .expect("signup");

    let unknown = harness
        .auth
        .login(&email("nobody@x.com"), "secret")
        .await
        .expect_err("unknown");
    let bad_password = harness
        .auth
        .login(&email("priya@x.com"), "wrong")
        .await
        .expect_err("bad password");
    assert_eq!(unknown.message(), bad_password.message());
    assert_eq!(unknown.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn inactive_accounts_cannot_log_in(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let SignupOutcome::Registered(user) = harness
        .auth
        .signup(signup(Role::Customer, code))
        .await
        .expect("signup")
    else {
        panic!("expected account");
    };
    let patch = UserPatch {
        status: Some(UserStatus::Inactive),
        ..UserPatch::default()
    };
    UserRepository::update(harness.store.as_ref(), &user.id, patch, chrono::Utc::now())
        .await
        .expect("deactivate");
    let err = harness
        .auth
        .login(&email("priya@x.com"), "secret")
        .await
        .expect_err("inactive");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn password_reset_replaces_the_hash(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    harness
        .auth
        .signup(signup(Role::Customer, code))
        .await
        .expect("signup");

    let reset = code_for(&harness, "priya@x.com", OtpPurpose::PasswordReset).await;
    harness
        .auth
        .confirm_password_reset(&email("priya@x.com"), &reset, "fresh")
        .await
        .expect("reset");
    harness
        .auth
        .login(&email("priya@x.com"), "fresh")
        .await
        .expect("new password works");
    assert!(
        harness
            .auth
            .login(&email("priya@x.com"), "secret")
            .await
            .is_err()
    );
}

#[rstest]
#[tokio::test]
async fn reset_request_for_unknown_email_is_silent(harness: Harness) {
    harness
        .auth
        .request_password_reset(&email("ghost@x.com"))
        .await
        .expect("always ok");
    assert_eq!(harness.store.otp_count(), 0);
}

#[rstest]
#[tokio::test]
async fn signup_otp_refused_for_registered_email(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    harness
        .auth
        .signup(signup(Role::Customer, code))
        .await
        .expect("signup");
    let err = harness
        .auth
        .request_signup_otp(&email("priya@x.com"))
        .await
        .expect_err("registered");
    assert_eq!(err.message(), "Email is already registered");
}

#[rstest]
#[tokio::test]
async fn profile_update_ignores_blank_fields(harness: Harness) {
    let code = code_for(&harness, "priya@x.com", OtpPurpose::Signup).await;
    let SignupOutcome::Registered(user) = harness
        .auth
        .signup(signup(Role::Investor, code))
        .await
        .expect("signup")
    else {
        panic!("expected account");
    };
    let updated = harness
        .auth
        .update_profile(
            &user.id,
            ProfileUpdate {
                name: Some(String::new()),
                company: Some("Acme Estates".to_owned()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "Priya");
    assert_eq!(updated.company.as_deref(), Some("Acme Estates"));
}
