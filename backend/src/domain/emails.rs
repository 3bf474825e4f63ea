//! Message templates for the mail collaborator.

use super::ports::OutboundEmail;
use super::{Email, OtpCode, OtpPurpose, Verification};

/// Code delivery for signup or password reset.
#[must_use]
pub fn otp_email(to: &Email, code: &OtpCode, purpose: OtpPurpose, ttl_minutes: i64) -> OutboundEmail {
    let (subject, action) = match purpose {
        OtpPurpose::Signup => ("Verify your email address", "complete your registration"),
        OtpPurpose::PasswordReset => ("Reset your password", "reset your password"),
    };
    OutboundEmail {
        to: to.clone(),
        subject: subject.to_owned(),
        body: format!(
            "Your verification code is {code}.\n\nUse it to {action}. \
             It expires in {ttl_minutes} minutes.\n\nIf you did not request this, ignore this email.",
            code = code.as_str(),
        ),
    }
}

/// Sent once an administrator approves an application.
#[must_use]
pub fn approval_email(application: &Verification) -> OutboundEmail {
    OutboundEmail {
        to: application.email.clone(),
        subject: "Your account has been approved".to_owned(),
        body: format!(
            "Hello {name},\n\nYour {role} account (RERA ID {rera}) has been approved. \
             You can now sign in with the email and password you registered with.",
            name = application.name,
            role = application.role,
            rera = application.rera_id,
        ),
    }
}

/// Sent when an application is declined.
#[must_use]
pub fn rejection_email(application: &Verification, reason: &str) -> OutboundEmail {
    OutboundEmail {
        to: application.email.clone(),
        subject: "Your account application was not approved".to_owned(),
        body: format!(
            "Hello {name},\n\nYour {role} account application was not approved.\n\n\
             Reason: {reason}\n\nYou may submit a new application once the issue is resolved.",
            name = application.name,
            role = application.role,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_carries_code_and_window() {
        let to = Email::new("b@x.com").expect("email");
        let message = otp_email(&to, &OtpCode::new("482913"), OtpPurpose::PasswordReset, 10);
        assert_eq!(message.to, to);
        assert!(message.body.contains("482913"));
        assert!(message.body.contains("10 minutes"));
        assert_eq!(message.subject, "Reset your password");
    }
}
