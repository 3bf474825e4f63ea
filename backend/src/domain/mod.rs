//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities of the estate platform and the
//! services that operate on them. Services depend only on the traits in
//! [`ports`]; adapters live under `inbound` and `outbound`.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Verification, OtpRecord and the owned records: entities.
//! - AuthService, VerificationService, UsersService, ResourcesService,
//!   NotificationService, MapService, StatsService: use-cases.

mod access;
mod auth_service;
mod emails;
pub mod error;
pub(crate) mod labels;
mod map;
mod map_service;
mod otp;
mod otp_service;
pub mod ports;
mod records;
mod resources;
mod stats;
mod store_errors;
pub mod trace_id;
pub mod user;
mod users_service;
mod verification;
mod verification_service;

pub use self::access::{AccessError, AccessTier, Principal, authorize};
pub use self::auth_service::{AuthService, ProfileUpdate, SignupOutcome, SignupRequest};
pub use self::error::{Error, ErrorCode};
pub use self::labels::UnknownLabel;
pub use self::map::{
    Boundary, Coordinates, InvalidPincode, Locality, MapRegistration, Pincode,
    RegistrationRequest, locality_for,
};
pub use self::map_service::{LocationSource, MapService, ResolvedLocation};
pub use self::otp::{OTP_DIGITS, OtpCode, OtpPolicy, OtpPurpose, OtpRecord};
pub use self::otp_service::{OtpError, OtpService};
pub use self::records::{
    Document, DocumentStatus, NewDocument, NewNotification, NewTransaction, Notification,
    NotificationKind, PaymentMethod, Transaction, TransactionStatus,
};
pub use self::resources::{NotificationService, ResourcesService};
pub use self::stats::{
    ActivityTrends, Analytics, MonthlyRevenue, MonthlyUsers, PlatformStats, StatsService,
    SuperAdminStats, UserDistribution, UsersByRole,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Email, NewUser, PasswordHash, Role, User, UserId, UserPatch, UserStatus, UserValidationError,
};
pub use self::users_service::{AdminUserUpdate, UsersService};
pub use self::verification::{
    DecisionOutcome, Verification, VerificationDecision, VerificationStatus,
};
pub use self::verification_service::{Application, VerificationError, VerificationService};
