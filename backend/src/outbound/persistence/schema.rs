//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly. Labelled enums (roles,
//! statuses, kinds) are stored as their wire labels in `Varchar` columns.

diesel::table! {
    /// User accounts. `email` is unique and stored normalised.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        status -> Varchar,
        verified -> Bool,
        is_email_verified -> Bool,
        is_rera_verified -> Bool,
        rera_id -> Nullable<Varchar>,
        avatar -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        company -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Vendor and broker applications awaiting review.
    verifications (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        rera_id -> Varchar,
        phone -> Nullable<Varchar>,
        company -> Nullable<Varchar>,
        status -> Varchar,
        rejection_reason -> Nullable<Varchar>,
        submitted_at -> Timestamptz,
        reviewed_at -> Nullable<Timestamptz>,
        reviewed_by -> Nullable<Uuid>,
    }
}

diesel::table! {
    /// One-time codes. Expired rows are ignored by reads, never swept.
    otps (id) {
        id -> Uuid,
        email -> Varchar,
        code -> Varchar,
        purpose -> Varchar,
        expires_at -> Timestamptz,
        attempts -> Int4,
        max_attempts -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    documents (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        kind -> Varchar,
        size -> Int8,
        status -> Varchar,
        url -> Varchar,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    transactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount -> Float8,
        status -> Varchar,
        method -> Varchar,
        description -> Varchar,
        transaction_id -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        message -> Varchar,
        kind -> Varchar,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Map markers; `user_id` is unique so each user has at most one.
    map_registrations (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        role -> Varchar,
        address -> Varchar,
        pincode -> Varchar,
        locality -> Nullable<Varchar>,
        latitude -> Float8,
        longitude -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    verifications,
    otps,
    documents,
    transactions,
    notifications,
    map_registrations,
);
