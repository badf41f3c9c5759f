//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        full_name -> Varchar,
        phone -> Nullable<Varchar>,
        role -> Varchar,
        avatar_url -> Nullable<Varchar>,
        provider -> Varchar,
        password_hash -> Nullable<Text>,
        google_subject -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    driver_profiles (user_id) {
        user_id -> Uuid,
        license_number -> Varchar,
        license_document -> Nullable<Varchar>,
        verified -> Bool,
    }
}

diesel::table! {
    passenger_profiles (user_id) {
        user_id -> Uuid,
        emergency_contact -> Nullable<Varchar>,
        preferences -> Nullable<Text>,
    }
}

diesel::table! {
    vehicles (id) {
        id -> Uuid,
        owner_id -> Uuid,
        make -> Varchar,
        model -> Varchar,
        year -> Int4,
        color -> Varchar,
        plate -> Varchar,
        seats -> Int2,
    }
}

diesel::table! {
    /// Published trips. Places are stored as JSONB documents.
    routes (id) {
        id -> Uuid,
        driver_id -> Uuid,
        vehicle_id -> Uuid,
        origin -> Jsonb,
        destination -> Jsonb,
        waypoints -> Jsonb,
        departure_at -> Timestamptz,
        seats_total -> Int2,
        seats_available -> Int2,
        price_per_seat_cents -> Int8,
        status -> Varchar,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        route_id -> Uuid,
        passenger_id -> Uuid,
        seats -> Int2,
        pickup -> Nullable<Jsonb>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        booking_id -> Uuid,
        payer_id -> Uuid,
        payee_id -> Uuid,
        amount_cents -> Int8,
        currency -> Bpchar,
        method -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ratings (id) {
        id -> Uuid,
        route_id -> Uuid,
        rater_id -> Uuid,
        ratee_id -> Uuid,
        score -> Int2,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    stored_files (id) {
        id -> Uuid,
        owner_id -> Uuid,
        purpose -> Varchar,
        original_name -> Varchar,
        stored_name -> Varchar,
        content_type -> Varchar,
        size_bytes -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(driver_profiles -> users (user_id));
diesel::joinable!(passenger_profiles -> users (user_id));
diesel::joinable!(vehicles -> users (owner_id));
diesel::joinable!(routes -> vehicles (vehicle_id));
diesel::joinable!(bookings -> routes (route_id));
diesel::joinable!(payments -> bookings (booking_id));
diesel::joinable!(ratings -> routes (route_id));
diesel::joinable!(stored_files -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    driver_profiles,
    passenger_profiles,
    vehicles,
    routes,
    bookings,
    payments,
    ratings,
    stored_files,
);
