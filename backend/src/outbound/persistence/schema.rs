//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Harbors keyed by their identifying code.
    ///
    /// List-valued fields and the coordinate pair are stored comma-joined in
    /// submission order.
    harbors (unloc) {
        unloc -> Text,
        name -> Text,
        city -> Text,
        country -> Text,
        alias -> Text,
        regions -> Text,
        /// `"longitude,latitude"`, or NULL when absent.
        coordinates -> Nullable<Text>,
        province -> Nullable<Text>,
        timezone -> Nullable<Text>,
        unlocs -> Text,
        code -> Nullable<Text>,
        created_at -> Timestamptz,
        /// Bumped on every upsert.
        updated_at -> Timestamptz,
    }
}
