//! Domain primitives and ports.
//!
//! Purpose: define the harbor entity, its validation rules and the driven
//! ports adapters implement. Nothing here depends on HTTP or Diesel.
//!
//! Public surface:
//! - Harbor, HarborDraft, Unloc, Coordinates: the harbor record model.
//! - validate, ValidationErrors, FieldViolation: field validation.
//! - ports: driven ports such as `HarborRepository`.

pub mod harbor;
pub mod ports;

pub use self::harbor::{
    Coordinates, FieldViolation, Harbor, HarborDraft, Unloc, UnlocValidationError,
    ValidationErrors, validate,
};
