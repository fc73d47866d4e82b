//! Harbor record model.
//!
//! A harbor is identified by its UN/LOCODE ([`Unloc`]), which always comes
//! from the outer key of the ingestion payload. Decoded entries arrive as a
//! [`HarborDraft`] and become a [`Harbor`] only after passing
//! [`validation::validate`].

pub mod validation;

use std::fmt;

pub use validation::{FieldViolation, ValidationErrors, validate};

/// Validation errors for [`Unloc`] construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnlocValidationError {
    /// The code was empty.
    #[error("harbor code must not be empty")]
    Empty,
}

/// Identifying code of a harbor.
///
/// ## Invariants
/// - never empty.
///
/// # Examples
/// ```
/// use harbor_service::domain::Unloc;
///
/// let unloc = Unloc::new("USLAX").expect("non-empty code");
/// assert_eq!(unloc.as_str(), "USLAX");
/// assert!(Unloc::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unloc(String);

impl Unloc {
    /// Build a code, rejecting empty input.
    pub fn new(value: impl Into<String>) -> Result<Self, UnlocValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(UnlocValidationError::Empty);
        }
        Ok(Self(value))
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Unloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Unloc {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Geographic position as `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
}

/// A validated harbor ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Harbor {
    /// Identifying code, taken from the payload key.
    pub unloc: Unloc,
    pub name: String,
    pub city: String,
    pub country: String,
    /// Alternative names, in submission order.
    pub alias: Vec<String>,
    pub regions: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub province: Option<String>,
    /// IANA time zone name, e.g. `America/Los_Angeles`.
    pub timezone: Option<String>,
    /// Secondary codes associated with the harbor.
    pub unlocs: Vec<String>,
    /// Free-form code. Never used as the identity.
    pub code: Option<String>,
}

/// Decoded harbor fields before validation.
///
/// Required fields are optional here so that every missing field can be
/// reported at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarborDraft {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub alias: Vec<String>,
    pub regions: Vec<String>,
    /// Raw coordinate values. Anything but a pair is stored as absent.
    pub coordinates: Vec<f64>,
    pub province: Option<String>,
    pub timezone: Option<String>,
    pub unlocs: Vec<String>,
    pub code: Option<String>,
}

impl HarborDraft {
    /// Validate the draft and attach its identifying code.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldViolation`] found by [`validate`].
    ///
    /// # Examples
    /// ```
    /// use harbor_service::domain::{HarborDraft, Unloc};
    ///
    /// let draft = HarborDraft {
    ///     name: Some("Los Angeles".into()),
    ///     city: Some("Los Angeles".into()),
    ///     country: Some("USA".into()),
    ///     ..HarborDraft::default()
    /// };
    /// let harbor = draft
    ///     .into_harbor(Unloc::new("USLAX").expect("code"))
    ///     .expect("valid draft");
    /// assert_eq!(harbor.unloc.as_str(), "USLAX");
    /// ```
    pub fn into_harbor(self, unloc: Unloc) -> Result<Harbor, ValidationErrors> {
        validate(&self)?;
        let Self {
            name,
            city,
            country,
            alias,
            regions,
            coordinates,
            province,
            timezone,
            unlocs,
            code,
        } = self;

        let coordinates = match coordinates.as_slice() {
            [longitude, latitude] => Some(Coordinates {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => None,
        };

        Ok(Harbor {
            unloc,
            name: name.unwrap_or_default(),
            city: city.unwrap_or_default(),
            country: country.unwrap_or_default(),
            alias,
            regions,
            coordinates,
            province,
            timezone,
            unlocs,
            code,
        })
    }
}
