//! Internal Diesel row structs for the `harbors` table.
//!
//! These types never leave the persistence layer. Conversion to and from
//! the domain [`Harbor`] lives here so the encoding of list fields is kept
//! in one place.

use diesel::prelude::*;

use super::schema::harbors;
use crate::domain::ports::HarborRepositoryError;
use crate::domain::{Coordinates, Harbor, Unloc};

const LIST_SEPARATOR: char = ',';

/// Row struct for reading from the harbors table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = harbors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HarborRow {
    pub unloc: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub alias: String,
    pub regions: String,
    pub coordinates: Option<String>,
    pub province: Option<String>,
    pub timezone: Option<String>,
    pub unlocs: String,
    pub code: Option<String>,
}

/// Insertable struct for writing a harbor.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = harbors)]
pub(crate) struct NewHarborRow<'a> {
    pub unloc: &'a str,
    pub name: &'a str,
    pub city: &'a str,
    pub country: &'a str,
    pub alias: String,
    pub regions: String,
    pub coordinates: Option<String>,
    pub province: Option<&'a str>,
    pub timezone: Option<&'a str>,
    pub unlocs: String,
    pub code: Option<&'a str>,
}

fn join_list(values: &[String]) -> String {
    values.join(",")
}

fn split_list(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(LIST_SEPARATOR).map(str::to_owned).collect()
}

fn encode_coordinates(coordinates: Coordinates) -> String {
    format!(
        "{}{LIST_SEPARATOR}{}",
        coordinates.longitude, coordinates.latitude
    )
}

fn decode_coordinates(stored: &str) -> Result<Coordinates, HarborRepositoryError> {
    let invalid = || HarborRepositoryError::query(format!("invalid stored coordinates: {stored}"));
    let (longitude, latitude) = stored.split_once(LIST_SEPARATOR).ok_or_else(invalid)?;
    Ok(Coordinates {
        longitude: longitude.parse().map_err(|_| invalid())?,
        latitude: latitude.parse().map_err(|_| invalid())?,
    })
}

impl<'a> From<&'a Harbor> for NewHarborRow<'a> {
    fn from(harbor: &'a Harbor) -> Self {
        Self {
            unloc: harbor.unloc.as_str(),
            name: &harbor.name,
            city: &harbor.city,
            country: &harbor.country,
            alias: join_list(&harbor.alias),
            regions: join_list(&harbor.regions),
            coordinates: harbor.coordinates.map(encode_coordinates),
            province: harbor.province.as_deref(),
            timezone: harbor.timezone.as_deref(),
            unlocs: join_list(&harbor.unlocs),
            code: harbor.code.as_deref(),
        }
    }
}

impl TryFrom<HarborRow> for Harbor {
    type Error = HarborRepositoryError;

    fn try_from(row: HarborRow) -> Result<Self, Self::Error> {
        let unloc = Unloc::new(row.unloc)
            .map_err(|err| HarborRepositoryError::query(format!("invalid stored code: {err}")))?;
        let coordinates = row
            .coordinates
            .as_deref()
            .map(decode_coordinates)
            .transpose()?;

        Ok(Self {
            unloc,
            name: row.name,
            city: row.city,
            country: row.country,
            alias: split_list(&row.alias),
            regions: split_list(&row.regions),
            coordinates,
            province: row.province,
            timezone: row.timezone,
            unlocs: split_list(&row.unlocs),
            code: row.code,
        })
    }
}
