use crate::image_pipeline::fits::header::UnitHeader;

/// Header key holding the observation latitude.
pub const LATITUDE_KEY: &str = "LATOBS";
/// Header key holding the observation longitude.
pub const LONGITUDE_KEY: &str = "LONGOBS";
/// Value written when a location field is missing.
pub const NOT_INFORMED: &str = "Not informed";

/// Where the observation was made. Both fields are free-form text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationMeta {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl ObservationMeta {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
        }
    }

    /// Writes both location cards, using [`NOT_INFORMED`] for missing fields.
    pub fn apply_to(&self, header: &mut UnitHeader) {
        header.set(
            LATITUDE_KEY,
            self.latitude.as_deref().unwrap_or(NOT_INFORMED),
        );
        header.set(
            LONGITUDE_KEY,
            self.longitude.as_deref().unwrap_or(NOT_INFORMED),
        );
    }

    pub fn to_header(&self) -> UnitHeader {
        let mut header = UnitHeader::new();
        self.apply_to(&mut header);
        header
    }
}

/// Adds the location cards that `header` does not already carry.
pub(crate) fn fill_location_defaults(header: &mut UnitHeader) {
    for key in [LATITUDE_KEY, LONGITUDE_KEY] {
        if !header.contains(key) {
            header.set(key, NOT_INFORMED);
        }
    }
}
