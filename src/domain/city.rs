use serde::{Deserialize, Serialize};

use super::{ResourceId, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: ResourceId,
    pub name: String,
    #[serde(rename = "countryId")]
    pub country_id: ResourceId,
}

/// Body of a city create/update request. `country_id` is optional here so
/// an unfilled form field is caught by validation rather than serialized
/// as a default; referential validity is the backend's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPayload {
    pub name: String,
    #[serde(rename = "countryId", skip_serializing_if = "Option::is_none")]
    pub country_id: Option<ResourceId>,
}

impl Validate for CityPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.country_id.is_none() {
            return Err(ValidationError::MissingField("countryId"));
        }
        Ok(())
    }
}
