use serde::{Deserialize, Serialize};

use super::{Flag, ResourceId, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: ResourceId,
    pub name: String,
    pub flag: Flag,
}

/// Body of a country create/update request. The id is never part of the
/// payload; the backend assigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryPayload {
    pub name: String,
    pub flag: Flag,
}

impl Validate for CountryPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.flag.file_name.trim().is_empty() {
            return Err(ValidationError::MissingField("flag.file_name"));
        }
        if self.flag.file_content.is_empty() {
            return Err(ValidationError::MissingField("flag.file_content"));
        }
        if self.flag.file_extension.trim().is_empty() {
            return Err(ValidationError::MissingField("flag.file_extension"));
        }
        Ok(())
    }
}
