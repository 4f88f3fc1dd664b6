use thiserror::Error;

mod city;
mod country;
mod flag;
mod resource;

pub use city::{City, CityPayload};
pub use country::{Country, CountryPayload};
pub use flag::Flag;
pub use resource::{Page, PageRequest, ResourceId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Required-field check a payload must pass before it is allowed to
/// reach a resource client.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}
