use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two managed entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Country,
    City,
}

impl ResourceKind {
    /// Path segment under the API base, e.g. `{base}/country`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::City => "city",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Ids are assigned by the backend on create.
pub type ResourceId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
        }
    }
}

/// One page of a listing as the backend returns it: `{data: [...], total: n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub total: u64,
}
