//! Error taxonomy shared by the store, the recommender and the HTTP layer

use thiserror::Error;

use crate::models::EntityId;

pub type Result<T> = std::result::Result<T, CareError>;

#[derive(Debug, Error)]
pub enum CareError {
    #[error("Location {0} not found")]
    LocationNotFound(EntityId),

    #[error("Plant {0} not found")]
    PlantNotFound(EntityId),

    #[error("Reading {0} not found")]
    ReadingNotFound(EntityId),

    /// A create referenced a parent that does not exist. Nothing was written.
    #[error("{entity} {id} not found")]
    InvalidReference { entity: &'static str, id: EntityId },

    #[error("Location {id} is still referenced by {plants} plant(s)")]
    LocationInUse { id: EntityId, plants: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CareError {
    /// Client-facing not-found category (includes unresolved references)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CareError::LocationNotFound(_)
                | CareError::PlantNotFound(_)
                | CareError::ReadingNotFound(_)
                | CareError::InvalidReference { .. }
        )
    }
}

#[cfg(feature = "durable")]
impl From<duckdb::Error> for CareError {
    fn from(e: duckdb::Error) -> Self {
        CareError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_category() {
        assert!(CareError::PlantNotFound(4).is_not_found());
        assert!(CareError::InvalidReference { entity: "Location", id: 9 }.is_not_found());
        assert!(!CareError::Storage("disk full".to_string()).is_not_found());
        assert!(!CareError::LocationInUse { id: 1, plants: 2 }.is_not_found());
    }

    #[test]
    fn test_messages() {
        assert_eq!(CareError::PlantNotFound(7).to_string(), "Plant 7 not found");
        assert_eq!(
            CareError::InvalidReference { entity: "Location", id: 3 }.to_string(),
            "Location 3 not found"
        );
    }
}
