//! Genre model and request types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// Genre stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i64,
    pub naming: String,
}

impl Genre {
    pub fn new(id: i64, input: GenreInput) -> Self {
        Self {
            id,
            naming: input.naming,
        }
    }

    pub fn apply(&mut self, input: &GenreInput) {
        self.naming = input.naming.clone();
    }
}

impl PartialEq for Genre {
    fn eq(&self, other: &Self) -> bool {
        self.naming == other.naming
    }
}

impl Eq for Genre {}

impl PartialEq<GenreInput> for Genre {
    fn eq(&self, other: &GenreInput) -> bool {
        self.naming == other.naming
    }
}

/// Create / update genre request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
pub struct GenreInput {
    #[validate(
        length(min = 2, max = 50, message = "Genre naming must be between 2 and 50 characters"),
        custom(function = "not_blank")
    )]
    pub naming: String,
}

impl GenreInput {
    pub fn new(naming: impl Into<String>) -> Self {
        Self {
            naming: naming.into(),
        }
    }
}
