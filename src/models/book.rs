//! Book model and request types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// Book stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub number_of_pages: i32,
    /// Year of publication, negative for BC
    pub year: Option<i32>,
}

impl Book {
    pub fn new(id: i64, input: BookInput) -> Self {
        Self {
            id,
            title: input.title,
            number_of_pages: input.number_of_pages,
            year: input.year,
        }
    }

    /// Overwrite every mutable field, keeping the id
    pub fn apply(&mut self, input: &BookInput) {
        self.title = input.title.clone();
        self.number_of_pages = input.number_of_pages;
        self.year = input.year;
    }
}

/// Books compare by content; the id is not part of equality.
impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.number_of_pages == other.number_of_pages
            && self.year == other.year
    }
}

impl Eq for Book {}

impl PartialEq<BookInput> for Book {
    fn eq(&self, other: &BookInput) -> bool {
        self.title == other.title
            && self.number_of_pages == other.number_of_pages
            && self.year == other.year
    }
}

/// Create / update book request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[validate(
        length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
    #[validate(range(min = 1, max = 2500, message = "Number of pages must be between 1 and 2500"))]
    pub number_of_pages: i32,
    #[validate(range(min = -2000, max = 2018, message = "Year must be between -2000 and 2018"))]
    #[serde(default)]
    pub year: Option<i32>,
}

impl BookInput {
    pub fn new(title: impl Into<String>, number_of_pages: i32, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            number_of_pages,
            year,
        }
    }
}
