//! Author model and request types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// Author stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    /// Full name or alias
    pub full_name: String,
    /// Native country
    pub country: Option<String>,
}

impl Author {
    pub fn new(id: i64, input: AuthorInput) -> Self {
        Self {
            id,
            full_name: input.full_name,
            country: input.country,
        }
    }

    /// Overwrite every mutable field, keeping the id
    pub fn apply(&mut self, input: &AuthorInput) {
        self.full_name = input.full_name.clone();
        self.country = input.country.clone();
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name && self.country == other.country
    }
}

impl Eq for Author {}

impl PartialEq<AuthorInput> for Author {
    fn eq(&self, other: &AuthorInput) -> bool {
        self.full_name == other.full_name && self.country == other.country
    }
}

/// Create / update author request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInput {
    #[validate(
        length(min = 1, max = 200, message = "Author should have a name or alias of at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub full_name: String,
    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    #[serde(default)]
    pub country: Option<String>,
}

impl AuthorInput {
    pub fn new(full_name: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            full_name: full_name.into(),
            country: country.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_id() {
        let a = Author::new(1, AuthorInput::new("Homer", Some("Ancient Greece")));
        let b = Author::new(2, AuthorInput::new("Homer", Some("Ancient Greece")));
        assert_eq!(a, b);
        assert_ne!(a, Author::new(1, AuthorInput::new("Homer", None)));
    }

    #[test]
    fn test_validation_bounds() {
        assert!(AuthorInput::new("George Orwell", Some("Great Britain")).validate().is_ok());
        assert!(AuthorInput::new("Anonymous", None).validate().is_ok());
        assert!(AuthorInput::new("", None).validate().is_err());
        assert!(AuthorInput::new("a".repeat(201), None).validate().is_err());
        assert!(AuthorInput::new("Homer", Some(&"c".repeat(101))).validate().is_err());
    }
}
