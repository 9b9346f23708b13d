//! Data models for Bookshelf

pub mod author;
pub mod book;
pub mod genre;
pub mod link;

// Re-export commonly used types
pub use author::{Author, AuthorInput};
pub use book::{Book, BookInput};
pub use genre::{Genre, GenreInput};
pub use link::{BookAuthorLink, BookGenreLink, Link, ReassignAuthor, ReassignGenre};

use validator::ValidationError;

/// Reject strings made only of whitespace
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
