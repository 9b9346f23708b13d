//! Book-Author and Book-Genre junction models (N:M relationships)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A junction row joining a book to some other catalog entity
pub trait Link: Copy + PartialEq {
    fn book_id(&self) -> i64;
    fn target_id(&self) -> i64;
    fn retarget(&mut self, target_id: i64);
}

/// Junction row linking a book to one of its authors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAuthorLink {
    pub book_id: i64,
    pub author_id: i64,
}

impl BookAuthorLink {
    pub fn new(book_id: i64, author_id: i64) -> Self {
        Self { book_id, author_id }
    }
}

impl Link for BookAuthorLink {
    fn book_id(&self) -> i64 {
        self.book_id
    }

    fn target_id(&self) -> i64 {
        self.author_id
    }

    fn retarget(&mut self, target_id: i64) {
        self.author_id = target_id;
    }
}

/// Junction row linking a book to one of its genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookGenreLink {
    pub book_id: i64,
    pub genre_id: i64,
}

impl BookGenreLink {
    pub fn new(book_id: i64, genre_id: i64) -> Self {
        Self { book_id, genre_id }
    }
}

impl Link for BookGenreLink {
    fn book_id(&self) -> i64 {
        self.book_id
    }

    fn target_id(&self) -> i64 {
        self.genre_id
    }

    fn retarget(&mut self, target_id: i64) {
        self.genre_id = target_id;
    }
}

/// Re-point an existing book-author link to another author
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignAuthor {
    pub author_id: i64,
}

/// Re-point an existing book-genre link to another genre
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignGenre {
    pub genre_id: i64,
}
