//! Repository layer: the catalog store and its backends
//!
//! Every backend enforces the catalog invariants itself. Link pairs are
//! unique, links only join existing entities, deleting a book or an author
//! removes its links, and a genre cannot be deleted while a book uses it.
//! Each compound operation is atomic with respect to concurrent callers.

pub mod memory;
pub mod postgres;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        Author, AuthorInput, Book, BookAuthorLink, BookGenreLink, BookInput, Genre, GenreInput,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage contract for books, authors, genres and the links between them.
///
/// Missing entities surface as [`AppError::NotFound`](crate::error::AppError::NotFound),
/// uniqueness and referential violations as
/// [`AppError::Conflict`](crate::error::AppError::Conflict).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the backend is reachable
    async fn ping(&self) -> AppResult<()>;

    // Books
    async fn create_book(&self, input: &BookInput) -> AppResult<Book>;
    async fn get_book(&self, id: i64) -> AppResult<Option<Book>>;
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn update_book(&self, id: i64, input: &BookInput) -> AppResult<Book>;
    /// Delete a book together with all of its author and genre links
    async fn delete_book(&self, id: i64) -> AppResult<()>;

    // Authors
    async fn create_author(&self, input: &AuthorInput) -> AppResult<Author>;
    async fn get_author(&self, id: i64) -> AppResult<Option<Author>>;
    async fn list_authors(&self) -> AppResult<Vec<Author>>;
    async fn update_author(&self, id: i64, input: &AuthorInput) -> AppResult<Author>;
    /// Delete an author together with all of its book links
    async fn delete_author(&self, id: i64) -> AppResult<()>;

    // Genres
    async fn create_genre(&self, input: &GenreInput) -> AppResult<Genre>;
    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>>;
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    async fn update_genre(&self, id: i64, input: &GenreInput) -> AppResult<Genre>;
    /// Delete a genre; refused with a conflict while any book links to it
    async fn delete_genre(&self, id: i64) -> AppResult<()>;

    // Book-Author links
    async fn add_book_author(&self, book_id: i64, author_id: i64) -> AppResult<BookAuthorLink>;
    async fn update_book_author(
        &self,
        book_id: i64,
        author_id: i64,
        new_author_id: i64,
    ) -> AppResult<BookAuthorLink>;
    async fn remove_book_author(&self, book_id: i64, author_id: i64) -> AppResult<()>;
    async fn authors_of_book(&self, book_id: i64) -> AppResult<Vec<Author>>;
    /// Books linked to an author, in link order. Unknown authors yield nothing.
    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>>;

    // Book-Genre links
    async fn add_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<BookGenreLink>;
    async fn update_book_genre(
        &self,
        book_id: i64,
        genre_id: i64,
        new_genre_id: i64,
    ) -> AppResult<BookGenreLink>;
    async fn remove_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<()>;
    async fn genres_of_book(&self, book_id: i64) -> AppResult<Vec<Genre>>;
    /// Books linked to a genre, in link order. Unknown genres yield nothing.
    async fn books_by_genre(&self, genre_id: i64) -> AppResult<Vec<Book>>;
}

/// Shared handle on the configured catalog store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn CatalogStore>,
}

impl Repository {
    /// Create a repository over an arbitrary store
    pub fn new(store: impl CatalogStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a repository backed by a fresh in-memory catalog
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Create a repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(PgStore::new(pool))
    }
}

impl Deref for Repository {
    type Target = dyn CatalogStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}
