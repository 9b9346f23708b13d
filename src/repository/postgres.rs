//! PostgreSQL catalog store
//!
//! Compound operations run inside one transaction. Rows a new link points at
//! are locked `FOR SHARE` and rows being deleted `FOR UPDATE`, so concurrent
//! link creation and deletion serialize on the entities involved. The unique
//! constraints on the junction tables back up the explicit duplicate checks.

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use super::CatalogStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorInput, Book, BookAuthorLink, BookGenreLink, BookInput, Genre, GenreInput,
    },
};

const BOOK_COLUMNS: &str = "b.id, b.title, b.number_of_pages, b.year";
const AUTHOR_COLUMNS: &str = "a.id, a.full_name, a.country";
const GENRE_COLUMNS: &str = "g.id, g.naming";

/// Catalog store persisted in PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Run pending migrations from `./migrations`
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
    }
}

/// Map a unique violation to a conflict, anything else to a database error
fn conflict_on_unique(err: sqlx::Error, message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message),
        _ => AppError::Database(err),
    }
}

/// Lock a row so it cannot be deleted before the transaction ends.
/// `table` is always one of our own table names.
async fn lock_row(
    conn: &mut PgConnection,
    table: &str,
    id: i64,
    mode: &str,
) -> AppResult<bool> {
    let query = format!("SELECT id FROM {} WHERE id = $1 FOR {}", table, mode);
    let row: Option<i64> = sqlx::query_scalar(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, number_of_pages, year)
            VALUES ($1, $2, $3)
            RETURNING id, title, number_of_pages, year
            "#,
        )
        .bind(&input.title)
        .bind(input.number_of_pages)
        .bind(input.year)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books b WHERE b.id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books b ORDER BY b.id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn update_book(&self, id: i64, input: &BookInput) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, number_of_pages = $2, year = $3
            WHERE id = $4
            RETURNING id, title, number_of_pages, year
            "#,
        )
        .bind(&input.title)
        .bind(input.number_of_pages)
        .bind(input.year)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn delete_book(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "books", id, "UPDATE").await? {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    async fn create_author(&self, input: &AuthorInput) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (full_name, country)
            VALUES ($1, $2)
            RETURNING id, full_name, country
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.country)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    async fn get_author(&self, id: i64) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {} FROM authors a WHERE a.id = $1",
            AUTHOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(&format!(
            "SELECT {} FROM authors a ORDER BY a.id",
            AUTHOR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn update_author(&self, id: i64, input: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET full_name = $1, country = $2
            WHERE id = $3
            RETURNING id, full_name, country
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.country)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn delete_author(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "authors", id, "UPDATE").await? {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }

        sqlx::query("DELETE FROM book_authors WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    async fn create_genre(&self, input: &GenreInput) -> AppResult<Genre> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (naming) VALUES ($1) RETURNING id, naming",
        )
        .bind(&input.naming)
        .fetch_one(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(&format!(
            "SELECT {} FROM genres g WHERE g.id = $1",
            GENRE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(&format!(
            "SELECT {} FROM genres g ORDER BY g.id",
            GENRE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn update_genre(&self, id: i64, input: &GenreInput) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            "UPDATE genres SET naming = $1 WHERE id = $2 RETURNING id, naming",
        )
        .bind(&input.naming)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn delete_genre(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "genres", id, "UPDATE").await? {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }

        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM book_genres WHERE genre_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Err(AppError::Conflict(format!(
                "Genre {} still has books and cannot be deleted",
                id
            )));
        }

        sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // BOOK-AUTHOR LINKS
    // =========================================================================

    async fn add_book_author(&self, book_id: i64, author_id: i64) -> AppResult<BookAuthorLink> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "books", book_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        if !lock_row(&mut tx, "authors", author_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Author {} not found", author_id)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO book_authors (book_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (book_id, author_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(author_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Author {} is already linked to book {}",
                author_id, book_id
            )));
        }

        tx.commit().await?;
        Ok(BookAuthorLink::new(book_id, author_id))
    }

    async fn update_book_author(
        &self,
        book_id: i64,
        author_id: i64,
        new_author_id: i64,
    ) -> AppResult<BookAuthorLink> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "authors", new_author_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Author {} not found", new_author_id)));
        }

        let link_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM book_authors WHERE book_id = $1 AND author_id = $2 FOR UPDATE",
        )
        .bind(book_id)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(link_id) = link_id else {
            return Err(AppError::NotFound(format!(
                "Author {} is not linked to book {}",
                author_id, book_id
            )));
        };

        if new_author_id != author_id {
            let conflict = format!("Author {} is already linked to book {}", new_author_id, book_id);
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM book_authors WHERE book_id = $1 AND author_id = $2)",
            )
            .bind(book_id)
            .bind(new_author_id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(AppError::Conflict(conflict));
            }

            sqlx::query("UPDATE book_authors SET author_id = $1 WHERE id = $2")
                .bind(new_author_id)
                .bind(link_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, conflict))?;
        }

        tx.commit().await?;
        Ok(BookAuthorLink::new(book_id, new_author_id))
    }

    async fn remove_book_author(&self, book_id: i64, author_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_authors WHERE book_id = $1 AND author_id = $2")
            .bind(book_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Author {} is not linked to book {}",
                author_id, book_id
            )));
        }
        Ok(())
    }

    async fn authors_of_book(&self, book_id: i64) -> AppResult<Vec<Author>> {
        if self.get_book(book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        let authors = sqlx::query_as::<_, Author>(&format!(
            r#"
            SELECT {} FROM book_authors ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = $1
            ORDER BY ba.id
            "#,
            AUTHOR_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {} FROM book_authors ba
            JOIN books b ON b.id = ba.book_id
            WHERE ba.author_id = $1
            ORDER BY ba.id
            "#,
            BOOK_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    // =========================================================================
    // BOOK-GENRE LINKS
    // =========================================================================

    async fn add_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<BookGenreLink> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "books", book_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        if !lock_row(&mut tx, "genres", genre_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Genre {} not found", genre_id)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO book_genres (book_id, genre_id)
            VALUES ($1, $2)
            ON CONFLICT (book_id, genre_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(genre_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Book {} already has genre {}",
                book_id, genre_id
            )));
        }

        tx.commit().await?;
        Ok(BookGenreLink::new(book_id, genre_id))
    }

    async fn update_book_genre(
        &self,
        book_id: i64,
        genre_id: i64,
        new_genre_id: i64,
    ) -> AppResult<BookGenreLink> {
        let mut tx = self.pool.begin().await?;

        if !lock_row(&mut tx, "genres", new_genre_id, "SHARE").await? {
            return Err(AppError::NotFound(format!("Genre {} not found", new_genre_id)));
        }

        let link_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM book_genres WHERE book_id = $1 AND genre_id = $2 FOR UPDATE",
        )
        .bind(book_id)
        .bind(genre_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(link_id) = link_id else {
            return Err(AppError::NotFound(format!(
                "Book {} does not have genre {}",
                book_id, genre_id
            )));
        };

        if new_genre_id != genre_id {
            let conflict = format!("Book {} already has genre {}", book_id, new_genre_id);
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM book_genres WHERE book_id = $1 AND genre_id = $2)",
            )
            .bind(book_id)
            .bind(new_genre_id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(AppError::Conflict(conflict));
            }

            sqlx::query("UPDATE book_genres SET genre_id = $1 WHERE id = $2")
                .bind(new_genre_id)
                .bind(link_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, conflict))?;
        }

        tx.commit().await?;
        Ok(BookGenreLink::new(book_id, new_genre_id))
    }

    async fn remove_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_genres WHERE book_id = $1 AND genre_id = $2")
            .bind(book_id)
            .bind(genre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Book {} does not have genre {}",
                book_id, genre_id
            )));
        }
        Ok(())
    }

    async fn genres_of_book(&self, book_id: i64) -> AppResult<Vec<Genre>> {
        if self.get_book(book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        let genres = sqlx::query_as::<_, Genre>(&format!(
            r#"
            SELECT {} FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY bg.id
            "#,
            GENRE_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn books_by_genre(&self, genre_id: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {} FROM book_genres bg
            JOIN books b ON b.id = bg.book_id
            WHERE bg.genre_id = $1
            ORDER BY bg.id
            "#,
            BOOK_COLUMNS
        ))
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
