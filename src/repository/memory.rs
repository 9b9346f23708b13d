//! In-memory catalog store
//!
//! The whole catalog sits behind one [`RwLock`], so every compound operation
//! (check-then-insert for links, cascade for deletes) runs under a single
//! write guard and is never observed half done.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorInput, Book, BookAuthorLink, BookGenreLink, BookInput, Genre, GenreInput,
        Link,
    },
};

#[derive(Debug, Default)]
struct Catalog {
    books: Vec<Book>,
    authors: Vec<Author>,
    genres: Vec<Genre>,
    book_authors: Vec<BookAuthorLink>,
    book_genres: Vec<BookGenreLink>,
    last_book_id: i64,
    last_author_id: i64,
    last_genre_id: i64,
}

impl Catalog {
    fn book(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    fn author(&self, id: i64) -> Option<&Author> {
        self.authors.iter().find(|a| a.id == id)
    }

    fn genre(&self, id: i64) -> Option<&Genre> {
        self.genres.iter().find(|g| g.id == id)
    }

    fn require_book(&self, id: i64) -> AppResult<()> {
        self.book(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    fn require_author(&self, id: i64) -> AppResult<()> {
        self.author(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    fn require_genre(&self, id: i64) -> AppResult<()> {
        self.genre(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    /// Resolve linked books in link order, skipping links to missing books
    fn linked_books<L: Link>(&self, links: &[L], target_id: i64) -> Vec<Book> {
        links
            .iter()
            .filter(|l| l.target_id() == target_id)
            .filter_map(|l| self.book(l.book_id()).cloned())
            .collect()
    }
}

/// Append a link unless the same pair is already present
fn insert_link<L: Link>(links: &mut Vec<L>, link: L) -> bool {
    if links.contains(&link) {
        return false;
    }
    links.push(link);
    true
}

/// Remove the exact pair, reporting whether it was present
fn remove_link<L: Link>(links: &mut Vec<L>, link: L) -> bool {
    match links.iter().position(|l| *l == link) {
        Some(index) => {
            links.remove(index);
            true
        }
        None => false,
    }
}

/// Outcome of re-pointing a link at a new target
enum Retarget<L> {
    Done(L),
    MissingLink,
    Occupied,
}

fn retarget_link<L: Link>(links: &mut [L], link: L, new_target: i64) -> Retarget<L> {
    let Some(index) = links.iter().position(|l| *l == link) else {
        return Retarget::MissingLink;
    };
    if new_target == link.target_id() {
        return Retarget::Done(link);
    }
    if links
        .iter()
        .any(|l| l.book_id() == link.book_id() && l.target_id() == new_target)
    {
        return Retarget::Occupied;
    }
    links[index].retarget(new_target);
    Retarget::Done(links[index])
}

/// Catalog store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        let mut catalog = self.catalog.write().await;
        catalog.last_book_id += 1;
        let book = Book::new(catalog.last_book_id, input.clone());
        catalog.books.push(book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.catalog.read().await.book(id).cloned())
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.catalog.read().await.books.clone())
    }

    async fn update_book(&self, id: i64, input: &BookInput) -> AppResult<Book> {
        let mut catalog = self.catalog.write().await;
        let book = catalog
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        book.apply(input);
        Ok(book.clone())
    }

    async fn delete_book(&self, id: i64) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        let index = catalog
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        catalog.books.remove(index);
        catalog.book_authors.retain(|l| l.book_id != id);
        catalog.book_genres.retain(|l| l.book_id != id);
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    async fn create_author(&self, input: &AuthorInput) -> AppResult<Author> {
        let mut catalog = self.catalog.write().await;
        catalog.last_author_id += 1;
        let author = Author::new(catalog.last_author_id, input.clone());
        catalog.authors.push(author.clone());
        Ok(author)
    }

    async fn get_author(&self, id: i64) -> AppResult<Option<Author>> {
        Ok(self.catalog.read().await.author(id).cloned())
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        Ok(self.catalog.read().await.authors.clone())
    }

    async fn update_author(&self, id: i64, input: &AuthorInput) -> AppResult<Author> {
        let mut catalog = self.catalog.write().await;
        let author = catalog
            .authors
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        author.apply(input);
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i64) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        let index = catalog
            .authors
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        catalog.authors.remove(index);
        catalog.book_authors.retain(|l| l.author_id != id);
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    async fn create_genre(&self, input: &GenreInput) -> AppResult<Genre> {
        let mut catalog = self.catalog.write().await;
        catalog.last_genre_id += 1;
        let genre = Genre::new(catalog.last_genre_id, input.clone());
        catalog.genres.push(genre.clone());
        Ok(genre)
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        Ok(self.catalog.read().await.genre(id).cloned())
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.catalog.read().await.genres.clone())
    }

    async fn update_genre(&self, id: i64, input: &GenreInput) -> AppResult<Genre> {
        let mut catalog = self.catalog.write().await;
        let genre = catalog
            .genres
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
        genre.apply(input);
        Ok(genre.clone())
    }

    async fn delete_genre(&self, id: i64) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        let index = catalog
            .genres
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
        if catalog.book_genres.iter().any(|l| l.genre_id == id) {
            return Err(AppError::Conflict(format!(
                "Genre {} still has books and cannot be deleted",
                id
            )));
        }
        catalog.genres.remove(index);
        Ok(())
    }

    // =========================================================================
    // BOOK-AUTHOR LINKS
    // =========================================================================

    async fn add_book_author(&self, book_id: i64, author_id: i64) -> AppResult<BookAuthorLink> {
        let mut catalog = self.catalog.write().await;
        catalog.require_book(book_id)?;
        catalog.require_author(author_id)?;
        let link = BookAuthorLink::new(book_id, author_id);
        if !insert_link(&mut catalog.book_authors, link) {
            return Err(AppError::Conflict(format!(
                "Author {} is already linked to book {}",
                author_id, book_id
            )));
        }
        Ok(link)
    }

    async fn update_book_author(
        &self,
        book_id: i64,
        author_id: i64,
        new_author_id: i64,
    ) -> AppResult<BookAuthorLink> {
        let mut catalog = self.catalog.write().await;
        catalog.require_author(new_author_id)?;
        let link = BookAuthorLink::new(book_id, author_id);
        match retarget_link(&mut catalog.book_authors, link, new_author_id) {
            Retarget::Done(link) => Ok(link),
            Retarget::MissingLink => Err(AppError::NotFound(format!(
                "Author {} is not linked to book {}",
                author_id, book_id
            ))),
            Retarget::Occupied => Err(AppError::Conflict(format!(
                "Author {} is already linked to book {}",
                new_author_id, book_id
            ))),
        }
    }

    async fn remove_book_author(&self, book_id: i64, author_id: i64) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        if !remove_link(&mut catalog.book_authors, BookAuthorLink::new(book_id, author_id)) {
            return Err(AppError::NotFound(format!(
                "Author {} is not linked to book {}",
                author_id, book_id
            )));
        }
        Ok(())
    }

    async fn authors_of_book(&self, book_id: i64) -> AppResult<Vec<Author>> {
        let catalog = self.catalog.read().await;
        catalog.require_book(book_id)?;
        Ok(catalog
            .book_authors
            .iter()
            .filter(|l| l.book_id == book_id)
            .filter_map(|l| catalog.author(l.author_id).cloned())
            .collect())
    }

    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.linked_books(&catalog.book_authors, author_id))
    }

    // =========================================================================
    // BOOK-GENRE LINKS
    // =========================================================================

    async fn add_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<BookGenreLink> {
        let mut catalog = self.catalog.write().await;
        catalog.require_book(book_id)?;
        catalog.require_genre(genre_id)?;
        let link = BookGenreLink::new(book_id, genre_id);
        if !insert_link(&mut catalog.book_genres, link) {
            return Err(AppError::Conflict(format!(
                "Book {} already has genre {}",
                book_id, genre_id
            )));
        }
        Ok(link)
    }

    async fn update_book_genre(
        &self,
        book_id: i64,
        genre_id: i64,
        new_genre_id: i64,
    ) -> AppResult<BookGenreLink> {
        let mut catalog = self.catalog.write().await;
        catalog.require_genre(new_genre_id)?;
        let link = BookGenreLink::new(book_id, genre_id);
        match retarget_link(&mut catalog.book_genres, link, new_genre_id) {
            Retarget::Done(link) => Ok(link),
            Retarget::MissingLink => Err(AppError::NotFound(format!(
                "Book {} does not have genre {}",
                book_id, genre_id
            ))),
            Retarget::Occupied => Err(AppError::Conflict(format!(
                "Book {} already has genre {}",
                book_id, new_genre_id
            ))),
        }
    }

    async fn remove_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        if !remove_link(&mut catalog.book_genres, BookGenreLink::new(book_id, genre_id)) {
            return Err(AppError::NotFound(format!(
                "Book {} does not have genre {}",
                book_id, genre_id
            )));
        }
        Ok(())
    }

    async fn genres_of_book(&self, book_id: i64) -> AppResult<Vec<Genre>> {
        let catalog = self.catalog.read().await;
        catalog.require_book(book_id)?;
        Ok(catalog
            .book_genres
            .iter()
            .filter(|l| l.book_id == book_id)
            .filter_map(|l| catalog.genre(l.genre_id).cloned())
            .collect())
    }

    async fn books_by_genre(&self, genre_id: i64) -> AppResult<Vec<Book>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.linked_books(&catalog.book_genres, genre_id))
    }
}
