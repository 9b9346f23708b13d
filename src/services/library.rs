//! Library catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorInput, Book, BookAuthorLink, BookGenreLink, BookInput, Genre, GenreInput,
    },
    repository::Repository,
};

/// Ids are strictly positive; anything else cannot name a stored entity.
fn require_id(kind: &str, id: i64) -> AppResult<()> {
    if id <= 0 {
        return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LibraryService {
    repository: Repository,
}

impl LibraryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check that the underlying store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        let book = self.repository.create_book(input).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        require_id("Book", id)?;
        self.repository
            .get_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.list_books().await
    }

    pub async fn update_book(&self, id: i64, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        require_id("Book", id)?;
        let book = self.repository.update_book(id, input).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(book)
    }

    /// Delete a book and every link that references it
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        require_id("Book", id)?;
        self.repository.delete_book(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn create_author(&self, input: &AuthorInput) -> AppResult<Author> {
        input.validate()?;
        let author = self.repository.create_author(input).await?;
        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Author> {
        require_id("Author", id)?;
        self.repository
            .get_author(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.list_authors().await
    }

    pub async fn update_author(&self, id: i64, input: &AuthorInput) -> AppResult<Author> {
        input.validate()?;
        require_id("Author", id)?;
        let author = self.repository.update_author(id, input).await?;
        tracing::info!(author_id = id, "Author updated");
        Ok(author)
    }

    /// Delete an author and every link to their books
    pub async fn delete_author(&self, id: i64) -> AppResult<()> {
        require_id("Author", id)?;
        self.repository.delete_author(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn create_genre(&self, input: &GenreInput) -> AppResult<Genre> {
        input.validate()?;
        let genre = self.repository.create_genre(input).await?;
        tracing::info!(genre_id = genre.id, naming = %genre.naming, "Genre created");
        Ok(genre)
    }

    pub async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        require_id("Genre", id)?;
        self.repository
            .get_genre(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.list_genres().await
    }

    pub async fn update_genre(&self, id: i64, input: &GenreInput) -> AppResult<Genre> {
        input.validate()?;
        require_id("Genre", id)?;
        let genre = self.repository.update_genre(id, input).await?;
        tracing::info!(genre_id = id, "Genre updated");
        Ok(genre)
    }

    /// Delete a genre that no book uses any more
    pub async fn delete_genre(&self, id: i64) -> AppResult<()> {
        require_id("Genre", id)?;
        match self.repository.delete_genre(id).await {
            Ok(()) => {
                tracing::info!(genre_id = id, "Genre deleted");
                Ok(())
            }
            Err(e @ AppError::Conflict(_)) => {
                tracing::warn!(genre_id = id, "Genre delete refused: still referenced");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // BOOK-AUTHOR LINKS
    // =========================================================================

    pub async fn add_book_author(&self, book_id: i64, author_id: i64) -> AppResult<BookAuthorLink> {
        require_id("Book", book_id)?;
        require_id("Author", author_id)?;
        let link = self.repository.add_book_author(book_id, author_id).await?;
        tracing::info!(book_id, author_id, "Author linked to book");
        Ok(link)
    }

    pub async fn update_book_author(
        &self,
        book_id: i64,
        author_id: i64,
        new_author_id: i64,
    ) -> AppResult<BookAuthorLink> {
        require_id("Book", book_id)?;
        require_id("Author", author_id)?;
        require_id("Author", new_author_id)?;
        let link = self
            .repository
            .update_book_author(book_id, author_id, new_author_id)
            .await?;
        tracing::info!(book_id, author_id, new_author_id, "Book author reassigned");
        Ok(link)
    }

    pub async fn remove_book_author(&self, book_id: i64, author_id: i64) -> AppResult<()> {
        require_id("Book", book_id)?;
        require_id("Author", author_id)?;
        self.repository.remove_book_author(book_id, author_id).await?;
        tracing::info!(book_id, author_id, "Author unlinked from book");
        Ok(())
    }

    pub async fn authors_of_book(&self, book_id: i64) -> AppResult<Vec<Author>> {
        require_id("Book", book_id)?;
        self.repository.authors_of_book(book_id).await
    }

    /// Books written by an author, in the order they were linked
    pub async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        if author_id <= 0 {
            return Ok(Vec::new());
        }
        self.repository.books_by_author(author_id).await
    }

    // =========================================================================
    // BOOK-GENRE LINKS
    // =========================================================================

    pub async fn add_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<BookGenreLink> {
        require_id("Book", book_id)?;
        require_id("Genre", genre_id)?;
        let link = self.repository.add_book_genre(book_id, genre_id).await?;
        tracing::info!(book_id, genre_id, "Genre added to book");
        Ok(link)
    }

    pub async fn update_book_genre(
        &self,
        book_id: i64,
        genre_id: i64,
        new_genre_id: i64,
    ) -> AppResult<BookGenreLink> {
        require_id("Book", book_id)?;
        require_id("Genre", genre_id)?;
        require_id("Genre", new_genre_id)?;
        let link = self
            .repository
            .update_book_genre(book_id, genre_id, new_genre_id)
            .await?;
        tracing::info!(book_id, genre_id, new_genre_id, "Book genre reassigned");
        Ok(link)
    }

    pub async fn remove_book_genre(&self, book_id: i64, genre_id: i64) -> AppResult<()> {
        require_id("Book", book_id)?;
        require_id("Genre", genre_id)?;
        self.repository.remove_book_genre(book_id, genre_id).await?;
        tracing::info!(book_id, genre_id, "Genre removed from book");
        Ok(())
    }

    pub async fn genres_of_book(&self, book_id: i64) -> AppResult<Vec<Genre>> {
        require_id("Book", book_id)?;
        self.repository.genres_of_book(book_id).await
    }

    /// Books of a genre, in the order they were linked
    pub async fn books_by_genre(&self, genre_id: i64) -> AppResult<Vec<Book>> {
        if genre_id <= 0 {
            return Ok(Vec::new());
        }
        self.repository.books_by_genre(genre_id).await
    }

    // =========================================================================
    // SAMPLE DATA
    // =========================================================================

    /// Load the sample catalog into an empty store.
    ///
    /// Returns `false` without touching anything when books already exist.
    pub async fn seed_sample_catalog(&self) -> AppResult<bool> {
        if !self.repository.list_books().await?.is_empty() {
            tracing::debug!("Catalog already populated, sample data skipped");
            return Ok(false);
        }

        let mut books = Vec::new();
        for (title, pages, year) in [
            ("451 fahrenheit", 158, 1953),
            ("1984", 328, 1949),
            ("Odyssey", 800, -800),
            ("Dandelion wine", 164, 1957),
            ("Folk tails", 160, 1890),
        ] {
            books.push(self.create_book(&BookInput::new(title, pages, Some(year))).await?);
        }

        let mut authors = Vec::new();
        for (name, country) in [
            ("Ray Bradbury", "USA"),
            ("George Orwell", "Great Britain"),
            ("Homer", "Ancient Greece"),
        ] {
            authors.push(self.create_author(&AuthorInput::new(name, Some(country))).await?);
        }

        let mut genres = Vec::new();
        for naming in ["Dystopia", "Fiction", "Epos", "Fairy tail"] {
            genres.push(self.create_genre(&GenreInput::new(naming)).await?);
        }

        for (book, author) in [(0, 0), (1, 1), (2, 2), (3, 0)] {
            self.add_book_author(books[book].id, authors[author].id).await?;
        }
        for (book, genre) in [(0, 0), (0, 1), (1, 0), (2, 2), (4, 3)] {
            self.add_book_genre(books[book].id, genres[genre].id).await?;
        }

        tracing::info!(
            books = books.len(),
            authors = authors.len(),
            genres = genres.len(),
            "Sample catalog loaded"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCatalogStore;

    fn service_with(store: MockCatalogStore) -> LibraryService {
        LibraryService::new(Repository::new(store))
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        // No expectations: any store call would panic
        let service = service_with(MockCatalogStore::new());

        let err = service
            .create_book(&BookInput::new("", 0, Some(3000)))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("title"));
                assert!(msg.contains("number_of_pages"));
                assert!(msg.contains("year"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = service
            .update_genre(1, &GenreInput::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_positive_ids_are_not_found() {
        let service = service_with(MockCatalogStore::new());

        assert!(matches!(service.get_book(0).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete_author(-1).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.add_book_genre(1, 0).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.books_by_author(0).await.unwrap().is_empty());
        assert!(service.books_by_genre(-2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_book_maps_to_not_found() {
        let mut store = MockCatalogStore::new();
        store
            .expect_get_book()
            .withf(|id| *id == 42)
            .times(1)
            .returning(|_| Ok(None));
        let service = service_with(store);

        let err = service.get_book(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_conflicts_are_passed_through() {
        let mut store = MockCatalogStore::new();
        store
            .expect_add_book_author()
            .withf(|book, author| *book == 1 && *author == 1)
            .times(1)
            .returning(|_, _| Err(AppError::Conflict("duplicate".into())));
        store
            .expect_delete_genre()
            .times(1)
            .returning(|_| Err(AppError::Conflict("in use".into())));
        let service = service_with(store);

        assert!(matches!(
            service.add_book_author(1, 1).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(service.delete_genre(1).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_seed_skips_populated_catalog() {
        let mut store = MockCatalogStore::new();
        store.expect_list_books().times(1).returning(|| {
            Ok(vec![Book::new(1, BookInput::new("1984", 328, Some(1949)))])
        });
        let service = service_with(store);

        assert!(!service.seed_sample_catalog().await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_sample_catalog() {
        let service = LibraryService::new(Repository::in_memory());
        assert!(service.seed_sample_catalog().await.unwrap());

        assert_eq!(service.list_books().await.unwrap().len(), 5);
        assert_eq!(service.list_authors().await.unwrap().len(), 3);
        assert_eq!(service.list_genres().await.unwrap().len(), 4);

        let bradbury: Vec<String> = service
            .books_by_author(1)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(bradbury, ["451 fahrenheit", "Dandelion wine"]);
        assert_eq!(service.books_by_genre(1).await.unwrap().len(), 2);

        // Seeding twice is a no-op
        assert!(!service.seed_sample_catalog().await.unwrap());
        assert_eq!(service.list_books().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_orwell_scenario() {
        let service = LibraryService::new(Repository::in_memory());
        let book = service
            .create_book(&BookInput::new("1984", 328, Some(1949)))
            .await
            .unwrap();
        let author = service
            .create_author(&AuthorInput::new("George Orwell", Some("Great Britain")))
            .await
            .unwrap();
        assert_eq!((book.id, author.id), (1, 1));

        service.add_book_author(1, 1).await.unwrap();
        assert!(matches!(
            service.add_book_author(1, 1).await,
            Err(AppError::Conflict(_))
        ));

        let books = service.books_by_author(1).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);
    }
}
