//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, genres, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Library catalog REST API for books, authors and genres",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_book_authors,
        books::add_book_author,
        books::update_book_author,
        books::remove_book_author,
        books::list_book_genres,
        books::add_book_genre,
        books::update_book_genre,
        books::remove_book_genre,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        authors::list_author_books,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        genres::list_genre_books,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::BookInput,
            crate::models::Author,
            crate::models::AuthorInput,
            crate::models::Genre,
            crate::models::GenreInput,
            crate::models::BookAuthorLink,
            crate::models::BookGenreLink,
            crate::models::ReassignAuthor,
            crate::models::ReassignGenre,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Books and their author/genre links"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
