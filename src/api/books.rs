//! Book endpoints, including the book-author and book-genre links

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        Author, Book, BookAuthorLink, BookGenreLink, BookInput, Genre, ReassignAuthor,
        ReassignGenre,
    },
};

use super::{AppJson, AppPath};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.library.list_books().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.library.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.library.create_book(&input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<Json<Book>> {
    let book = state.services.library.update_book(id, &input).await?;
    Ok(Json(book))
}

/// Delete a book and its author and genre links
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    state.services.library.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the authors of a book
#[utoipa::path(
    get,
    path = "/books/{id}/authors",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Authors of the book", body = Vec<Author>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_authors(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.library.authors_of_book(id).await?;
    Ok(Json(authors))
}

/// Link an author to a book
#[utoipa::path(
    post,
    path = "/books/{id}/authors/{author_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("author_id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 201, description = "Author linked", body = BookAuthorLink),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author already linked", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book_author(
    State(state): State<crate::AppState>,
    AppPath((id, author_id)): AppPath<(i64, i64)>,
) -> AppResult<(StatusCode, Json<BookAuthorLink>)> {
    let link = state.services.library.add_book_author(id, author_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Replace one author of a book with another
#[utoipa::path(
    put,
    path = "/books/{id}/authors/{author_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("author_id" = i64, Path, description = "Currently linked author ID")
    ),
    request_body = ReassignAuthor,
    responses(
        (status = 200, description = "Link updated", body = BookAuthorLink),
        (status = 404, description = "Link or new author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "New author already linked", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_author(
    State(state): State<crate::AppState>,
    AppPath((id, author_id)): AppPath<(i64, i64)>,
    AppJson(body): AppJson<ReassignAuthor>,
) -> AppResult<Json<BookAuthorLink>> {
    let link = state
        .services
        .library
        .update_book_author(id, author_id, body.author_id)
        .await?;
    Ok(Json(link))
}

/// Unlink an author from a book
#[utoipa::path(
    delete,
    path = "/books/{id}/authors/{author_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("author_id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author unlinked"),
        (status = 404, description = "Link not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_book_author(
    State(state): State<crate::AppState>,
    AppPath((id, author_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.services.library.remove_book_author(id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the genres of a book
#[utoipa::path(
    get,
    path = "/books/{id}/genres",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Genres of the book", body = Vec<Genre>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_genres(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.library.genres_of_book(id).await?;
    Ok(Json(genres))
}

/// Add a genre to a book
#[utoipa::path(
    post,
    path = "/books/{id}/genres/{genre_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("genre_id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 201, description = "Genre added", body = BookGenreLink),
        (status = 404, description = "Book or genre not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already has this genre", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book_genre(
    State(state): State<crate::AppState>,
    AppPath((id, genre_id)): AppPath<(i64, i64)>,
) -> AppResult<(StatusCode, Json<BookGenreLink>)> {
    let link = state.services.library.add_book_genre(id, genre_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Replace one genre of a book with another
#[utoipa::path(
    put,
    path = "/books/{id}/genres/{genre_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("genre_id" = i64, Path, description = "Currently linked genre ID")
    ),
    request_body = ReassignGenre,
    responses(
        (status = 200, description = "Link updated", body = BookGenreLink),
        (status = 404, description = "Link or new genre not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already has the new genre", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_genre(
    State(state): State<crate::AppState>,
    AppPath((id, genre_id)): AppPath<(i64, i64)>,
    AppJson(body): AppJson<ReassignGenre>,
) -> AppResult<Json<BookGenreLink>> {
    let link = state
        .services
        .library
        .update_book_genre(id, genre_id, body.genre_id)
        .await?;
    Ok(Json(link))
}

/// Remove a genre from a book
#[utoipa::path(
    delete,
    path = "/books/{id}/genres/{genre_id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        ("genre_id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 204, description = "Genre removed"),
        (status = 404, description = "Link not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_book_genre(
    State(state): State<crate::AppState>,
    AppPath((id, genre_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.services.library.remove_book_genre(id, genre_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
