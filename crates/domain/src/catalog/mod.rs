//! Book catalog service.

use common::{Book, BookId};
use serde::Deserialize;
use store::{BookStore, BookUpdate, NewBook, StoreError};

use crate::error::{DomainError, Result};
use crate::pagination::{Page, PageRequest};

/// Book fields accepted on create and update.
///
/// On update, a missing `cover_image` keeps the stored one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub old_price: f64,
    #[serde(default)]
    pub new_price: f64,
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl BookInput {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title is required".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::Validation("category is required".to_string()));
        }
        for (field, price) in [("old_price", self.old_price), ("new_price", self.new_price)] {
            if !price.is_finite() || price < 0.0 {
                return Err(DomainError::Validation(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Landing-page selection: one page of trending books, plus every
/// non-trending book not already shown.
///
/// Page counts refer to the trending list.
#[derive(Debug, Clone)]
pub struct HomeBooks {
    pub top_sellers: Page<Book>,
    pub recommended: Vec<Book>,
}

/// Catalog reads and admin maintenance.
#[derive(Clone)]
pub struct BookService<S: BookStore> {
    store: S,
}

impl<S: BookStore> BookService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self, page: i64, page_size: i64) -> Result<Page<Book>> {
        let request = PageRequest::new(page, page_size)?;
        let (books, total) = self.store.list_books(request.query()).await?;
        Ok(Page::new(books, total, request))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, id: BookId) -> Result<Book> {
        Ok(self.store.get_book(id).await?)
    }

    /// Trending books as top sellers, everything else as recommendations.
    #[tracing::instrument(skip(self))]
    pub async fn home_books(&self, page: i64, page_size: i64) -> Result<HomeBooks> {
        let request = PageRequest::new(page, page_size)?;
        let (trending, total) = self.store.list_trending_books(request.query()).await?;
        let shown: Vec<BookId> = trending.iter().map(|b| b.id).collect();
        let recommended = self.store.list_recommended_books(&shown).await?;

        Ok(HomeBooks {
            top_sellers: Page::new(trending, total, request),
            recommended,
        })
    }

    #[tracing::instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_book(&self, input: BookInput) -> Result<Book> {
        input.validate()?;
        let book = self
            .store
            .create_book(NewBook {
                title: input.title.trim().to_string(),
                description: input.description,
                category: input.category.trim().to_string(),
                trending: input.trending,
                old_price: input.old_price,
                new_price: input.new_price,
                cover_image: input.cover_image.unwrap_or_default(),
            })
            .await?;

        tracing::info!(book_id = %book.id, "Book created");
        Ok(book)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_book(&self, id: BookId, input: BookInput) -> Result<Book> {
        input.validate()?;
        Ok(self
            .store
            .update_book(
                id,
                BookUpdate {
                    title: input.title.trim().to_string(),
                    description: input.description,
                    category: input.category.trim().to_string(),
                    trending: input.trending,
                    old_price: input.old_price,
                    new_price: input.new_price,
                    cover_image: input.cover_image,
                },
            )
            .await?)
    }

    /// Removes a book. Books that appear on any order cannot be removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, id: BookId) -> Result<()> {
        self.store.delete_book(id).await.map_err(|e| match e {
            StoreError::InUse { .. } => {
                DomainError::Validation(format!("book {id} is referenced by existing orders"))
            }
            other => DomainError::from(other),
        })
    }

    /// Inserts a small starter catalog when the catalog is empty.
    ///
    /// Returns the number of books inserted.
    #[tracing::instrument(skip(self))]
    pub async fn seed_defaults(&self) -> Result<usize> {
        if self.store.count_books().await? > 0 {
            return Ok(0);
        }

        let defaults = [
            NewBook {
                title: "How to Grow Your Online Store".to_string(),
                description: "Learn the best strategies to grow your online store.".to_string(),
                category: "business".to_string(),
                trending: true,
                old_price: 29.99,
                new_price: 19.99,
                cover_image: "book-1.png".to_string(),
            },
            NewBook {
                title: "Top 10 Fiction Books This Year".to_string(),
                description: "A curated list of the best fiction books this year.".to_string(),
                category: "fiction".to_string(),
                trending: false,
                old_price: 24.99,
                new_price: 14.99,
                cover_image: "book-2.png".to_string(),
            },
        ];

        let count = defaults.len();
        for book in defaults {
            self.store.create_book(book).await?;
        }
        tracing::info!(count, "Seeded default catalog");
        Ok(count)
    }
}
