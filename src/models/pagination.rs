//! Page-number pagination shared by all listings

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{author::Author, book::BookShort, book_instance::BorrowedInstance},
};

/// `?page=N` query parameter, 1-based
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// Resolved slice of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
}

impl PageWindow {
    /// Resolve the requested page against the total count.
    ///
    /// Page 1 of an empty listing exists; any other page outside
    /// `1..=num_pages` is not found.
    pub fn resolve(page: Option<i64>, per_page: i64, total: i64) -> AppResult<Self> {
        let per_page = per_page.max(1);
        let page = page.unwrap_or(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        if page < 1 || page > num_pages {
            return Err(AppError::NotFound(format!("Invalid page {}", page)));
        }

        Ok(Self { page, per_page, num_pages })
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PaginatedAuthors = Paginated<Author>,
    PaginatedBooks = Paginated<BookShort>,
    PaginatedInstances = Paginated<BorrowedInstance>
)]
pub struct Paginated<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Records of the current page
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub per_page: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Paginated<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            num_pages: window.num_pages,
            has_next: window.page < window.num_pages,
            has_previous: window.page > 1,
        }
    }
}
