//! Cursor pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated listing.
///
/// `next_cursor` is `None` exactly when the listing is exhausted; a caller
/// that feeds it back gets the following page without gaps or repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPage<T, C> {
    /// Items in listing order
    pub items: Vec<T>,
    /// Cursor of the next page
    pub next_cursor: Option<C>,
}

impl<T, C> CursorPage<T, C> {
    pub fn new(items: Vec<T>, next_cursor: Option<C>) -> Self {
        Self { items, next_cursor }
    }

    /// An exhausted, empty page
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Build a page from a query that fetched up to `limit + 1` rows.
    ///
    /// When the extra row is present it is dropped and the cursor points at
    /// the last kept row; otherwise the listing is exhausted.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::CursorPage;
    ///
    /// let page = CursorPage::from_overfetch(vec![1, 2, 3], 2, |n| n.to_string());
    /// assert_eq!(page.items, vec![1, 2]);
    /// assert_eq!(page.next_cursor.as_deref(), Some("2"));
    ///
    /// let last = CursorPage::from_overfetch(vec![1, 2], 2, |n| n.to_string());
    /// assert!(last.next_cursor.is_none());
    /// ```
    pub fn from_overfetch<F>(mut rows: Vec<T>, limit: usize, cursor_of: F) -> Self
    where
        F: FnOnce(&T) -> C,
    {
        if limit == 0 {
            return Self::empty();
        }

        if rows.len() > limit {
            rows.truncate(limit);
            let next_cursor = rows.last().map(cursor_of);
            Self {
                items: rows,
                next_cursor,
            }
        } else {
            Self {
                items: rows,
                next_cursor: None,
            }
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items to a different type, keeping the cursor
    pub fn map<U, F>(self, f: F) -> CursorPage<U, C>
    where
        F: FnMut(T) -> U,
    {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
