use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cursor::Cursor;

/// Minimal row contract keyset pagination depends on.
///
/// `id` must be unique and sort in creation order (for example a UUID v7 or any
/// other time-ordered identifier); `created_at` is the row's creation time.
pub trait Paginateable {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Ready-made [`Paginateable`] for rows that carry only the bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePaginateable {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BasePaginateable {
    /// Fresh row: new time-ordered id, both timestamps set to now.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Fill whatever has not been set yet: an empty id gets a new one, and
    /// epoch timestamps are replaced with now.
    pub fn quick_fix(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::now_v7().to_string();
        }
        let now = Utc::now();
        if self.created_at == DateTime::<Utc>::UNIX_EPOCH {
            self.created_at = now;
        }
        if self.updated_at == DateTime::<Utc>::UNIX_EPOCH {
            self.updated_at = now;
        }
    }
}

impl Default for BasePaginateable {
    /// Unset row (empty id, epoch timestamps); see [`BasePaginateable::quick_fix`].
    fn default() -> Self {
        Self {
            id: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Paginateable for BasePaginateable {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Which way a paginated query walks the `(createdAt, id)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Older rows, newest first. Driven by [`Pagination::next`].
    Forward,
    /// Newer rows, oldest first. Driven by [`Pagination::previous`]; callers
    /// reverse the page before showing it.
    Backward,
}

/// Page boundary request: the cursors to continue from.
///
/// When both are set, `next` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<Cursor>,
}

impl Pagination {
    /// Build a pagination from boundary rows.
    ///
    /// `first` becomes the `next` cursor and `last` becomes the `previous`
    /// cursor. To walk forward pass the last row of the page just read as
    /// `first`; to walk backward pass the last row read as `last`.
    #[must_use]
    pub fn new<P: Paginateable + ?Sized>(first: Option<&P>, last: Option<&P>) -> Self {
        Self {
            previous: last.map(Cursor::from_paginateable),
            next: first.map(Cursor::from_paginateable),
        }
    }

    /// Pagination for the first page.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }

    /// The cursor that governs a query over this pagination.
    #[must_use]
    pub fn active(&self) -> Option<(Direction, &Cursor)> {
        if let Some(next) = &self.next {
            Some((Direction::Forward, next))
        } else {
            self.previous
                .as_ref()
                .map(|previous| (Direction::Backward, previous))
        }
    }
}

/// Fixed page-size tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    #[default]
    Regular,
    Medium,
    Large,
    ExtraLarge,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Regular,
        PageSize::Medium,
        PageSize::Large,
        PageSize::ExtraLarge,
    ];

    /// Rows per page, which is also the most rows one page query returns.
    #[must_use]
    pub fn limit(self) -> usize {
        match self {
            PageSize::Regular => 25,
            PageSize::Medium => 50,
            PageSize::Large => 100,
            PageSize::ExtraLarge => 500,
        }
    }
}
