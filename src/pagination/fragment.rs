//! SQL suffixes for keyset pagination.
//!
//! A page query is a base `SELECT` followed by the fragment from
//! [`build_page_fragment`], bound with the arguments from [`build_page_args`]
//! (appended after the base query's own arguments). Both go through
//! [`Pagination::active`], so the placeholder the fragment emits and the value
//! the arguments carry always come from the same cursor.
//!
//! The cursor id is written into the SQL text as a quoted literal; only the
//! timestamp is a placeholder. Ids are expected to be system generated.

use crate::types::RowValues;

use super::page::{Direction, PageSize, Pagination};

const ORDER_DESCENDING: &str = "ORDER BY createdAt desc, id desc";
const ORDER_ASCENDING: &str = "ORDER BY createdAt asc, id asc";

/// Render the `WHERE`/`ORDER BY`/`LIMIT` suffix for one page.
///
/// With `append` the predicate starts with `AND` (the base query already has a
/// `WHERE`), otherwise with `WHERE`. Without a cursor only ordering and limit are
/// emitted. The result starts with a space.
#[must_use]
pub fn build_page_fragment(page: &Pagination, append: bool, size: PageSize) -> String {
    let mut query = String::from(" ");
    let order = match page.active() {
        Some((direction, cursor)) => {
            let (id_op, ts_op, order) = match direction {
                Direction::Forward => ("<", "<=", ORDER_DESCENDING),
                Direction::Backward => (">", ">=", ORDER_ASCENDING),
            };
            query.push_str(if append { "AND " } else { "WHERE " });
            query.push_str(&format!(
                "id {id_op} '{}' AND createdAt {ts_op} ? ",
                quote_literal(&cursor.id)
            ));
            order
        }
        None => ORDER_DESCENDING,
    };
    query.push_str(&format!("{order} LIMIT {}", size.limit()));
    query
}

/// [`build_page_fragment`] with [`PageSize::Regular`].
#[must_use]
pub fn build_regular_page_fragment(page: &Pagination, append: bool) -> String {
    build_page_fragment(page, append, PageSize::Regular)
}

/// Bind values for the placeholder emitted by [`build_page_fragment`].
///
/// Empty when no cursor is set.
#[must_use]
pub fn build_page_args(page: &Pagination) -> Vec<RowValues> {
    page.active()
        .map(|(_, cursor)| vec![RowValues::Timestamp(cursor.timestamp)])
        .unwrap_or_default()
}

/// Append the pagination bind values to a query's own arguments.
#[must_use]
pub fn append_page_args(page: &Pagination, mut args: Vec<RowValues>) -> Vec<RowValues> {
    args.extend(build_page_args(page));
    args
}

/// A base query with its page fragment and matching arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub sql: String,
    pub args: Vec<RowValues>,
}

impl PageQuery {
    /// `base_sql` with the page fragment appended and `base_args` extended by
    /// the page arguments.
    #[must_use]
    pub fn new(
        base_sql: &str,
        base_args: Vec<RowValues>,
        page: &Pagination,
        append: bool,
        size: PageSize,
    ) -> Self {
        Self {
            sql: format!("{base_sql}{}", build_page_fragment(page, append, size)),
            args: append_page_args(page, base_args),
        }
    }
}

fn quote_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::pagination::cursor::Cursor;

    fn cursor(id: &str) -> Cursor {
        Cursor::new(id, Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
    }

    #[test]
    fn open_page_orders_and_limits_only() {
        for append in [true, false] {
            assert_eq!(
                build_regular_page_fragment(&Pagination::open(), append),
                " ORDER BY createdAt desc, id desc LIMIT 25"
            );
        }
        assert!(build_page_args(&Pagination::open()).is_empty());
    }

    #[test]
    fn next_cursor_walks_descending() {
        let page = Pagination {
            previous: None,
            next: Some(cursor("n1")),
        };
        assert_eq!(
            build_page_fragment(&page, false, PageSize::Medium),
            " WHERE id < 'n1' AND createdAt <= ? ORDER BY createdAt desc, id desc LIMIT 50"
        );
        assert_eq!(
            build_page_fragment(&page, true, PageSize::Medium),
            " AND id < 'n1' AND createdAt <= ? ORDER BY createdAt desc, id desc LIMIT 50"
        );
        assert_eq!(
            build_page_args(&page),
            vec![RowValues::Timestamp(cursor("n1").timestamp)]
        );
    }

    #[test]
    fn previous_cursor_walks_ascending() {
        let page = Pagination {
            previous: Some(cursor("p1")),
            next: None,
        };
        assert_eq!(
            build_page_fragment(&page, false, PageSize::Large),
            " WHERE id > 'p1' AND createdAt >= ? ORDER BY createdAt asc, id asc LIMIT 100"
        );
        assert_eq!(
            build_page_fragment(&page, true, PageSize::ExtraLarge),
            " AND id > 'p1' AND createdAt >= ? ORDER BY createdAt asc, id asc LIMIT 500"
        );
    }

    #[test]
    fn next_wins_over_previous() {
        let next_only = Pagination {
            previous: None,
            next: Some(cursor("n1")),
        };
        let both = Pagination {
            previous: Some(Cursor::new("p1", Utc::now())),
            next: Some(cursor("n1")),
        };
        for size in PageSize::ALL {
            for append in [true, false] {
                assert_eq!(
                    build_page_fragment(&both, append, size),
                    build_page_fragment(&next_only, append, size)
                );
            }
        }
        assert_eq!(build_page_args(&both), build_page_args(&next_only));
    }

    #[test]
    fn every_tier_emits_its_limit_in_both_directions() {
        let forward = Pagination {
            previous: None,
            next: Some(cursor("x")),
        };
        let backward = Pagination {
            previous: Some(cursor("x")),
            next: None,
        };
        for size in PageSize::ALL {
            let suffix = format!(" LIMIT {}", size.limit());
            let open = build_page_fragment(&Pagination::open(), false, size);
            assert!(open.ends_with(&format!("desc{suffix}")), "{open}");
            let fwd = build_page_fragment(&forward, false, size);
            assert!(fwd.ends_with(&format!("id desc{suffix}")), "{fwd}");
            let bwd = build_page_fragment(&backward, false, size);
            assert!(bwd.ends_with(&format!("id asc{suffix}")), "{bwd}");
        }
    }

    #[test]
    fn quotes_in_ids_stay_inside_the_literal() {
        let page = Pagination {
            previous: None,
            next: Some(cursor("a'; DROP TABLE t; --")),
        };
        assert_eq!(
            build_regular_page_fragment(&page, false),
            " WHERE id < 'a''; DROP TABLE t; --' AND createdAt <= ? ORDER BY createdAt desc, id desc LIMIT 25"
        );
    }

    #[test]
    fn page_query_appends_args_after_base_args() {
        let page = Pagination {
            previous: None,
            next: Some(cursor("n1")),
        };
        let query = PageQuery::new(
            "SELECT id FROM t WHERE owner = ?",
            vec![RowValues::Text("me".into())],
            &page,
            true,
            PageSize::Regular,
        );
        assert_eq!(
            query.sql,
            "SELECT id FROM t WHERE owner = ? AND id < 'n1' AND createdAt <= ? ORDER BY createdAt desc, id desc LIMIT 25"
        );
        assert_eq!(
            query.args,
            vec![
                RowValues::Text("me".into()),
                RowValues::Timestamp(cursor("n1").timestamp)
            ]
        );
    }
}
