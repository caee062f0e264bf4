//! Keyset pagination over a `(createdAt, id)` ordering.
//!
//! - cursor: opaque position tokens
//! - page: the row contract, `Pagination` and page-size tiers
//! - fragment: SQL suffix and bind arguments for one page
//! - links: `previous` / `next` query parameters and links

pub mod cursor;
pub mod fragment;
pub mod links;
pub mod page;

pub use cursor::Cursor;
pub use fragment::{
    PageQuery, append_page_args, build_page_args, build_page_fragment,
    build_regular_page_fragment,
};
pub use links::{
    NEXT_PAGINATION_QUERY_PARAM_KEY, PREVIOUS_PAGINATION_QUERY_PARAM_KEY, pagination_from_url,
    pagination_links,
};
pub use page::{BasePaginateable, Direction, PageSize, Paginateable, Pagination};
