use std::collections::BTreeMap;

use url::Url;

use super::cursor::Cursor;
use super::page::Pagination;

/// Query parameter carrying the `previous` cursor token.
pub const PREVIOUS_PAGINATION_QUERY_PARAM_KEY: &str = "previous";
/// Query parameter carrying the `next` cursor token.
pub const NEXT_PAGINATION_QUERY_PARAM_KEY: &str = "next";

/// Read the pagination a request asks for.
///
/// Unparseable tokens are dropped rather than reported, so a mangled link falls
/// back to the first page.
#[must_use]
pub fn pagination_from_url(url: &Url) -> Pagination {
    let mut page = Pagination::default();
    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        let slot = match key.as_ref() {
            PREVIOUS_PAGINATION_QUERY_PARAM_KEY => &mut page.previous,
            NEXT_PAGINATION_QUERY_PARAM_KEY => &mut page.next,
            _ => continue,
        };
        match Cursor::parse(&value) {
            Ok(cursor) => *slot = Some(cursor),
            Err(e) => tracing::debug!(param = %key, error = %e, "ignoring malformed cursor"),
        }
    }
    page
}

/// Links for the cursors set on `page`, keyed by `previous` / `next`.
///
/// Each link keeps the request's scheme, host and path and carries exactly one
/// query parameter; the rest of the request's query string is not copied.
#[must_use]
pub fn pagination_links(url: &Url, page: &Pagination) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    let cursors = [
        (PREVIOUS_PAGINATION_QUERY_PARAM_KEY, page.previous.as_ref()),
        (NEXT_PAGINATION_QUERY_PARAM_KEY, page.next.as_ref()),
    ];
    for (key, cursor) in cursors {
        if let Some(cursor) = cursor {
            let mut link = base_url(url);
            link.query_pairs_mut()
                .append_pair(key, &cursor.to_string());
            links.insert(key.to_owned(), link.to_string());
        }
    }
    links
}

fn base_url(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    // strip credentials; cannot-be-a-base URLs reject both setters
    let _ = base.set_username("");
    let _ = base.set_password(None);
    base
}
