//! Page parameters and next/prev links.

use commander_tracker_server::http::envelope::{
    pagination, PageLink, PageParams, DEFAULT_LIMIT, MAX_LIMIT,
};

fn params(page: Option<u32>, limit: Option<u32>) -> PageParams {
    PageParams { page, limit }
}

#[test]
fn defaults_and_clamping() {
    let p = params(None, None).resolve();
    assert_eq!((p.page, p.limit), (1, DEFAULT_LIMIT));
    assert_eq!(p.offset(), 0);

    assert_eq!(params(Some(0), Some(0)).resolve().page, 1);
    assert_eq!(params(Some(0), Some(0)).resolve().limit, 1);
    assert_eq!(params(None, Some(1000)).resolve().limit, MAX_LIMIT);
    assert_eq!(params(Some(3), Some(10)).resolve().offset(), 20);
}

#[test]
fn first_page_only_links_forward() {
    let links = pagination(params(Some(1), Some(10)).resolve(), 25);
    assert_eq!(links.next, Some(PageLink { page: 2, limit: 10 }));
    assert_eq!(links.prev, None);
}

#[test]
fn last_page_only_links_back() {
    let links = pagination(params(Some(3), Some(10)).resolve(), 25);
    assert_eq!(links.next, None);
    assert_eq!(links.prev, Some(PageLink { page: 2, limit: 10 }));

    // exactly full last page
    let links = pagination(params(Some(2), Some(10)).resolve(), 20);
    assert_eq!(links.next, None);
}

#[test]
fn single_page_has_no_links() {
    let links = pagination(params(None, None).resolve(), 3);
    assert_eq!(links.next, None);
    assert_eq!(links.prev, None);

    let links = pagination(params(None, None).resolve(), 0);
    assert_eq!(links, Default::default());
}
