//! Page-accumulation loop for listing endpoints.

use std::future::Future;

use serde_json::Value;

use crate::error::Result;
use crate::normalize::extract_entities;

/// Hard ceiling on pages fetched in one accumulation, purely to stop an
/// infinite loop against a server whose counts never converge.
pub const MAX_PAGES: u32 = 1000;

/// Fetch every page of a listing and accumulate the entities.
///
/// `fetch_page(page, page_size)` performs one authenticated request and
/// returns the raw payload. Pages are numbered from 1. The loop stops when a
/// page comes back empty, when the server-reported `count` says all pages
/// were seen, or — if no count is reported — when a page returns fewer items
/// than requested. A page exactly as long as requested is conservatively
/// assumed to have more behind it, which can fetch one empty extra page but
/// never underfetches.
pub async fn fetch_all_pages<F, Fut>(
    mut fetch_page: F,
    page_size: u32,
    preferred_keys: &[&str],
) -> Result<Vec<Value>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut items: Vec<Value> = Vec::new();
    let mut page: u32 = 1;

    loop {
        let payload = fetch_page(page, page_size).await?;
        let page_items = extract_entities(&payload, preferred_keys).unwrap_or_default();
        if page_items.is_empty() {
            break;
        }

        let fetched = page_items.len() as u64;
        items.extend(page_items);

        let effective_page_size =
            reported_number(&payload, "page_size").unwrap_or(u64::from(page_size)).max(1);

        let has_more = match reported_number(&payload, "count") {
            Some(count) => u64::from(page) < count.div_ceil(effective_page_size),
            // No usable count from the server: a full page means
            // "possibly more", a short page means the end.
            None => fetched == u64::from(page_size),
        };

        if !has_more {
            break;
        }

        page += 1;
        if page > MAX_PAGES {
            tracing::warn!(
                total = items.len(),
                "pagination hit the {MAX_PAGES}-page safety ceiling, stopping"
            );
            break;
        }
    }

    Ok(items)
}

/// Read a numeric pagination field from the payload, top level first, then
/// one level under `data`.
fn reported_number(payload: &Value, key: &str) -> Option<u64> {
    payload
        .get(key)
        .or_else(|| payload.get("data").and_then(|data| data.get(key)))
        .and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_stops_on_short_page_without_count() {
        let calls = AtomicU32::new(0);
        let items = fetch_all_pages(
            |page, _page_size| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let n = if page == 1 { 100 } else { 40 };
                    Ok(json!({ "deals": vec![json!({"page": page}); n] }))
                }
            },
            100,
            &["deals"],
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 140);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_respects_server_count() {
        let calls = AtomicU32::new(0);
        let items = fetch_all_pages(
            |_page, _page_size| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(json!({
                        "data": {
                            "deals": vec![json!({}); 100],
                            "count": 250,
                            "page_size": 100
                        }
                    }))
                }
            },
            100,
            &["deals"],
        )
        .await
        .unwrap();

        // count = 250, page_size = 100 -> 3 pages.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(items.len(), 300);
    }

    #[tokio::test]
    async fn test_empty_first_page_yields_nothing() {
        let items = fetch_all_pages(
            |_page, _page_size| async move { Ok(json!({"deals": []})) },
            100,
            &["deals"],
        )
        .await
        .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_safety_ceiling_bounds_a_lying_server() {
        let calls = AtomicU32::new(0);
        let items = fetch_all_pages(
            |_page, page_size| {
                calls.fetch_add(1, Ordering::SeqCst);
                // Always a full page, never a count: the heuristic alone
                // would loop forever.
                async move { Ok(json!(vec![json!({}); page_size as usize])) }
            },
            10,
            &["deals"],
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_PAGES);
        assert_eq!(items.len(), (MAX_PAGES * 10) as usize);
    }
}
