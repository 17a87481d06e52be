//! Table listing that hides pagination.
//!
//! `list_all_tables` returns a lazy stream: pages are fetched only as the
//! consumer pulls. Calling it again starts over from the first page.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use super::{TableRef, Warehouse};
use crate::errors::WarehouseError;

enum PageCursor {
    Start,
    Next(String),
    Exhausted,
}

async fn next_page(
    warehouse: &dyn Warehouse,
    dataset_id: &str,
    cursor: PageCursor,
) -> Result<Option<(Vec<TableRef>, PageCursor)>, WarehouseError> {
    let page_token = match cursor {
        PageCursor::Start => None,
        PageCursor::Next(token) => Some(token),
        PageCursor::Exhausted => return Ok(None),
    };

    let page = warehouse.list_tables_page(dataset_id, page_token).await?;
    tracing::trace!(
        dataset = dataset_id,
        tables = page.tables.len(),
        more = page.next_page_token.is_some(),
        "Fetched table page"
    );

    // An empty token is how some APIs say "no more pages".
    let cursor = match page.next_page_token {
        Some(token) if !token.is_empty() => PageCursor::Next(token),
        _ => PageCursor::Exhausted,
    };
    Ok(Some((page.tables, cursor)))
}

/// Stream every table in the dataset, across all pages, in listing order.
pub fn list_all_tables<'a>(
    warehouse: &'a dyn Warehouse,
    dataset_id: &'a str,
) -> BoxStream<'a, Result<TableRef, WarehouseError>> {
    stream::try_unfold(PageCursor::Start, move |cursor| {
        next_page(warehouse, dataset_id, cursor)
    })
    .map_ok(|tables| stream::iter(tables.into_iter().map(Ok)))
    .try_flatten()
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::MemoryWarehouse;

    #[tokio::test]
    async fn follows_page_tokens_to_the_end() {
        let warehouse = MemoryWarehouse::new("proj").with_page_size(2);
        warehouse.add_dataset("analytics");
        for name in ["a", "b", "c", "d", "e"] {
            warehouse.add_table("analytics", name, None);
        }

        let tables: Vec<_> = list_all_tables(&warehouse, "analytics")
            .try_collect()
            .await
            .unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.table_id.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(warehouse.list_calls(), 3);
    }

    #[tokio::test]
    async fn restarting_lists_again_from_first_page() {
        let warehouse = MemoryWarehouse::new("proj").with_page_size(1);
        warehouse.add_dataset("analytics");
        warehouse.add_table("analytics", "x", None);
        warehouse.add_table("analytics", "y", None);

        let first: Vec<_> = list_all_tables(&warehouse, "analytics")
            .try_collect()
            .await
            .unwrap();
        let second: Vec<_> = list_all_tables(&warehouse, "analytics")
            .try_collect()
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_dataset_yields_nothing() {
        let warehouse = MemoryWarehouse::new("proj");
        warehouse.add_dataset("empty");

        let tables: Vec<_> = list_all_tables(&warehouse, "empty")
            .try_collect()
            .await
            .unwrap();
        assert!(tables.is_empty());
        assert_eq!(warehouse.list_calls(), 1);
    }

    #[tokio::test]
    async fn listing_a_missing_dataset_fails() {
        let warehouse = MemoryWarehouse::new("proj");
        let err = list_all_tables(&warehouse, "nope")
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
