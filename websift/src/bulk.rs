//! Order-preserving concurrent search over many queries.

use tracing::{info, warn};

use crate::engine::SearchEngine;
use crate::errors::ItemFailure;
use crate::events::{SEARCH_BATCH_COMPLETED, SEARCH_QUERY_FAILED};
use crate::models::{combine_records, BulkSearchOutput, SearchRecord};
use crate::pool::WorkerPool;

impl SearchEngine {
    /// Searches every query with the engine's provider.
    ///
    /// Records come back in input order whatever order the workers finish in.
    /// A failing query yields a record with an `error` and no URLs; it never
    /// affects its siblings. With `combine`, the URLs of all records are
    /// flattened in query order instead.
    pub async fn bulk_search(
        &self,
        queries: &[String],
        results_per_query: usize,
        combine: bool,
    ) -> BulkSearchOutput {
        let records = self.run_queries(queries, results_per_query).await;
        if combine {
            BulkSearchOutput::Combined(combine_records(records))
        } else {
            BulkSearchOutput::Records(records)
        }
    }

    /// Like [`bulk_search`](Self::bulk_search), returning one record per query.
    pub async fn search_records(
        &self,
        queries: &[String],
        results_per_query: usize,
    ) -> Vec<SearchRecord> {
        self.run_queries(queries, results_per_query).await
    }

    /// Like [`bulk_search`](Self::bulk_search), returning the flattened URLs.
    pub async fn search_combined(&self, queries: &[String], results_per_query: usize) -> Vec<String> {
        combine_records(self.run_queries(queries, results_per_query).await)
    }

    async fn run_queries(&self, queries: &[String], results_per_query: usize) -> Vec<SearchRecord> {
        if queries.is_empty() {
            return Vec::new();
        }

        let workers = self.max_search_workers().min(queries.len());
        let provider = self.provider();
        let mut pool = WorkerPool::new("bulk-search", workers);
        for query in queries {
            let engine = self.clone();
            let query = query.clone();
            pool.spawn(async move {
                engine.search(&query, provider, results_per_query).await
            });
        }

        let joined = pool.join_ordered().await;
        let mut records = Vec::with_capacity(joined.len());
        for (query, result) in queries.iter().zip(joined) {
            let record = match result {
                Ok(Ok(urls)) => SearchRecord::success(query.clone(), urls),
                Ok(Err(e)) => self.query_failed(query, ItemFailure::from(e)),
                Err(e) => self.query_failed(query, ItemFailure::worker(e.to_string())),
            };
            records.push(record);
        }

        let failed = records.iter().filter(|r| r.is_error()).count();
        let urls: usize = records.iter().map(|r| r.urls.len()).sum();
        info!(
            provider = %provider,
            queries = records.len(),
            failed,
            urls,
            "Bulk search completed"
        );
        self.events()
            .emit(
                SEARCH_BATCH_COMPLETED,
                Some(serde_json::json!({
                    "provider": provider.as_str(),
                    "queries": records.len(),
                    "failed": failed,
                    "urls": urls,
                })),
            )
            .await;
        records
    }

    fn query_failed(&self, query: &str, failure: ItemFailure) -> SearchRecord {
        warn!(query = %query, kind = %failure.kind, error = %failure.detail, "Search failed");
        self.events().try_emit(
            SEARCH_QUERY_FAILED,
            Some(serde_json::json!({ "query": query, "error": failure.to_dict() })),
        );
        SearchRecord::failure(query, failure)
    }
}
