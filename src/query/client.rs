use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{CistatError, Result};

use super::queries::{self, QueryWindow};
use super::types::{
    ClassificationColumns, ClassifiedRun, QueryResponse, TaskRecord, TryPushColumns,
};

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY_SECONDS: u64 = 10;

/// Client for the remote query service.
///
/// Sends one stored query per run as a JSON POST. Retry on rate limits and
/// transient network failures lives here; the recipes downstream never
/// retry.
#[derive(Debug)]
pub struct QueryClient {
    client: Client,
    query_url: Url,
}

impl QueryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cistat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CistatError::Config(format!("failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| CistatError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let query_url = base
            .join("query")
            .map_err(|e| CistatError::Config(format!("invalid query URL: {e}")))?;

        Ok(Self { client, query_url })
    }

    /// Rows for the classification-time recipe, already validated for
    /// column alignment.
    pub async fn classification_times(&self, window: &QueryWindow) -> Result<Vec<ClassifiedRun>> {
        let columns: ClassificationColumns = self
            .run_query(&queries::classification_time_simple(window))
            .await?;
        columns.into_rows()
    }

    pub async fn task_durations(
        &self,
        window: &QueryWindow,
        platform: &str,
        build_type: &str,
    ) -> Result<Vec<TaskRecord>> {
        self.run_query(&queries::task_durations(window, platform, build_type))
            .await
    }

    pub async fn try_commit_messages(
        &self,
        window: &QueryWindow,
    ) -> Result<Vec<(String, String)>> {
        let columns: TryPushColumns =
            self.run_query(&queries::try_commit_messages(window)).await?;
        columns.into_rows()
    }

    /// Executes one query with bounded retry on network errors and rate
    /// limits, then deserializes the `data` payload.
    async fn run_query<T>(&self, body: &Value) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut retry_count = 0;
        loop {
            let request = self.client.post(self.query_url.clone()).json(body);

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "network error ({}), retrying in {}s ({}/{})...",
                        e,
                        RETRY_DELAY_SECONDS,
                        retry_count + 1,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == 429 || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(CistatError::ApiAfterRetries {
                        status: status.as_u16(),
                        retries: MAX_RETRIES,
                    });
                }

                warn!(
                    "query service error (status {status}), waiting {RETRY_DELAY_SECONDS}s before retry {}/{}...",
                    retry_count + 1,
                    MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read error response".to_string());
                return Err(CistatError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("query succeeded with status {status}");
            let body: QueryResponse<T> = response.json().await?;
            return Ok(body.data);
        }
    }
}
