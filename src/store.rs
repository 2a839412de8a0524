use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::logging::Diagnostics;
use crate::model::{PlayRecord, PlayRow, COLUMNS};

pub static DEFAULT_TABLE: &str = "spotify_logs";
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Which rows to pull from the play log
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    /// Lower bound (inclusive) on `played_at`
    pub since: DateTime<Utc>,
    pub limit: Option<usize>,
    pub newest_first: bool,
}

impl LogQuery {
    /// Everything played in the trailing `days`, newest first.
    ///
    /// A window reaching back past the Unix epoch starts at the epoch.
    pub fn last_days(days: u32) -> Self {
        let since = Duration::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .map_or(DateTime::<Utc>::UNIX_EPOCH, |since| {
                since.max(DateTime::<Utc>::UNIX_EPOCH)
            });
        Self {
            since,
            limit: None,
            newest_first: true,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// PostgREST query parameters
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("select", COLUMNS.join(",")),
            (
                "played_at",
                format!("gte.{}", self.since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
        ];
        if self.newest_first {
            params.push(("order", "played_at.desc".to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

impl Default for LogQuery {
    fn default() -> Self {
        Self::last_days(DEFAULT_WINDOW_DAYS)
    }
}

/// Read-only access to the play log table of a Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    credentials: Credentials,
    table: String,
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table<S: Into<String>>(mut self, table: S) -> Self {
        self.table = table.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.credentials.supabase_url.trim_end_matches('/'),
            self.table
        )
    }

    /// Fetch the play records matching `query`.
    ///
    /// Failures are recorded in `diagnostics` and produce an empty list so the rest of the
    /// pipeline can still render a fragment.
    pub async fn fetch(&self, query: &LogQuery, diagnostics: &mut Diagnostics) -> Vec<PlayRecord> {
        let rows = match self.fetch_rows(query).await {
            Ok(rows) => rows,
            Err(err) => {
                diagnostics.error("store", format!("failed to fetch play history: {err}"));
                return Vec::new();
            }
        };

        let total = rows.len();
        let records: Vec<PlayRecord> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match PlayRow::from_json(row) {
                Ok(row) => Some(PlayRecord::from_row(row, diagnostics)),
                Err(err) => {
                    diagnostics.warn("store", format!("skipping row {i}: {err}"));
                    None
                }
            })
            .collect();

        diagnostics.info(
            "store",
            format!("fetched {} of {total} rows since {}", records.len(), query.since.to_rfc3339()),
        );
        records
    }

    async fn fetch_rows(&self, query: &LogQuery) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&query.params())
            .header("apikey", &self.credentials.supabase_key)
            .bearer_auth(&self.credentials.supabase_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::custom(format!("[{status}] {}", body.replace('\n', ""))));
        }

        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::custom(format!(
                "expected a list of rows, got {}",
                match other {
                    Value::Object(_) => "an object",
                    _ => "a scalar",
                }
            ))),
        }
    }
}
