use crate::core::{ConfigProvider, PlayerStore};
use crate::domain::model::{PlayerChange, PlayerFilter, PlayerPatch, PlayerRecord, StoredPlayer};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use tokio::sync::broadcast;

pub const DEFAULT_TABLE: &str = "players";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout_seconds: u64,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn from_provider<C: ConfigProvider>(config: &C) -> Self {
        Self {
            url: config.store_url().to_string(),
            api_key: config.store_key().to_string(),
            table: config.table().to_string(),
            timeout_seconds: config.timeout_seconds(),
        }
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<()> {
        validate_url("store.url", &self.url)?;
        validate_non_empty_string("store.api_key", &self.api_key)?;
        validate_non_empty_string("store.table", &self.table)?;
        validate_range("store.timeout_seconds", self.timeout_seconds, 1, 600)?;
        Ok(())
    }
}

/// Supabase (PostgREST) 球員資料表客戶端。
///
/// 由呼叫端在程式啟動時建立一次並傳入管道；`subscribe` 只轉送本客戶端
/// 成功完成的寫入操作，不是 Supabase Realtime 協定。
pub struct SupabaseStore {
    client: Client,
    rest_url: String,
    api_key: String,
    changes: broadcast::Sender<PlayerChange>,
}

impl SupabaseStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Ok(Self {
            client,
            rest_url: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key,
            changes,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(StoreConfig::from_provider(config))
    }

    pub fn endpoint(&self) -> &str {
        &self.rest_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.rest_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// 非 2xx 回應轉為 StoreError，優先使用 PostgREST 錯誤內容中的 message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Store responded {}: {}", status, body);

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body
                }
            });

        Err(ImportError::StoreError {
            status: status.as_u16(),
            message,
        })
    }

    fn publish(&self, change: PlayerChange) {
        // 沒有訂閱者時 send 會回傳錯誤
        if self.changes.send(change).is_err() {
            tracing::trace!("No change subscribers");
        }
    }
}

fn filter_query(filter: &PlayerFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "name.asc".to_string()),
    ];

    // PostgREST 的 or=() 以逗號與括號分隔條件
    let term = filter
        .search_term
        .as_deref()
        .map(|t| t.replace([',', '(', ')'], " ").trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(term) = term {
        query.push((
            "or",
            format!("(name.ilike.*{}*,team.ilike.*{}*)", term, term),
        ));
    }

    if let Some(role) = filter.role.as_deref().filter(|r| !r.trim().is_empty()) {
        query.push(("general_role", format!("eq.{}", role)));
    }

    query
}

#[async_trait::async_trait]
impl PlayerStore for SupabaseStore {
    async fn insert_many(&self, records: &[PlayerRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        tracing::debug!("POST {} ({} records)", self.rest_url, records.len());
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await?;
        Self::check(response).await?;

        self.publish(PlayerChange::Inserted {
            records: records.to_vec(),
        });
        Ok(())
    }

    async fn select_all(&self, filter: &PlayerFilter) -> Result<Vec<StoredPlayer>> {
        let response = self
            .request(Method::GET)
            .query(&filter_query(filter))
            .send()
            .await?;
        let players: Vec<StoredPlayer> = Self::check(response).await?.json().await?;

        tracing::debug!("Fetched {} players", players.len());
        Ok(players)
    }

    async fn update(&self, id: &str, patch: PlayerPatch) -> Result<StoredPlayer> {
        let mut body = patch;
        body.insert(
            "updated_at".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );
        body.insert("updated_by".to_string(), serde_json::Value::Null);

        let response = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let mut rows: Vec<StoredPlayer> = Self::check(response).await?.json().await?;

        let player = rows.pop().ok_or_else(|| ImportError::StoreError {
            status: 404,
            message: format!("No player with id {}", id),
        })?;

        self.publish(PlayerChange::Updated {
            player: player.clone(),
        });
        Ok(player)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::check(response).await?;

        self.publish(PlayerChange::Deleted { id: id.to_string() });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PreferredFoot;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn store_for(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(StoreConfig::new(server.base_url(), "test-key")).unwrap()
    }

    #[tokio::test]
    async fn test_insert_many_sends_records() {
        let server = MockServer::start();
        let mut record = PlayerRecord::new("Mario Rossi");
        record.preferred_foot = Some(PreferredFoot::Destro);
        record.birth_year = Some(2004);

        let insert_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/players")
                .header("apikey", "test-key")
                .header("Authorization", "Bearer test-key")
                .header("Prefer", "return=minimal")
                .json_body(json!([{
                    "name": "Mario Rossi",
                    "birth_year": 2004,
                    "preferred_foot": "Destro",
                    "created_by": null,
                    "updated_by": null
                }]));
            then.status(201);
        });

        let store = store_for(&server);
        let mut changes = store.subscribe();
        store.insert_many(&[record.clone()]).await.unwrap();

        insert_mock.assert();
        assert_eq!(
            changes.try_recv().unwrap(),
            PlayerChange::Inserted {
                records: vec![record]
            }
        );
    }

    #[tokio::test]
    async fn test_insert_many_maps_postgrest_error() {
        let server = MockServer::start();
        let insert_mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/players");
            then.status(409).json_body(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"players_pkey\""
            }));
        });

        let store = store_for(&server);
        let mut changes = store.subscribe();
        let err = store
            .insert_many(&[PlayerRecord::new("Mario Rossi")])
            .await
            .unwrap_err();

        insert_mock.assert();
        match err {
            ImportError::StoreError { status, message } => {
                assert_eq!(status, 409);
                assert!(message.starts_with("duplicate key value"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_select_all_with_filter() {
        let server = MockServer::start();
        let select_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/players")
                .query_param("select", "*")
                .query_param("order", "name.asc")
                .query_param("or", "(name.ilike.*rossi*,team.ilike.*rossi*)")
                .query_param("general_role", "eq.Difensore");
            then.status(200).json_body(json!([{
                "id": "5f0c1c7e-3f1a-4a57-9d1e-0c6c0f6a1b11",
                "name": "Mario Rossi",
                "general_role": "Difensore",
                "preferred_foot": "Sinistro",
                "created_at": "2024-01-15T10:30:00.123456+00:00",
                "updated_at": null,
                "created_by": null,
                "updated_by": null
            }]));
        });

        let store = store_for(&server);
        let filter = PlayerFilter {
            search_term: Some("rossi".to_string()),
            role: Some("Difensore".to_string()),
        };
        let players = store.select_all(&filter).await.unwrap();

        select_mock.assert();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "5f0c1c7e-3f1a-4a57-9d1e-0c6c0f6a1b11");
        assert_eq!(players[0].record.name, "Mario Rossi");
        assert_eq!(players[0].record.preferred_foot, Some(PreferredFoot::Sinistro));
        assert!(players[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_update_returns_row_and_notifies() {
        let server = MockServer::start();
        let update_mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/players")
                .query_param("id", "eq.abc")
                .header("Prefer", "return=representation")
                .json_body_partial(r#"{"team": "Inter", "updated_by": null}"#);
            then.status(200).json_body(json!([{
                "id": "abc",
                "name": "Mario Rossi",
                "team": "Inter"
            }]));
        });

        let store = store_for(&server);
        let mut changes = store.subscribe();
        let mut patch = PlayerPatch::new();
        patch.insert("team".to_string(), json!("Inter"));

        let player = store.update("abc", patch).await.unwrap();

        update_mock.assert();
        assert_eq!(player.record.team.as_deref(), Some("Inter"));
        assert!(matches!(changes.try_recv().unwrap(), PlayerChange::Updated { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PATCH).path("/rest/v1/players");
            then.status(200).json_body(json!([]));
        });

        let store = store_for(&server);
        let err = store.update("missing", PlayerPatch::new()).await.unwrap_err();
        assert!(matches!(err, ImportError::StoreError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start();
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/players")
                .query_param("id", "eq.abc");
            then.status(204);
        });

        let store = store_for(&server);
        let mut changes = store.subscribe();
        store.delete("abc").await.unwrap();

        delete_mock.assert();
        assert_eq!(
            changes.try_recv().unwrap(),
            PlayerChange::Deleted {
                id: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(SupabaseStore::new(StoreConfig::new("not a url", "key")).is_err());
        assert!(SupabaseStore::new(StoreConfig::new("https://x.supabase.co", " ")).is_err());
    }

    #[test]
    fn test_filter_query_sanitizes_term() {
        let query = filter_query(&PlayerFilter {
            search_term: Some("Rossi, (Mario)".to_string()),
            role: None,
        });
        assert_eq!(query.len(), 3);
        assert_eq!(query[2].1, "(name.ilike.*Rossi   Mario*,team.ilike.*Rossi   Mario*)");
    }
}
