//! HTTP implementation of [`Platform`] for the platform's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crowdrun_core::{
    AnalyticsRequest, AssignmentQuery, BatchOptions, Operation, OperationStatus, Pool, PoolId,
    Project, Table, Task, TaskBatchCreateResult, Training, TrainingId,
};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::platform::Platform;

const CALLER_CONTEXT_HEADER: &str = "X-Caller-Context";
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Platform client over HTTPS.
pub struct HttpPlatform {
    inner: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl HttpPlatform {
    /// Create a new client from the given config.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("OAuth {}", config.token))
            .map_err(|_| ClientError::Config("token contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        if let Some(context) = &config.caller_context {
            let value = HeaderValue::from_str(context).map_err(|_| {
                ClientError::Config("caller context contains invalid characters".to_string())
            })?;
            headers.insert(CALLER_CONTEXT_HEADER, value);
        }

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            inner,
            base_url: config.api_url(),
            poll_interval: config.operation_poll_interval(),
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Create a client from `CROWDRUN_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).send().await?;
        decode(check(response).await?).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "POST request");

        let response = self.inner.post(&url).json(body).send().await?;
        decode(check(response).await?).await
    }

    /// POST an open action; waits on the returned operation, if any.
    ///
    /// The API answers 202 with an operation when the action is accepted and
    /// 204 when the target is already open.
    async fn open(&self, path: &str) -> Result<(), ClientError> {
        let url = self.url(path);
        debug!(url = %url, "POST request");

        let response = check(self.inner.post(&url).send().await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!(url = %url, "Already open");
            return Ok(());
        }

        let operation: Operation = decode(response).await?;
        let operation = self.wait_operation(&operation).await?;
        if operation.status == OperationStatus::Fail {
            return Err(ClientError::OperationFailed(operation.id));
        }
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Serialization(e.to_string()))
}

fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => ClientError::Api {
            status,
            code: parsed.code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message: parsed.message.unwrap_or_default(),
        },
        Err(_) => ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: body.trim().to_string(),
        },
    }
}

fn batch_query(options: BatchOptions) -> [(&'static str, bool); 3] {
    [
        ("allow_defaults", options.allow_defaults),
        ("open_pool", options.open_pool),
        ("skip_invalid_items", options.skip_invalid_items),
    ]
}

fn assignments_query(query: &AssignmentQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !query.statuses.is_empty() {
        let statuses: Vec<&str> = query.statuses.iter().map(|s| s.as_str()).collect();
        params.push(("status", statuses.join(",")));
    }
    if let Some(from) = query.start_time_from {
        params.push(("start_time_from", from.format(QUERY_TIME_FORMAT).to_string()));
    }
    if let Some(to) = query.start_time_to {
        params.push(("start_time_to", to.format(QUERY_TIME_FORMAT).to_string()));
    }
    if query.exclude_banned {
        params.push(("exclude_banned", "true".to_string()));
    }
    if !query.fields.is_empty() {
        params.push(("field", query.fields.join(",")));
    }
    params
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn create_project(&self, project: &Project) -> Result<Project, ClientError> {
        self.post_json("/v1/projects", project).await
    }

    async fn create_training(&self, training: &Training) -> Result<Training, ClientError> {
        self.post_json("/v1/trainings", training).await
    }

    async fn create_pool(&self, pool: &Pool) -> Result<Pool, ClientError> {
        self.post_json("/v1/pools", pool).await
    }

    async fn create_tasks(
        &self,
        tasks: &[Task],
        options: BatchOptions,
    ) -> Result<TaskBatchCreateResult, ClientError> {
        let url = self.url("/v1/tasks");
        debug!(url = %url, count = tasks.len(), "POST task batch");

        let response = self
            .inner
            .post(&url)
            .query(&batch_query(options))
            .json(tasks)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    async fn open_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError> {
        self.open(&format!("/v1/pools/{pool_id}/open")).await?;
        self.get_pool(pool_id).await
    }

    async fn open_training(&self, training_id: &TrainingId) -> Result<Training, ClientError> {
        self.open(&format!("/v1/trainings/{training_id}/open")).await?;
        self.get_json(&format!("/v1/trainings/{training_id}")).await
    }

    async fn get_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError> {
        self.get_json(&format!("/v1/pools/{pool_id}")).await
    }

    async fn get_analytics(&self, requests: &[AnalyticsRequest]) -> Result<Operation, ClientError> {
        self.post_json("/v1/staging/analytics-2", requests).await
    }

    async fn wait_operation(&self, operation: &Operation) -> Result<Operation, ClientError> {
        let deadline = Instant::now() + self.operation_timeout;
        let mut current = operation.clone();

        while !current.status.is_terminal() {
            if Instant::now() >= deadline {
                warn!(operation_id = %current.id, "Operation wait timed out");
                return Err(ClientError::OperationTimeout(current.id));
            }
            tokio::time::sleep(self.poll_interval).await;
            current = self
                .get_json(&format!("/v1/operations/{}", current.id))
                .await?;
            debug!(operation_id = %current.id, status = ?current.status, "Polled operation");
        }

        Ok(current)
    }

    async fn get_assignments_table(&self, query: &AssignmentQuery) -> Result<Table, ClientError> {
        let url = self.url(&format!(
            "/new/requester/pools/{}/assignments.tsv",
            query.pool_id
        ));
        debug!(url = %url, "GET assignments export");

        let response = self
            .inner
            .get(&url)
            .query(&assignments_query(query))
            .send()
            .await?;
        let text = check(response).await?.text().await?;
        Table::from_tsv(&text).map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use chrono::NaiveDate;
    use crowdrun_core::AssignmentStatus;

    fn platform() -> HttpPlatform {
        let mut config = ClientConfig::new(Environment::Sandbox, "secret");
        config.base_url = Some("http://127.0.0.1:9/api".to_string());
        HttpPlatform::new(&config).unwrap()
    }

    fn platform_for(server: &mockito::ServerGuard) -> HttpPlatform {
        let mut config = ClientConfig::new(Environment::Sandbox, "secret");
        config.base_url = Some(format!("{}/api", server.url()));
        config.operation_poll_interval_secs = 0;
        HttpPlatform::new(&config).unwrap()
    }

    #[test]
    fn test_api_error_from_json_body() {
        let err = api_error(404, r#"{"code": "DOES_NOT_EXIST", "message": "Pool not found"}"#);
        match err {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "DOES_NOT_EXIST");
                assert_eq!(message, "Pool not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_from_plain_body() {
        let err = api_error(502, "Bad Gateway\n");
        assert!(matches!(
            err,
            ClientError::Api { status: 502, ref code, ref message }
                if code == "UNKNOWN" && message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_assignments_query() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let query = AssignmentQuery::new(PoolId::new("5"))
            .with_status(AssignmentStatus::Submitted)
            .with_status(AssignmentStatus::Accepted)
            .with_time_range(Some(from), None)
            .excluding_banned();

        assert_eq!(
            assignments_query(&query),
            vec![
                ("status", "SUBMITTED,ACCEPTED".to_string()),
                ("start_time_from", "2024-03-01T12:30:00".to_string()),
                ("exclude_banned", "true".to_string()),
            ]
        );
        assert!(assignments_query(&AssignmentQuery::new(PoolId::new("5"))).is_empty());
    }

    #[test]
    fn test_batch_query() {
        let options = BatchOptions {
            open_pool: true,
            ..BatchOptions::default()
        };
        assert_eq!(
            batch_query(options),
            [
                ("allow_defaults", false),
                ("open_pool", true),
                ("skip_invalid_items", false)
            ]
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = ClientConfig::new(Environment::Sandbox, "bad\ntoken");
        assert!(matches!(
            HttpPlatform::new(&config),
            Err(ClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_on_finished_operation_skips_polling() {
        let operation = Operation {
            id: "op-1".to_string(),
            operation_type: None,
            status: OperationStatus::Success,
            submitted: None,
            finished: None,
            details: None,
        };
        let result = platform().wait_operation(&operation).await.unwrap();
        assert_eq!(result, operation);
    }

    #[tokio::test]
    async fn test_open_pool_waits_for_operation() {
        let mut server = mockito::Server::new_async().await;
        let open = server
            .mock("POST", "/api/v1/pools/5/open")
            .match_header("authorization", "OAuth secret")
            .match_header("x-caller-context", "crowdrun")
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "op-1", "type": "POOL.OPEN", "status": "RUNNING"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/api/v1/operations/op-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "op-1", "type": "POOL.OPEN", "status": "SUCCESS"}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/api/v1/pools/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "5", "project_id": "1", "status": "OPEN"}"#)
            .create_async()
            .await;

        let pool = platform_for(&server)
            .open_pool(&PoolId::new("5"))
            .await
            .unwrap();

        assert!(pool.is_open());
        open.assert_async().await;
        poll.assert_async().await;
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_pool_already_open() {
        let mut server = mockito::Server::new_async().await;
        let open = server
            .mock("POST", "/api/v1/pools/5/open")
            .with_status(204)
            .create_async()
            .await;
        let poll = server
            .mock("GET", mockito::Matcher::Regex("^/api/v1/operations/".to_string()))
            .expect(0)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/pools/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "5", "status": "OPEN"}"#)
            .create_async()
            .await;

        let pool = platform_for(&server)
            .open_pool(&PoolId::new("5"))
            .await
            .unwrap();

        assert!(pool.is_open());
        open.assert_async().await;
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_training_failed_operation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/trainings/8/open")
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "op-2", "status": "FAIL"}"#)
            .create_async()
            .await;

        let result = platform_for(&server)
            .open_training(&TrainingId::new("8"))
            .await;

        assert!(matches!(result, Err(ClientError::OperationFailed(id)) if id == "op-2"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/pools/404")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code": "DOES_NOT_EXIST", "message": "Pool not found"}"#)
            .create_async()
            .await;

        let result = platform_for(&server).get_pool(&PoolId::new("404")).await;

        assert!(matches!(
            result,
            Err(ClientError::Api { status: 404, ref code, .. }) if code == "DOES_NOT_EXIST"
        ));
    }

    #[tokio::test]
    async fn test_create_tasks_sends_flags() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/tasks")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("allow_defaults".into(), "true".into()),
                mockito::Matcher::UrlEncoded("open_pool".into(), "false".into()),
                mockito::Matcher::UrlEncoded("skip_invalid_items".into(), "true".into()),
            ]))
            .match_body(mockito::Matcher::Regex(
                r#"^\[\{"pool_id":"5","input_values":\{"text":"a"\}\},\{"pool_id":"5","input_values":\{\}\}\]$"#
                    .to_string(),
            ))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "items": {"0": {"id": "t-0", "pool_id": "5", "input_values": {"text": "a"}}},
                    "validation_errors": {"1": {"input_values.text": {"code": "VALUE_REQUIRED"}}}
                }"#,
            )
            .create_async()
            .await;

        let mut input = serde_json::Map::new();
        input.insert("text".to_string(), "a".into());
        let tasks = vec![
            Task::new(PoolId::new("5"), input),
            Task::new(PoolId::new("5"), serde_json::Map::new()),
        ];
        let options = BatchOptions {
            allow_defaults: true,
            open_pool: false,
            skip_invalid_items: true,
        };

        let result = platform_for(&server)
            .create_tasks(&tasks, options)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.rejected().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_create_pool_keeps_decimal_reward() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/pools")
            .match_body(mockito::Matcher::Regex(r#""reward_per_assignment":0\.015"#.to_string()))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "31", "reward_per_assignment": 0.015, "status": "CLOSED"}"#)
            .create_async()
            .await;

        let mut pool = Pool::new("main");
        pool.reward_per_assignment = Some("0.015".parse().unwrap());

        let created = platform_for(&server).create_pool(&pool).await.unwrap();
        assert_eq!(created.id, Some(PoolId::new("31")));
        assert_eq!(created.reward_per_assignment.unwrap().to_string(), "0.015");
    }

    #[tokio::test]
    async fn test_assignments_table_from_export() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/new/requester/pools/5/assignments.tsv")
            .match_query(mockito::Matcher::UrlEncoded(
                "status".into(),
                "ACCEPTED".into(),
            ))
            .with_status(200)
            .with_header("content-type", "text/tab-separated-values")
            .with_body("INPUT:text\tOUTPUT:label\tASSIGNMENT:worker_id\n\"a\tb\"\tpos\tw1\n")
            .create_async()
            .await;

        let query = AssignmentQuery::new(PoolId::new("5")).with_status(AssignmentStatus::Accepted);
        let table = platform_for(&server)
            .get_assignments_table(&query)
            .await
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0][0], serde_json::json!("a\tb"));
    }
}
