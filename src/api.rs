use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::JobCatalog;
use crate::config::AdminConfig;
use crate::filter::FilterSet;
use crate::notify::{forward_messages, Navigator, Notifier, ServerMessage, Severity};
use crate::session::Session;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("session expired")]
    AuthExpired,
    #[error("scheduler service responded with {status}")]
    Server {
        status: u16,
        messages: Vec<ServerMessage>,
    },
    #[error("could not reach the scheduler service")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response from the scheduler service")]
    Decode(#[source] serde_json::Error),
    #[error("request task did not complete")]
    Task(#[source] tokio::task::JoinError),
}

/// Every service response is wrapped in `{ok, data, messages}`.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(default)]
    pub ok: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub messages: Vec<ServerMessage>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Pagination {
    pub page: u32,
    pub total_items: u64,
    pub per_page: u32,
}

impl Pagination {
    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        (self.total_items + self.per_page as u64 - 1) / self.per_page as u64
    }
}

/// `data` of a list endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// The network seam. `request` is the only thing an implementation must provide.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Sends one request and returns the envelope's `data`. Server messages are
    /// surfaced to the user before this returns, on success and on failure.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError>;

    async fn create(&self, collection: &str, payload: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, collection, &[], Some(payload))
            .await
    }

    async fn update(&self, item_prefix: &str, id: &str, payload: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, &item_path(item_prefix, id), &[], Some(payload))
            .await
    }

    async fn fetch(&self, item_prefix: &str, id: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, &item_path(item_prefix, id), &[], None)
            .await
    }

    async fn delete(&self, item_prefix: &str, id: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, &item_path(item_prefix, id), &[], None)
            .await
    }

    /// Toggles between paused and resumed; the service decides which.
    async fn pause_job(&self, pause_prefix: &str, id: &str) -> Result<Value, ApiError> {
        self.request(Method::POST, &item_path(pause_prefix, id), &[], None)
            .await
    }

    async fn list(&self, endpoint: &str, query: &[(String, String)]) -> Result<ListPage, ApiError> {
        let data = self.request(Method::GET, endpoint, query, None).await?;
        decode(data)
    }

    async fn job_catalog(&self, endpoint: &str) -> Result<JobCatalog, ApiError> {
        let data = self.request(Method::GET, endpoint, &[], None).await?;
        decode(data)
    }
}

pub fn item_path(prefix: &str, id: &str) -> String {
    format!("{}{}", prefix, id)
}

fn decode<T: serde::de::DeserializeOwned + Default>(data: Value) -> Result<T, ApiError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(ApiError::Decode)
}

/// reqwest-backed client. Attaches the session's bearer token and sends the user
/// to the login view after a 401.
pub struct HttpAdminApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    login_view: String,
    redirect_delay: Duration,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl HttpAdminApi {
    pub fn new(
        conf: &AdminConfig,
        session: &Session,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        HttpAdminApi {
            client: reqwest::Client::new(),
            base_url: conf.api_url.trim_end_matches('/').to_string(),
            token: session.token.clone(),
            login_view: conf.front_routes.login.clone(),
            redirect_delay: conf.navigation_delay,
            notifier,
            navigator,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        error!(?e, "Request to scheduler service failed");
        self.notifier
            .notify(&e.to_string(), Severity::Danger, "Error");
        ApiError::Transport(e)
    }

    fn redirect_to_login(&self) {
        let navigator = self.navigator.clone();
        let login_view = self.login_view.clone();
        let delay = self.redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate_to(&login_view);
        });
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    #[tracing::instrument(level = "debug", skip(self, query, body))]
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(%status, len = bytes.len(), "Received response");

        let envelope = match serde_json::from_slice::<Envelope<Value>>(&bytes) {
            Ok(envelope) => Some(envelope),
            Err(e) if status.is_success() => {
                error!(?e, "Response body is not an envelope");
                return Err(ApiError::Decode(e));
            }
            Err(_) => None,
        };
        let messages = envelope
            .as_ref()
            .map(|e| e.messages.clone())
            .unwrap_or_default();
        forward_messages(self.notifier.as_ref(), &messages);

        if status == StatusCode::UNAUTHORIZED {
            warn!("Session expired, redirecting to login");
            self.redirect_to_login();
            return Err(ApiError::AuthExpired);
        }

        match envelope {
            Some(envelope) if status.is_success() && envelope.ok => {
                Ok(envelope.data.unwrap_or(Value::Null))
            }
            _ => Err(ApiError::Server {
                status: status.as_u16(),
                messages,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::{RecordingNavigator, RecordingNotifier};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        api: HttpAdminApi,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture(server: &MockServer, token: Option<&str>) -> Fixture {
        let mut conf = AdminConfig::for_api_url(server.uri());
        conf.navigation_delay = Duration::from_millis(10);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let api = HttpAdminApi::new(
            &conf,
            &Session::new(token.map(str::to_string), None),
            notifier.clone(),
            navigator.clone(),
        );
        Fixture {
            api,
            notifier,
            navigator,
        }
    }

    #[tokio::test]
    async fn create_posts_body_and_forwards_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(json!({"name": "job1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "data": {"job_id": "test_job__1"},
                "messages": [{"message": "New job test_job__1 has been added", "variant": "success", "title": "Success"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server, Some("abc"));
        let data = f.api.create("/jobs", &json!({"name": "job1"})).await.unwrap();

        assert_eq!(data["job_id"], json!("test_job__1"));
        assert_eq!(f.notifier.texts(), vec!["New job test_job__1 has been added"]);
    }

    #[tokio::test]
    async fn service_error_carries_status_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/jobs/j1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "data": null,
                "messages": [{"message": "Invalid module x", "variant": "danger", "title": "Error"}]
            })))
            .mount(&server)
            .await;

        let f = fixture(&server, None);
        let err = f.api.update("/jobs/", "j1", &json!({})).await.unwrap_err();

        match err {
            ApiError::Server { status, messages } => {
                assert_eq!(status, 400);
                assert_eq!(messages[0].message, "Invalid module x");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(f.notifier.texts(), vec!["Invalid module x"]);
    }

    #[tokio::test]
    async fn unauthorized_redirects_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs_common_data"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false,
                "messages": [{"message": "UNAUTHORIZED", "variant": "danger", "title": "Error"}]
            })))
            .mount(&server)
            .await;

        let f = fixture(&server, Some("stale"));
        let err = f.api.job_catalog("/jobs_common_data").await.unwrap_err();
        assert!(matches!(err, ApiError::AuthExpired));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*f.navigator.visited.lock(), vec!["/front/login".to_string()]);
    }

    #[tokio::test]
    async fn list_sends_query_and_decodes_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs/jobs"))
            .and(query_param("job_id", "test_job__1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "data": {
                    "items": [{"id": 1}, {"id": 2}],
                    "filters": {"job_id": {"key": "job_id", "label": "Specify Job ID", "type": "text", "value": null}},
                    "pagination": {"page": 1, "total_items": 51, "per_page": 25}
                },
                "messages": []
            })))
            .mount(&server)
            .await;

        let f = fixture(&server, None);
        let page = f
            .api
            .list("/logs/jobs", &[("job_id".to_string(), "test_job__1".to_string())])
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.filters.get("job_id").is_some());
        assert_eq!(page.pagination.unwrap().pages(), 3);
    }

    #[tokio::test]
    async fn job_operations_hit_item_routes() {
        let server = MockServer::start().await;
        let ok = |data: Value| {
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": data, "messages": []}))
        };
        Mock::given(method("POST"))
            .and(path("/jobs/pause/test_job__1"))
            .respond_with(ok(Value::Null))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/jobs/test_job__1"))
            .respond_with(ok(Value::Null))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs_common_data"))
            .respond_with(ok(json!({
                "available_jobs": [{"name": "test_job", "label": "Test job", "job_doc": "Prints a line"}],
                "job_triggers": [{"id": 1, "name": "cron", "label": "Cron", "description": "Cron-like schedule"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server, None);
        let routes = crate::config::ApiRoutes::default();

        f.api.pause_job(&routes.pause_job, "test_job__1").await.unwrap();
        f.api.delete(&routes.job, "test_job__1").await.unwrap();
        let catalog = f.api.job_catalog(&routes.job_common_data).await.unwrap();

        assert_eq!(catalog.module_description("test_job"), Some("Prints a line"));
        assert_eq!(catalog.trigger_description("cron"), Some("Cron-like schedule"));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let notifier = Arc::new(RecordingNotifier::default());
        let api = HttpAdminApi::new(
            &AdminConfig::for_api_url("http://127.0.0.1:1"),
            &Session::default(),
            notifier.clone(),
            Arc::new(RecordingNavigator::default()),
        );

        let err = api.fetch("/jobs/", "x").await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(notifier.seen.lock()[0].1, Severity::Danger);
    }
}
