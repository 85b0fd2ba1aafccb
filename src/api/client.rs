use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::types::WizardError;
use crate::wizard::StatusSnapshot;

use super::helpers::{join_url, normalize_base_url};
use super::requests::{SaveCredentialsRequest, SelectClassRequest, SelectSchoolRequest};
use super::types::{
    ClassSelected, CredentialsStatus, ErrorBody, FileEntry, FilesResponse, LogEntry,
    LogsResponse, SchoolSelected,
};

/// HTTP client for the scraper job service.
#[derive(Clone)]
pub struct JobApiClient {
    http: Client,
    base_url: String,
}

impl JobApiClient {
    pub fn new(config: &Config) -> Result<Self, WizardError> {
        let base_url = normalize_base_url(&config.api_base_url)?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(WizardError::Http)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Readiness probe; any successful JSON answer means the service is up.
    pub async fn probe(&self) -> Result<Value, WizardError> {
        self.get_json("/api/test")
            .await
            .map_err(|err| WizardError::NotReady(err.to_string()))
    }

    pub async fn has_credentials(&self) -> Result<bool, WizardError> {
        let status: CredentialsStatus = self.get_json("/api/credentials").await?;
        Ok(status.has_credentials)
    }

    pub async fn save_credentials(&self, login: &str, password: &str) -> Result<(), WizardError> {
        let body = SaveCredentialsRequest { login, password };
        let _: Value = self.post_json("/api/credentials", Some(&body)).await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<StatusSnapshot, WizardError> {
        self.get_json("/api/status/scraper").await
    }

    pub async fn start_job(&self) -> Result<(), WizardError> {
        let _: Value = self.post_json::<_, ()>("/api/start/scraper", None).await?;
        Ok(())
    }

    /// Best effort: the stop endpoint has no response body contract.
    pub async fn stop_job(&self) -> Result<(), WizardError> {
        let path = "/api/stop/scraper";
        let response = self.http.post(join_url(&self.base_url, path)).send().await?;
        ensure_success(path, response).await.map(|_| ())
    }

    /// Returns the selected school's name as confirmed by the server.
    pub async fn select_school(&self, school_number: i64) -> Result<String, WizardError> {
        let body = SelectSchoolRequest { school_number };
        let selected: SchoolSelected = self.post_json("/api/select/school", Some(&body)).await?;
        Ok(selected
            .school
            .and_then(|school| school.name)
            .unwrap_or_else(|| format!("#{school_number}")))
    }

    /// Returns the selected class name as confirmed by the server.
    pub async fn select_class(&self, class_name: &str) -> Result<String, WizardError> {
        let body = SelectClassRequest { class_name };
        let selected: ClassSelected = self.post_json("/api/select/class", Some(&body)).await?;
        Ok(selected
            .class_name
            .unwrap_or_else(|| class_name.to_string()))
    }

    pub async fn reset(&self) -> Result<Value, WizardError> {
        self.post_json::<_, ()>("/api/reset", None).await
    }

    pub async fn files(&self) -> Result<Vec<FileEntry>, WizardError> {
        let listing: FilesResponse = self.get_json("/api/files").await?;
        Ok(listing.files)
    }

    pub async fn logs(&self) -> Result<Vec<LogEntry>, WizardError> {
        let logs: LogsResponse = self.get_json("/api/logs").await?;
        Ok(logs.logs)
    }

    /// URL of `GET /api/download/{name}` with the name percent-encoded.
    pub fn download_url(&self, file_name: &str) -> Result<Url, WizardError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| WizardError::Config(format!("Invalid API base URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| WizardError::Config("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "download", file_name]);
        Ok(url)
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, WizardError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(join_url(&self.base_url, path))
            .send()
            .await
            .map_err(WizardError::Http)?;

        let response = ensure_success(path, response).await?;
        response.json::<T>().await.map_err(WizardError::Http)
    }

    async fn post_json<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, WizardError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(join_url(&self.base_url, path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(WizardError::Http)?;

        let response = ensure_success(path, response).await?;
        response.json::<T>().await.map_err(WizardError::Http)
    }
}

/// Turn a non-2xx response into `WizardError::Rejected`, preferring the
/// server's `{"error": ...}` message.
async fn ensure_success(path: &str, response: Response) -> Result<Response, WizardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("{path} returned {status}"));
    debug!(path, %status, message = %message, "Request rejected");

    Err(WizardError::Rejected {
        path: path.to_string(),
        status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn client_for(server: &MockServer) -> JobApiClient {
        let config = Config {
            api_base_url: server.base_url(),
            ..Config::default()
        };
        JobApiClient::new(&config).expect("client should build")
    }

    #[tokio::test]
    async fn status_parses_snapshot() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/status/scraper");
            then.status(200).json_body(json!({
                "running": true,
                "progress": 20,
                "current_step": "Authentication",
                "message": "Opening browser",
                "error": null,
                "waiting_for_school": false,
                "waiting_for_class": false,
                "schools": [],
                "classes": [],
                "auth_wait_time": 4
            }));
        });

        let snapshot = client_for(&server)
            .status()
            .await
            .expect("status should parse");
        mock.assert();
        assert!(snapshot.running);
        assert_eq!(snapshot.progress, 20);
        assert_eq!(snapshot.auth_wait_time, Some(4));
    }

    #[tokio::test]
    async fn save_credentials_posts_login_and_password() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/credentials")
                .json_body(json!({ "login": "a.sadykova", "password": "secret" }));
            then.status(200).json_body(json!({ "status": "saved" }));
        });

        client_for(&server)
            .save_credentials("a.sadykova", "secret")
            .await
            .expect("save should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn rejection_carries_server_error_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/start/scraper");
            then.status(400)
                .json_body(json!({ "error": "Scraper already running" }));
        });

        let err = client_for(&server)
            .start_job()
            .await
            .expect_err("start should be rejected");
        assert!(matches!(
            &err,
            WizardError::Rejected { status, message, .. }
                if *status == reqwest::StatusCode::BAD_REQUEST && message == "Scraper already running"
        ));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn missing_endpoint_is_not_found() {
        let server = MockServer::start_async().await;
        let err = client_for(&server)
            .reset()
            .await
            .expect_err("reset endpoint is absent");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "/api/reset returned 404 Not Found");
    }

    #[tokio::test]
    async fn malformed_body_is_an_http_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/logs");
            then.status(200).body("<html>oops</html>");
        });

        let err = client_for(&server)
            .logs()
            .await
            .expect_err("html is not a log list");
        assert!(matches!(err, WizardError::Http(_)));
    }

    #[tokio::test]
    async fn selections_return_confirmed_names() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/select/school")
                .json_body(json!({ "school_number": 12 }));
            then.status(200)
                .json_body(json!({ "status": "ok", "school": { "number": 12, "name": "Gymnasium 12" } }));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/select/class")
                .json_body(json!({ "class_name": "9A" }));
            then.status(200)
                .json_body(json!({ "status": "ok", "class_name": "9A" }));
        });

        let client = client_for(&server);
        assert_eq!(
            client.select_school(12).await.expect("school selected"),
            "Gymnasium 12"
        );
        assert_eq!(
            client.select_class("9A").await.expect("class selected"),
            "9A"
        );
    }

    #[tokio::test]
    async fn stop_ignores_response_body() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/stop/scraper");
            then.status(200).body("stopped");
        });

        client_for(&server)
            .stop_job()
            .await
            .expect("stop should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn files_and_credentials_parse() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/files");
            then.status(200).json_body(json!({
                "files": [{ "name": "result.xlsx", "size": 2048, "modified": "2024-03-01 12:00:00" }]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/credentials");
            then.status(200).json_body(json!({ "has_credentials": true }));
        });

        let client = client_for(&server);
        let files = client.files().await.expect("files should parse");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 2048);
        assert!(client.has_credentials().await.expect("credentials check"));
    }

    #[test]
    fn download_url_encodes_name() {
        let config = Config {
            api_base_url: "http://127.0.0.1:5000/".to_string(),
            ..Config::default()
        };
        let client = JobApiClient::new(&config).expect("client should build");
        let url = client
            .download_url("report 9A.xlsx")
            .expect("url should build");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/download/report%209A.xlsx"
        );
    }
}
