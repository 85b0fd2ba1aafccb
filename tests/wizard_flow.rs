use async_trait::async_trait;
use httpmock::prelude::*;
use httpmock::MockServer;
use mektep_wizard::api::JobApiClient;
use mektep_wizard::config::Config;
use mektep_wizard::wizard::{
    ActionController, Category, ClientState, Confirm, ConfirmPrompt, Controls, RestartOutcome,
    StatusSnapshot, Step,
};
use serde_json::{json, Value};

struct Yes;

#[async_trait]
impl Confirm for Yes {
    async fn confirm(&self, _prompt: ConfirmPrompt) -> bool {
        true
    }
}

fn config_for(server: &MockServer) -> Config {
    Config {
        api_base_url: server.base_url(),
        credentials_step_delay_ms: 0,
        stop_settle_delay_ms: 0,
        ..Config::default()
    }
}

fn snapshot(value: Value) -> StatusSnapshot {
    serde_json::from_value(value).expect("snapshot should parse")
}

fn mock_credentials(server: &MockServer, stored: bool) {
    server.mock(|when, then| {
        when.method(GET).path("/api/credentials");
        then.status(200).json_body(json!({ "has_credentials": stored }));
    });
}

#[tokio::test]
async fn missing_reset_endpoint_falls_back_to_local_reset() {
    let server = MockServer::start_async().await;
    mock_credentials(&server, true);
    server.mock(|when, then| {
        when.method(GET).path("/api/status/scraper");
        then.status(200).json_body(json!({ "running": false, "progress": 60 }));
    });
    let reset = server.mock(|when, then| {
        when.method(POST).path("/api/reset");
        then.status(404).body("Not Found");
    });
    let config = config_for(&server);
    let api = JobApiClient::new(&config).expect("client");
    let mut state = ClientState::new(&config);

    let mut actions = ActionController::new(&api, &mut state, &config);
    assert!(actions.sync_credentials().await.expect("credential check"));

    state.apply_snapshot(&snapshot(json!({
        "running": true,
        "progress": 60,
        "waiting_for_class": true,
        "classes": [{ "number": 1, "name": "9A" }]
    })));
    assert_eq!(state.step(), Step::ClassSelection);

    let outcome = ActionController::new(&api, &mut state, &config)
        .restart(&Yes)
        .await
        .expect("404 is not an error");

    reset.assert();
    assert_eq!(outcome, RestartOutcome::LocalOnly);
    assert!(state.credentials_saved());
    assert_eq!(state.step(), Step::Launch);
    assert_eq!(state.progress(), None);
    assert!(state.classes().is_empty());
    assert_eq!(state.controls(), Controls::IDLE);
    assert!(state
        .logs()
        .lines()
        .iter()
        .any(|line| line.level == "warning" && line.source == "SYSTEM"));
}

#[tokio::test]
async fn reset_twice_lands_in_the_same_state() {
    let server = MockServer::start_async().await;
    mock_credentials(&server, false);
    server.mock(|when, then| {
        when.method(GET).path("/api/status/scraper");
        then.status(200).json_body(json!({ "running": false, "progress": 0 }));
    });
    let reset = server.mock(|when, then| {
        when.method(POST).path("/api/reset");
        then.status(200).json_body(json!({ "success": true }));
    });
    let config = config_for(&server);
    let api = JobApiClient::new(&config).expect("client");
    let mut state = ClientState::new(&config);

    let first = ActionController::new(&api, &mut state, &config)
        .restart(&Yes)
        .await
        .expect("first reset");
    let after_first = state.view_model();
    let second = ActionController::new(&api, &mut state, &config)
        .restart(&Yes)
        .await
        .expect("second reset");
    let mut after_second = state.view_model();

    assert_eq!(first, RestartOutcome::Reset);
    assert_eq!(second, RestartOutcome::Reset);
    assert_eq!(reset.calls(), 2);
    // Local log rows carry wall-clock timestamps.
    after_second.logs = after_first.logs.clone();
    assert_eq!(after_first, after_second);
    assert_eq!(state.step(), Step::Credentials);
    assert_eq!(state.progress(), None);
    assert!(state.schools().is_empty());
}

#[tokio::test]
async fn saved_credentials_survive_idle_snapshots() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/credentials");
        then.status(200).json_body(json!({ "success": true }));
    });
    let config = config_for(&server);
    let api = JobApiClient::new(&config).expect("client");
    let mut state = ClientState::new(&config);

    ActionController::new(&api, &mut state, &config)
        .save_credentials("a.sadykova", "secret")
        .await
        .expect("saved");

    for value in [
        json!({ "running": false, "progress": 0 }),
        json!({ "running": false, "progress": 40 }),
        json!({ "error": "Timeout", "running": false }),
        json!({ "running": false, "progress": 0, "message": "" }),
    ] {
        state.apply_snapshot(&snapshot(value));
        assert_ne!(state.step(), Step::Credentials);
        assert!(state.credentials_saved());
    }
}

#[tokio::test]
async fn full_run_walks_every_step() {
    let server = MockServer::start_async().await;
    mock_credentials(&server, true);
    server.mock(|when, then| {
        when.method(POST).path("/api/start/scraper");
        then.status(200).json_body(json!({ "success": true }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/select/school");
        then.status(200)
            .json_body(json!({ "success": true, "school": { "number": 2, "name": "Lyceum 2" } }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/select/class");
        then.status(200).json_body(json!({ "success": true, "class_name": "11A" }));
    });
    let files = server.mock(|when, then| {
        when.method(GET).path("/api/files");
        then.status(200).json_body(json!({
            "files": [
                { "name": "journal_raw.xlsx", "size": 4096, "modified": "2024-05-01 12:00:00" },
                { "name": "journal.xlsx", "size": 2048, "modified": "2024-05-01 12:05:00" }
            ]
        }));
    });
    let config = config_for(&server);
    let api = JobApiClient::new(&config).expect("client");
    let mut state = ClientState::new(&config);

    ActionController::new(&api, &mut state, &config)
        .sync_credentials()
        .await
        .expect("credential check");
    assert_eq!(state.step(), Step::Launch);

    ActionController::new(&api, &mut state, &config)
        .start_job()
        .await
        .expect("started");
    assert_eq!(state.category(), Some(Category::Running));

    state.apply_snapshot(&snapshot(json!({
        "running": true,
        "progress": 30,
        "waiting_for_school": true,
        "schools": [{ "number": 1, "name": "School 1" }, { "number": 2, "name": "Lyceum 2" }]
    })));
    assert_eq!(state.step(), Step::SchoolSelection);
    assert_eq!(state.schools().len(), 2);

    let school = ActionController::new(&api, &mut state, &config)
        .select_school(2)
        .await
        .expect("school selected");
    assert_eq!(school, "Lyceum 2");
    assert_eq!(state.step(), Step::SchoolSelection);

    state.apply_snapshot(&snapshot(json!({
        "running": true,
        "progress": 50,
        "waiting_for_class": true,
        "classes": [{ "number": 1, "name": "11A" }]
    })));
    assert_eq!(state.step(), Step::ClassSelection);

    ActionController::new(&api, &mut state, &config)
        .select_class("11A")
        .await
        .expect("class selected");

    let follow_ups = state.apply_snapshot(&snapshot(json!({ "running": false, "progress": 100 })));
    ActionController::new(&api, &mut state, &config)
        .run_follow_ups(&follow_ups)
        .await;

    files.assert();
    assert_eq!(state.step(), Step::Completed);
    assert_eq!(state.category(), Some(Category::Completed));
    assert_eq!(state.progress(), Some(50));
    let listing = state.files().expect("files loaded");
    assert_eq!(listing.intermediate[0].name, "journal_raw.xlsx");
    assert_eq!(listing.processed[0].download_path, "/api/download/journal.xlsx");
}
