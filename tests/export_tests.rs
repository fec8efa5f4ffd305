//! End-to-end tests for document export against a mock server.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use tms_client::api::models::User;
use tms_client::config::ClientConfig;
use tms_client::error::TmsError;
use tms_client::export::{
    DownloadArea, EntityType, ExportEndpoint, ExportOptions, ExportState, Exporter,
};
use tms_client::navigation::Route;
use tms_client::session::MemoryTokenStore;
use tms_client::App;

const MARKDOWN: &str = "# Smoke plan\n\n- [ ] login works\n";

fn signed_in_app(server: &ServerGuard) -> App {
    let config = ClientConfig {
        base_url: server.url(),
        ..ClientConfig::default()
    };
    let app = App::with_token_store(config, MemoryTokenStore::new()).unwrap();
    let user = User {
        id: "u1".into(),
        email: "ada@example.com".into(),
        role: "user".into(),
        created_at: None,
        updated_at: None,
    };
    app.session.login(user, "tok".into()).unwrap();
    app
}

fn exporter_in(app: &App, dir: &TempDir) -> Exporter {
    Exporter::new(app.client.clone(), DownloadArea::new(dir.path().to_path_buf()))
}

fn entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn export_sends_one_request_with_flags() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/export")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(json!({
            "entity_type": "test_plan",
            "entity_id": "42",
            "format": "markdown",
            "include_history": true,
            "include_comments": false,
        })))
        .with_status(200)
        .with_header("content-type", "text/markdown")
        .with_body(MARKDOWN)
        .expect(1)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let exporter = exporter_in(&app, &tmp);

    let path = exporter
        .export_test_plan("42", ExportOptions::WITH_HISTORY)
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(path, tmp.path().join("test_plan_42.md"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), MARKDOWN);
}

#[tokio::test]
async fn server_filename_is_used_when_present() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_header("content-disposition", r#"attachment; filename="Smoke Plan.md""#)
        .with_body(MARKDOWN)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let path = exporter_in(&app, &tmp)
        .export_checklist("c1", ExportOptions::BASIC)
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("Smoke Plan.md"));
}

#[tokio::test]
async fn bare_filename_and_traversal_are_handled() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_header("content-disposition", "attachment; filename=../run_7.md")
        .with_body(MARKDOWN)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let path = exporter_in(&app, &tmp)
        .export_test_run("7", ExportOptions::BASIC)
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("run_7.md"));
}

#[tokio::test]
async fn non_ascii_server_filename_is_kept() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_header(
            "content-disposition",
            "attachment; filename=test_plan_Релиз_20250101_120000.md",
        )
        .with_body(MARKDOWN)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let path = exporter_in(&app, &tmp)
        .export_test_plan("42", ExportOptions::BASIC)
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("test_plan_Релиз_20250101_120000.md"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), MARKDOWN);
}

#[tokio::test]
async fn id_with_separators_saves_in_download_dir() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .match_body(Matcher::PartialJson(json!({"entity_id": "team/42"})))
        .with_status(200)
        .with_body(MARKDOWN)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let path = exporter_in(&app, &tmp)
        .export_test_plan("team/42", ExportOptions::BASIC)
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("test_plan_team_42.md"));
    assert_eq!(entries(&tmp), ["test_plan_team_42.md"]);
}

#[tokio::test]
async fn repeated_exports_release_every_reference() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_body(MARKDOWN)
        .expect(5)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let exporter = exporter_in(&app, &tmp);

    for _ in 0..5 {
        exporter
            .export_test_case("tc1", ExportOptions::COMPLETE)
            .await
            .unwrap();
    }

    assert_eq!(exporter.downloads().live_references(), 0);
    assert_eq!(exporter.downloads().released_references(), 5);
    assert_eq!(
        entries(&tmp),
        [
            "test_case_tc1 (1).md",
            "test_case_tc1 (2).md",
            "test_case_tc1 (3).md",
            "test_case_tc1 (4).md",
            "test_case_tc1.md",
        ]
    );
}

#[tokio::test]
async fn failed_export_writes_nothing() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(500)
        .with_body("renderer crashed")
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let exporter = exporter_in(&app, &tmp);

    let err = exporter
        .export_test_strategy("s1", ExportOptions::BASIC)
        .await
        .unwrap_err();
    assert!(matches!(err, TmsError::Api { status: 500, .. }), "{err:?}");

    assert!(entries(&tmp).is_empty());
    assert_eq!(exporter.downloads().live_references(), 0);
    assert_eq!(exporter.state(), ExportState::Idle);
}

#[tokio::test]
async fn export_unauthorized_tears_down_session() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(401)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();

    let err = exporter_in(&app, &tmp)
        .export_test_plan("42", ExportOptions::BASIC)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(app.session.token().is_none());
    assert_eq!(app.view.current(), Route::Login);
    assert!(entries(&tmp).is_empty());
}

#[tokio::test]
async fn empty_id_is_rejected_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/export")
        .expect(0)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let err = exporter_in(&app, &tmp)
        .export_entity(EntityType::TestPlan, "  ", ExportOptions::BASIC)
        .await
        .unwrap_err();

    assert!(matches!(err, TmsError::InvalidRequest { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn second_trigger_while_exporting_is_refused() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_body(MARKDOWN)
        .expect(1)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let exporter = exporter_in(&app, &tmp);

    let (first, second) = tokio::join!(
        exporter.export_test_plan("1", ExportOptions::BASIC),
        exporter.export_test_plan("1", ExportOptions::BASIC),
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(TmsError::ExportInProgress)));
    assert_eq!(exporter.state(), ExportState::Idle);
    assert_eq!(entries(&tmp), ["test_plan_1.md"]);
}

#[tokio::test]
async fn per_entity_endpoint_uses_query_flags() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/checklists/c9/export")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "markdown".into()),
            Matcher::UrlEncoded("include_history".into(), "false".into()),
            Matcher::UrlEncoded("include_comments".into(), "true".into()),
        ]))
        .match_header("accept", "*/*")
        .with_status(200)
        .with_header("content-disposition", "attachment; filename=checklist_c9.md")
        .with_body(MARKDOWN)
        .expect(1)
        .create_async()
        .await;

    let app = signed_in_app(&server);
    let tmp = TempDir::new().unwrap();
    let exporter = exporter_in(&app, &tmp).with_endpoint(ExportEndpoint::PerEntity);

    let path = exporter
        .export_checklist("c9", ExportOptions::WITH_COMMENTS)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(path, tmp.path().join("checklist_c9.md"));
}

#[tokio::test]
async fn app_exporter_saves_into_configured_dir() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/export")
        .with_status(200)
        .with_body(MARKDOWN)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let mut app = signed_in_app(&server);
    app.config.download_dir = Some(tmp.path().to_path_buf());

    let path = app
        .exporter()
        .export_test_plan("9", ExportOptions::BASIC)
        .await
        .unwrap();
    assert_eq!(path, tmp.path().join("test_plan_9.md"));
}
