//! Handler-level go-to-definition tests against synthetic chart trees.

mod common;

use chartnav_lsp::server::handlers::handle_execute_command;
use common::{definition_at, position_of, TestFixture};
use serde_json::json;
use tower_lsp::lsp_types::{ExecuteCommandParams, Position, Url};

const TEMPLATE: &str = "\
apiVersion: apps/v1
kind: Deployment
spec:
  replicas: {{ .Values.replicas }}
  image: {{ .Values.image.repository }}:{{ .Values.image.tag }}
  name: {{ .Chart.Name }}
  ns: {{ .Release.Namespace }}
";

fn chart_with_template(fixture: &TestFixture) -> Url {
    fixture.create_chart(
        "mychart",
        "mychart",
        "replicas: 1\nimage:\n  repository: nginx\n  tag: latest\n",
    );
    fixture.write_file("mychart/templates/deployment.yaml", TEMPLATE);
    fixture.file_url("mychart/templates/deployment.yaml")
}

#[tokio::test]
async fn navigates_to_the_defining_key_in_values_yaml() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    let position = position_of(TEMPLATE, ".Values.image.repository", 17);
    let location = definition_at(&fixture, &uri, position)
        .await
        .expect("location");

    assert_eq!(
        location.uri.to_file_path().unwrap(),
        fixture.root.join("mychart/values.yaml")
    );
    assert_eq!(location.range.start, Position::new(2, 2));
    assert_eq!(location.range.end, Position::new(2, 2 + "repository".len() as u32));
}

#[tokio::test]
async fn span_ends_are_inclusive() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    // Cursor on the leading dot and one past the final character both
    // count as on the reference.
    let start = position_of(TEMPLATE, ".Values.replicas", 0);
    assert!(definition_at(&fixture, &uri, start).await.is_some());
    let end = position_of(TEMPLATE, ".Values.replicas", ".Values.replicas".len());
    assert!(definition_at(&fixture, &uri, end).await.is_some());
}

#[tokio::test]
async fn cursor_off_any_reference_finds_nothing() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    assert!(definition_at(&fixture, &uri, Position::new(0, 3))
        .await
        .is_none());
}

#[tokio::test]
async fn selected_override_redirects_navigation() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);
    fixture.write_file("mychart/values-prod.yaml", "replicas: 5\n");

    // Select the override through the command surface, as the client does.
    let response = handle_execute_command(
        ExecuteCommandParams {
            command: "chartnav.values.select".to_string(),
            arguments: vec![
                json!(fixture.root.join("mychart/values.yaml").display().to_string()),
                json!(fixture
                    .root
                    .join("mychart/values-prod.yaml")
                    .display()
                    .to_string()),
            ],
            work_done_progress_params: Default::default(),
        },
        &fixture.state,
    )
    .await
    .expect("command response");
    assert_eq!(response.get("success"), Some(&json!(true)));

    let position = position_of(TEMPLATE, ".Values.replicas", 10);
    let location = definition_at(&fixture, &uri, position)
        .await
        .expect("location");
    assert_eq!(
        location.uri.to_file_path().unwrap(),
        fixture.root.join("mychart/values-prod.yaml")
    );
    assert_eq!(location.range.start, Position::new(0, 0));

    // Keys the override does not touch keep resolving to the default.
    let position = position_of(TEMPLATE, ".Values.image.tag", 14);
    let location = definition_at(&fixture, &uri, position)
        .await
        .expect("location");
    assert_eq!(
        location.uri.to_file_path().unwrap(),
        fixture.root.join("mychart/values.yaml")
    );
}

#[tokio::test]
async fn chart_references_navigate_to_the_manifest() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    let position = position_of(TEMPLATE, ".Chart.Name", 8);
    let location = definition_at(&fixture, &uri, position)
        .await
        .expect("location");
    assert_eq!(
        location.uri.to_file_path().unwrap(),
        fixture.root.join("mychart/Chart.yaml")
    );
    // `name: mychart` is the first manifest line.
    assert_eq!(location.range.start, Position::new(0, 0));
}

#[tokio::test]
async fn release_references_have_no_definition() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    let position = position_of(TEMPLATE, ".Release.Namespace", 10);
    assert!(definition_at(&fixture, &uri, position).await.is_none());
}

#[tokio::test]
async fn undefined_paths_degrade_to_no_definition() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "a: 1\n");
    let template = "x: {{ .Values.does.not.exist }}\n";
    fixture.write_file("mychart/templates/x.yaml", template);
    let uri = fixture.file_url("mychart/templates/x.yaml");

    let position = position_of(template, ".Values.does.not.exist", 10);
    assert!(definition_at(&fixture, &uri, position).await.is_none());
}

#[tokio::test]
async fn files_outside_charts_find_nothing() {
    let fixture = TestFixture::new();
    let template = "x: {{ .Values.a }}\n";
    fixture.write_file("not-a-chart/templates/x.yaml", template);
    let uri = fixture.file_url("not-a-chart/templates/x.yaml");

    let position = position_of(template, ".Values.a", 9);
    assert!(definition_at(&fixture, &uri, position).await.is_none());
}

#[tokio::test]
async fn values_files_are_not_navigation_sources() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "a: {{ .Values.a }}\n");
    let uri = fixture.file_url("mychart/values.yaml");

    assert!(definition_at(&fixture, &uri, Position::new(0, 10))
        .await
        .is_none());
}

#[tokio::test]
async fn malformed_values_never_error() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "a: [unclosed\n  b: {\n");
    let template = "x: {{ .Values.a }}\n";
    fixture.write_file("mychart/templates/x.yaml", template);
    let uri = fixture.file_url("mychart/templates/x.yaml");

    let position = position_of(template, ".Values.a", 9);
    assert!(definition_at(&fixture, &uri, position).await.is_none());
}

#[tokio::test]
async fn open_document_content_wins_over_disk() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "fromdoc: 1\n");
    fixture.write_file("mychart/templates/x.yaml", "stale: content\n");
    let uri = fixture.file_url("mychart/templates/x.yaml");

    let edited = "x: {{ .Values.fromdoc }}\n";
    fixture
        .state
        .documents
        .open(uri.clone(), "helm".to_string(), edited.to_string(), 1);

    let position = position_of(edited, ".Values.fromdoc", 10);
    let location = definition_at(&fixture, &uri, position)
        .await
        .expect("location");
    assert_eq!(
        location.uri.to_file_path().unwrap(),
        fixture.root.join("mychart/values.yaml")
    );
}

#[tokio::test]
async fn definition_can_be_disabled_by_configuration() {
    let fixture = TestFixture::new();
    let uri = chart_with_template(&fixture);

    fixture
        .state
        .config
        .set_init_settings(Some(json!({ "features": { "definition": false } })));
    fixture
        .state
        .config
        .load_from_workspace(&fixture.root)
        .unwrap();

    let position = position_of(TEMPLATE, ".Values.replicas", 10);
    assert!(definition_at(&fixture, &uri, position).await.is_none());
}
