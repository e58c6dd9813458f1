//! Chart context detection: upward walk, subchart chains, template
//! classification, and override-file discovery.

mod common;

use chartnav_lsp::chart::{detect_helm_chart, is_helm_template_file, root_ancestor};
use common::TestFixture;

#[test]
fn detects_root_chart_from_template() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "a: 1\n");
    let template = fixture.write_file("mychart/templates/deployment.yaml", "kind: Deployment\n");

    let context = detect_helm_chart(&template).expect("chart context");
    assert_eq!(context.chart_root, fixture.root.join("mychart"));
    assert!(!context.is_subchart);
    assert!(context.parent.is_none());
    assert!(context.subchart_name.is_none());
}

#[test]
fn no_chart_yields_none() {
    let fixture = TestFixture::new();
    let stray = fixture.write_file("plain/config.yaml", "a: 1\n");
    assert!(detect_helm_chart(&stray).is_none());
}

#[test]
fn resolves_nested_subchart_chain() {
    let fixture = TestFixture::new();
    fixture.create_chart("root", "root", "a: 1\n");
    fixture.create_chart("root/charts/child", "child", "b: 2\n");
    fixture.create_chart("root/charts/child/charts/grandchild", "grandchild", "c: 3\n");
    let template = fixture.write_file(
        "root/charts/child/charts/grandchild/templates/cm.yaml",
        "kind: ConfigMap\n",
    );

    let context = detect_helm_chart(&template).expect("chart context");
    assert!(context.is_subchart);
    assert_eq!(context.subchart_name.as_deref(), Some("grandchild"));

    let chain = context.ancestors_root_first();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0].chart_root, fixture.root.join("root"));
    assert_eq!(chain[1].chart_root, fixture.root.join("root/charts/child"));
    assert_eq!(chain[2].chart_root, context.chart_root);

    let root = root_ancestor(&context);
    assert_eq!(root.chart_root, fixture.root.join("root"));
    assert!(!root.is_subchart);
}

#[test]
fn chart_next_to_charts_dir_is_not_a_subchart() {
    let fixture = TestFixture::new();
    // A directory merely named `charts` without an enclosing chart.
    fixture.create_chart("charts/standalone", "standalone", "a: 1\n");
    let template = fixture.write_file("charts/standalone/templates/x.yaml", "kind: X\n");

    let context = detect_helm_chart(&template).expect("chart context");
    assert!(!context.is_subchart);
}

#[test]
fn subchart_values_key_prefers_alias() {
    let fixture = TestFixture::new();
    fixture.create_chart("root", "root", "a: 1\n");
    fixture.write_file(
        "root/Chart.yaml",
        "name: root\nversion: 0.1.0\ndependencies:\n  - name: sub\n    alias: aliased\n",
    );
    fixture.create_chart("root/charts/sub", "sub", "key: 1\n");
    let template = fixture.write_file("root/charts/sub/templates/x.yaml", "kind: X\n");

    let context = detect_helm_chart(&template).expect("chart context");
    assert_eq!(context.subchart_values_key().as_deref(), Some("aliased"));
}

#[test]
fn classifies_template_files() {
    let fixture = TestFixture::new();
    fixture.create_chart("mychart", "mychart", "a: 1\n");
    let deployment = fixture.write_file("mychart/templates/deployment.yaml", "kind: D\n");
    let helpers = fixture.write_file("mychart/templates/_helpers.tpl", "{{ define }}\n");
    let nested = fixture.write_file("mychart/templates/rbac/role.yml", "kind: Role\n");
    let notes = fixture.write_file("mychart/templates/NOTES.txt", "notes\n");

    assert!(is_helm_template_file(&deployment));
    assert!(is_helm_template_file(&helpers));
    assert!(is_helm_template_file(&nested));
    assert!(!is_helm_template_file(&notes));
    // Values files are not templates even though they are YAML.
    assert!(!is_helm_template_file(&fixture.root.join("mychart/values.yaml")));
    // A templates directory with no enclosing chart does not count.
    let orphan = fixture.write_file("elsewhere/templates/x.yaml", "kind: X\n");
    assert!(!is_helm_template_file(&orphan));
}

#[test]
fn discovers_override_files() {
    let fixture = TestFixture::new();
    let chart_root = fixture.create_chart("mychart", "mychart", "a: 1\n");
    fixture.write_file("mychart/values-prod.yaml", "a: 2\n");
    fixture.write_file("mychart/prod.values.yaml", "a: 3\n");
    fixture.write_file("mychart/values.staging.yml", "a: 4\n");
    fixture.write_file("mychart/values/dev.yaml", "a: 5\n");
    fixture.write_file("mychart/README.md", "docs\n");
    fixture.write_file("mychart/templates/x.yaml", "kind: X\n");

    let context = detect_helm_chart(&chart_root.join("values.yaml")).expect("chart context");
    let names: Vec<String> = context
        .values_override_files
        .iter()
        .map(|p| {
            p.strip_prefix(&chart_root)
                .unwrap()
                .display()
                .to_string()
        })
        .collect();

    assert!(names.contains(&"values-prod.yaml".to_string()));
    assert!(names.contains(&"prod.values.yaml".to_string()));
    assert!(names.contains(&"values.staging.yml".to_string()));
    assert!(names.contains(&"values/dev.yaml".to_string()));
    assert!(!names.contains(&"values.yaml".to_string()));
    assert!(!names.contains(&"README.md".to_string()));
}

#[test]
fn default_values_path_falls_back_to_yml() {
    let fixture = TestFixture::new();
    fixture.write_file("mychart/Chart.yaml", "name: mychart\nversion: 0.1.0\n");
    fixture.write_file("mychart/values.yml", "a: 1\n");
    let template = fixture.write_file("mychart/templates/x.yaml", "kind: X\n");

    let context = detect_helm_chart(&template).expect("chart context");
    assert_eq!(
        context.values_yaml_path,
        fixture.root.join("mychart/values.yml")
    );
}
