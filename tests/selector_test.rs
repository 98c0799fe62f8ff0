//! Tests for experiment target selectors
//!
//! These tests verify the selector construction rules and the CRD wire
//! format produced by `to_wire`.

use chaosmesh_sdk::{ChaosSelector, Error, ExpressionSelector};

#[test]
fn test_labels_and_pods_are_mutually_exclusive() {
    let result = ChaosSelector::builder()
        .labels([("app", "web")])
        .pods("default", ["web-0", "web-1"])
        .build();

    match result {
        Err(Error::AmbiguousSelector(reason)) => {
            assert!(reason.contains("label"), "unexpected reason: {}", reason);
        }
        other => panic!("expected AmbiguousSelector, got {:?}", other),
    }
}

#[test]
fn test_empty_selector_is_rejected() {
    assert!(matches!(
        ChaosSelector::builder().build(),
        Err(Error::AmbiguousSelector(_))
    ));
}

#[test]
fn test_each_single_mechanism_is_sufficient() {
    assert!(ChaosSelector::from_labels([("app", "web")]).is_ok());
    assert!(ChaosSelector::from_pods("default", ["web-0"]).is_ok());
    assert!(ChaosSelector::builder()
        .field_selectors([("status.phase", "Running")])
        .build()
        .is_ok());
    assert!(ChaosSelector::builder()
        .annotation_selectors([("team", "platform")])
        .build()
        .is_ok());
    assert!(ChaosSelector::builder()
        .node_selectors([("zone", "us-west-1a")])
        .build()
        .is_ok());
    assert!(ChaosSelector::builder().pod_phases(["Running"]).build().is_ok());
    assert!(ChaosSelector::builder()
        .expression(ExpressionSelector::new(
            "tier",
            "NotIn",
            vec!["canary".to_string()],
        ))
        .build()
        .is_ok());
}

#[test]
fn test_wire_form_uses_camel_case_and_omits_empty() {
    let selector = ChaosSelector::builder()
        .namespaces(["production"])
        .labels([("app", "web"), ("tier", "frontend")])
        .node_selectors([("zone", "us-east-1a")])
        .pod_phases(["Running"])
        .build()
        .unwrap();

    let wire = selector.to_wire();

    assert_eq!(wire["namespaces"], serde_json::json!(["production"]));
    assert_eq!(wire["labelSelectors"]["app"], "web");
    assert_eq!(wire["labelSelectors"]["tier"], "frontend");
    assert_eq!(wire["nodeSelectors"]["zone"], "us-east-1a");
    assert_eq!(wire["podPhaseSelectors"], serde_json::json!(["Running"]));

    assert!(wire.get("pods").is_none());
    assert!(wire.get("fieldSelectors").is_none());
    assert!(wire.get("annotationSelectors").is_none());
    assert!(wire.get("expressionSelectors").is_none());
}

#[test]
fn test_wire_form_is_deterministic() {
    let selector = ChaosSelector::builder()
        .labels([("b", "2"), ("a", "1"), ("c", "3")])
        .build()
        .unwrap();

    assert_eq!(selector.to_wire(), selector.to_wire());
    assert_eq!(
        serde_json::to_string(&selector.to_wire()).unwrap(),
        serde_json::to_string(&selector.to_wire()).unwrap()
    );
}

#[test]
fn test_expression_selector_wire_shape() {
    let selector = ChaosSelector::builder()
        .expression(ExpressionSelector::new(
            "tier",
            "In",
            vec!["frontend".to_string(), "backend".to_string()],
        ))
        .build()
        .unwrap();

    let wire = selector.to_wire();
    let expr = &wire["expressionSelectors"][0];
    assert_eq!(expr["key"], "tier");
    assert_eq!(expr["operator"], "In");
    assert_eq!(expr["values"], serde_json::json!(["frontend", "backend"]));
}
