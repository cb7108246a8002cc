use super::*;
use crate::clusterer::{Coord, cluster_color};

fn started() -> Session {
    let mut params = DemoParams::new();
    params.insert("k".to_string(), 4.into());

    let mut session = Session::new();
    session.apply(&Event::SessionStarted {
        script_id: "ml-clustering".to_string(),
        default_params: params,
        explanations: vec!["intro".to_string()],
    });
    session
}

fn add(session: &mut Session, id: &str, x: f64, y: f64) {
    session.apply(&Event::PointAdded {
        point: Point::new(id, x, y),
    });
}

#[test]
fn test_new_session_is_waiting() {
    let session = Session::new();
    assert_eq!(session.step, Step::Waiting);
    assert!(!session.is_running);
    assert!(session.points.is_empty());
    assert!(session.clusters.is_empty());
    assert_eq!(session.default_k(), DEFAULT_K);
    assert_eq!(session.max_points(), None);
}

#[test]
fn test_session_started() {
    let session = started();
    assert!(session.is_running);
    assert_eq!(session.step, Step::Started);
    assert_eq!(session.active_script_id.as_deref(), Some("ml-clustering"));
    assert_eq!(session.explanations, vec!["intro".to_string()]);
    assert_eq!(session.default_k(), 4);
}

#[test]
fn test_point_edits() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);
    add(&mut session, "b", 2.0, 2.0);

    session.apply(&Event::PointMoved {
        id: "a".to_string(),
        x: 5.0,
        y: 6.0,
    });
    assert_eq!(session.point("a").map(|p| (p.x, p.y)), Some((5.0, 6.0)));

    session.apply(&Event::PointRemoved { id: "b".to_string() });
    assert!(!session.contains_point("b"));
    assert_eq!(session.points.len(), 1);
}

#[test]
fn test_move_missing_point_is_noop() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);
    let before = session.clone();

    session.apply(&Event::PointMoved {
        id: "ghost".to_string(),
        x: 9.0,
        y: 9.0,
    });
    assert_eq!(session, before);
}

#[test]
fn test_clustering_lifecycle() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);

    session.apply(&Event::ClusteringStarted);
    assert_eq!(session.step, Step::ClusteringRunning);

    let mut member = Point::new("a", 1.0, 1.0);
    member.cluster_id = Some(0);
    member.color = Some(cluster_color(0).to_string());
    let cluster = crate::clusterer::Cluster {
        id: 0,
        centroid: Coord::new(1.0, 1.0),
        points: vec![member.clone()],
        color: cluster_color(0).to_string(),
    };

    session.apply(&Event::ClusteringComplete {
        clusters: vec![cluster],
        points: vec![member],
        explanations: vec!["done".to_string()],
    });
    assert_eq!(session.step, Step::ClusteringComplete);
    assert_eq!(session.clusters.len(), 1);
    assert_eq!(session.points[0].cluster_id, Some(0));
    assert_eq!(session.explanations, vec!["done".to_string()]);
}

#[test]
fn test_clustering_failed_reverts_to_started() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);
    session.apply(&Event::ClusteringStarted);

    session.apply(&Event::ClusteringFailed {
        explanations: vec!["Clustering failed: boom".to_string()],
    });
    assert_eq!(session.step, Step::Started);
    assert_eq!(session.points.len(), 1);
}

#[test]
fn test_points_cleared() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);
    session.apply(&Event::ClusteringStarted);

    session.apply(&Event::PointsCleared {
        explanations: vec![],
    });
    assert!(session.is_running);
    assert!(session.points.is_empty());
    assert!(session.clusters.is_empty());
    assert_eq!(session.step, Step::Started);
}

#[test]
fn test_session_ended_resets_everything() {
    let mut session = started();
    add(&mut session, "a", 1.0, 1.0);

    session.apply(&Event::SessionEnded);
    assert_eq!(session, Session::new());
}

#[test]
fn test_step_accepts_edits() {
    assert!(!Step::Waiting.accepts_edits());
    assert!(Step::Started.accepts_edits());
    assert!(!Step::ClusteringRunning.accepts_edits());
    assert!(Step::ClusteringComplete.accepts_edits());
}

#[test]
fn test_step_wire_names() {
    assert_eq!(
        serde_json::to_string(&Step::ClusteringRunning).unwrap(),
        "\"clustering-running\""
    );
    assert_eq!(Step::ClusteringComplete.to_string(), "clustering-complete");
}

#[test]
fn test_step_names_match_serde() {
    for step in [
        Step::Waiting,
        Step::Started,
        Step::ClusteringRunning,
        Step::ClusteringComplete,
    ] {
        assert_eq!(serde_json::to_value(step).unwrap(), step.as_str());
    }
}

#[test]
fn test_event_names_match_serde_tag() {
    let events = [
        Event::SessionStarted {
            script_id: "ml-clustering".to_string(),
            default_params: DemoParams::new(),
            explanations: vec![],
        },
        Event::PointAdded {
            point: Point::new("p1", 1.0, 2.0),
        },
        Event::PointMoved {
            id: "p1".to_string(),
            x: 0.0,
            y: 0.0,
        },
        Event::PointRemoved {
            id: "p1".to_string(),
        },
        Event::PointsCleared {
            explanations: vec![],
        },
        Event::ClusteringStarted,
        Event::ClusteringComplete {
            clusters: vec![],
            points: vec![],
            explanations: vec![],
        },
        Event::ClusteringFailed {
            explanations: vec![],
        },
        Event::SessionEnded,
    ];
    for event in events {
        assert_eq!(serde_json::to_value(&event).unwrap()["type"], event.name());
    }
}

#[test]
fn test_event_wire_format() {
    let json = serde_json::to_value(Event::PointMoved {
        id: "p1".to_string(),
        x: 1.5,
        y: 2.5,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "point-moved", "id": "p1", "x": 1.5, "y": 2.5})
    );

    let json = serde_json::to_value(Event::ClusteringStarted).unwrap();
    assert_eq!(json, serde_json::json!({"type": "clustering-started"}));

    let json = serde_json::to_value(Event::SessionStarted {
        script_id: "ml-clustering".to_string(),
        default_params: DemoParams::new(),
        explanations: vec![],
    })
    .unwrap();
    assert_eq!(json["scriptId"], "ml-clustering");
    assert!(json["defaultParams"].is_object());
}

#[test]
fn test_point_wire_format() {
    let json = serde_json::to_value(Point::new("p", 1.0, 2.0)).unwrap();
    assert_eq!(json, serde_json::json!({"id": "p", "x": 1.0, "y": 2.0}));

    let mut point = Point::new("p", 1.0, 2.0);
    point.cluster_id = Some(1);
    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(json["clusterId"], 1);
}

#[test]
fn test_command_error_codes() {
    assert_eq!(CommandError::NotFound("x".into()).code(), "not-found");
    assert_eq!(
        CommandError::InvalidArgument("x".into()).code(),
        "invalid-argument"
    );
    assert_eq!(
        CommandError::ComputationFailure("x".into()).code(),
        "computation-failure"
    );
}
