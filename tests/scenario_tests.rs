//! Integrationstests für die Editier-Szenarien über die öffentliche Session:
//! - Drag eines geteilten Shape-Points mit kleinem und großem Fangradius
//! - Split mit Attribut- und Abbiegeverbot-Vererbung
//! - Löschen eines Links mit angehängter Adresse
//! - Undo/Redo-Klemmung
//! - Undo/Redo über Split und Löschen hinweg

use glam::DVec2;
use link_topology_editor::app::use_cases::drag::drag_shape;
use link_topology_editor::app::use_cases::editing::{remove_feature, set_attribute};
use link_topology_editor::app::use_cases::history::{redo, undo};
use link_topology_editor::app::use_cases::submit::submit;
use link_topology_editor::app::use_cases::topology::split_link;
use link_topology_editor::core::RoutingPoint;
use link_topology_editor::{
    EditSession, EditorOptions, Feature, FeatureId, FeatureProvider, HistoryInfo, Link,
    LocalProvider, Place, PlaceKind, ShapePoint,
};
use serde_json::json;

/// L1 und L2 teilen sich den Start-Vertex bei (100, 300).
fn shared_start_links() -> Vec<Feature> {
    vec![
        Feature::Link(Link::new(
            "l1",
            vec![DVec2::new(100.0, 300.0), DVec2::new(400.0, 300.0)],
        )),
        Feature::Link(Link::new(
            "l2",
            vec![DVec2::new(100.0, 300.0), DVec2::new(100.0, 100.0)],
        )),
    ]
}

// ─── Drag mit Fangradius ────────────────────────────────────────────────────

#[test]
fn test_drag_mit_kleinem_fangradius_aendert_nur_gezogenen_link() {
    let options = EditorOptions {
        auto_connect_shape_distance: 10.0,
        ..EditorOptions::default()
    };
    let mut session = EditSession::with_features(options, shared_start_links()).unwrap();

    assert!(drag_shape(
        &mut session,
        ShapePoint::new("l2", 0),
        DVec2::new(0.0, 65.0)
    )
    .unwrap());

    assert_eq!(session.info().changes, 1, "nur L2 darf geändert sein");
    assert_eq!(
        session.map().vertex(&ShapePoint::new("l1", 0)).unwrap(),
        DVec2::new(100.0, 300.0)
    );
    assert_eq!(
        session.map().vertex(&ShapePoint::new("l2", 0)).unwrap(),
        DVec2::new(100.0, 365.0)
    );
}

#[test]
fn test_drag_mit_standard_fangradius_aendert_beide_links() {
    let mut session =
        EditSession::with_features(EditorOptions::default(), shared_start_links()).unwrap();

    drag_shape(&mut session, ShapePoint::new("l2", 0), DVec2::new(0.0, 65.0)).unwrap();

    assert_eq!(session.info().changes, 2);
    assert_eq!(session.info().length, 1, "ein Drag ergibt genau einen Step");
    assert_eq!(
        session.map().connected_links(&ShapePoint::new("l2", 0), 1e-9),
        vec![FeatureId::from("l1")]
    );
}

// ─── Split ──────────────────────────────────────────────────────────────────

#[test]
fn test_split_am_letzten_inneren_punkt_vererbt_attribute() {
    let mut parent = Link::new(
        "parent",
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(100.0, 0.0),
            DVec2::new(200.0, 0.0),
            DVec2::new(300.0, 0.0),
        ],
    )
    .with_property("type", "road")
    .with_property("name", "Ringstrasse")
    .with_property("direction", "FORWARD")
    .with_property("pedestrianOnly", true);
    parent.turn_restriction.end = vec!["abc".into()];
    let abc = Link::new("abc", vec![DVec2::new(300.0, 0.0), DVec2::new(300.0, 100.0)]);

    let mut session = EditSession::with_features(
        EditorOptions::default(),
        [Feature::Link(parent), Feature::Link(abc)],
    )
    .unwrap();

    let (first, second) = split_link(&mut session, &ShapePoint::new("parent", 2))
        .unwrap()
        .expect("Split muss gelingen");

    for id in [&first, &second] {
        let part = session.map().link(id).unwrap();
        assert!(part.turn_restriction.start.is_empty());
        assert_eq!(part.turn_restriction.end, vec![FeatureId::from("abc")]);
        assert_eq!(part.properties["type"], json!("road"));
        assert_eq!(part.properties["name"], json!("Ringstrasse"));
        assert_eq!(part.properties["direction"], json!("FORWARD"));
        assert_eq!(part.properties["pedestrianOnly"], json!(true));
    }
    assert!(session.map().link(&"parent".into()).is_none());
    assert_eq!(session.info().length, 1);
}

// ─── Adressen beim Löschen von Links ────────────────────────────────────────

fn address_on(link: &str) -> Place {
    let mut address = Place::new("addr", PlaceKind::Address, DVec2::new(50.0, 10.0));
    address.routing = RoutingPoint::attached(link.into(), DVec2::new(50.0, 0.0));
    address
}

#[test]
fn test_geloeschter_link_entfernt_routing_der_adresse_nach_submit() {
    let features = vec![
        Feature::Link(Link::new(
            "1",
            vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0)],
        )),
        Feature::Link(Link::new(
            "2",
            vec![DVec2::new(0.0, 500.0), DVec2::new(100.0, 500.0)],
        )),
        Feature::Place(address_on("1")),
    ];
    let mut session = EditSession::with_features(EditorOptions::default(), features.clone()).unwrap();
    let mut provider = LocalProvider::with_features("local", features).unwrap();

    assert!(remove_feature(&mut session, &"1".into()).unwrap());
    submit(&mut session, &mut provider)
        .unwrap()
        .expect("Änderungen müssen übertragen werden");

    let Some(Feature::Place(address)) = provider.exists(&"addr".into()) else {
        panic!("Adresse muss beim Provider liegen");
    };
    assert_eq!(address.routing, RoutingPoint::default());
    assert!(provider.exists(&"1".into()).is_none());
}

#[test]
fn test_geloeschter_link_haengt_adresse_an_nahen_link_um() {
    let features = vec![
        Feature::Link(Link::new(
            "1",
            vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0)],
        )),
        Feature::Link(Link::new(
            "2",
            vec![DVec2::new(0.0, 40.0), DVec2::new(100.0, 40.0)],
        )),
        Feature::Place(address_on("1")),
    ];
    let mut session = EditSession::with_features(EditorOptions::default(), features).unwrap();

    remove_feature(&mut session, &"1".into()).unwrap();

    let address = session.map().place(&"addr".into()).unwrap();
    assert_eq!(
        address.routing,
        RoutingPoint::attached("2".into(), DVec2::new(50.0, 40.0))
    );
}

// ─── Undo/Redo ──────────────────────────────────────────────────────────────

#[test]
fn test_redo_wird_an_der_stack_laenge_geklemmt() {
    let mut session = EditSession::with_features(
        EditorOptions::default(),
        [Feature::Link(Link::new(
            "l",
            vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)],
        ))],
    )
    .unwrap();
    for revision in 0..5 {
        set_attribute(&mut session, &"l".into(), "revision", Some(json!(revision))).unwrap();
    }
    assert_eq!(session.info().length, 5);

    undo(&mut session, 2).unwrap();
    assert_eq!(session.info().current, 3);
    redo(&mut session, 3).unwrap();

    assert_eq!(
        session.info(),
        HistoryInfo {
            current: 5,
            length: 5,
            changes: 1
        }
    );
    assert_eq!(
        session.map().link(&"l".into()).unwrap().properties["revision"],
        json!(4)
    );
}

#[test]
fn test_undo_redo_ueber_split_und_loeschen_stellt_netz_wieder_her() {
    let mut l = Link::new(
        "l",
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(100.0, 0.0),
            DVec2::new(200.0, 0.0),
        ],
    )
    .with_property("name", "Hafenweg");
    l.turn_restriction.end = vec!["m".into()];
    let m = Link::new("m", vec![DVec2::new(200.0, 0.0), DVec2::new(200.0, 100.0)]);
    let mut session = EditSession::with_features(
        EditorOptions::default(),
        [
            Feature::Link(l),
            Feature::Link(m),
            Feature::Place(address_on("l")),
        ],
    )
    .unwrap();
    let before = session.map().features();

    let (first, second) = split_link(&mut session, &ShapePoint::new("l", 1))
        .unwrap()
        .expect("Split muss gelingen");
    assert!(remove_feature(&mut session, &"m".into()).unwrap());
    let after = session.map().features();

    for id in [&first, &second] {
        let part = session.map().link(id).unwrap();
        assert!(!part.turn_restriction.references(&"m".into()));
    }
    let routed_to = session
        .map()
        .place(&"addr".into())
        .unwrap()
        .routing
        .routing_link
        .clone();
    assert!(routed_to == Some(first.clone()) || routed_to == Some(second.clone()));

    undo(&mut session, 2).unwrap();
    assert_eq!(session.map().features(), before);
    let address = session.map().place(&"addr".into()).unwrap();
    assert_eq!(address.routing.routing_link, Some(FeatureId::from("l")));
    assert_eq!(
        session.map().link(&"l".into()).unwrap().turn_restriction.end,
        vec![FeatureId::from("m")]
    );
    assert_eq!(session.info().changes, 0);

    redo(&mut session, 2).unwrap();
    assert_eq!(session.map().features(), after);
    assert_eq!(session.info().current, 2);
}
