//! Codex relationship graph through the public API

mod common;

use common::fixture;
use manuscript::{
    AttributeValue, Attributes, Direction, EntityPatch, EntityType, ErrorKind, NewEntity,
    NewRelationship, RelationshipPatch,
};
use std::collections::HashSet;

#[test]
fn parent_of_with_inverse_creates_two_independent_edges() {
    let f = fixture();
    let mother = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, "Ilse"))
        .unwrap();
    let son = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, "Tomas"))
        .unwrap();

    let created = f
        .api
        .create_relationship(
            &f.owner,
            f.project_id(),
            NewRelationship::new(mother.id.clone(), son.id.clone(), "parentOf").with_inverse(None),
        )
        .unwrap();
    let inverse = created.inverse.clone().unwrap();

    let listing = f.api.list_relationships(&f.owner, f.project_id()).unwrap();
    let edges: HashSet<_> = listing
        .items
        .iter()
        .map(|v| {
            (
                v.relationship.source_id.clone(),
                v.relationship.target_id.clone(),
                v.relationship.relationship_type.clone(),
            )
        })
        .collect();
    assert_eq!(edges.len(), 2);
    assert!(edges.contains(&(mother.id.clone(), son.id.clone(), "parentOf".to_string())));
    assert!(edges.contains(&(son.id.clone(), mother.id.clone(), "parentOf".to_string())));

    // Edits to one edge do not reach the other
    f.api
        .update_relationship(
            &f.owner,
            &created.relationship.relationship.id,
            RelationshipPatch {
                strength: Some(10),
                ..Default::default()
            },
        )
        .unwrap();
    let untouched = f.api.get_relationship(&f.owner, &inverse.relationship.id).unwrap();
    assert_eq!(untouched.relationship.strength, inverse.relationship.strength);
}

#[test]
fn duplicate_triple_fails_and_persists_nothing() {
    let f = fixture();
    let a = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, "A"))
        .unwrap();
    let b = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Location, "B"))
        .unwrap();
    let request = NewRelationship::new(a.id.clone(), b.id.clone(), "visits");

    f.api.create_relationship(&f.owner, f.project_id(), request.clone()).unwrap();
    let err = f
        .api
        .create_relationship(&f.owner, f.project_id(), request.with_inverse(Some("visitedBy")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(f.api.list_relationships(&f.owner, f.project_id()).unwrap().count, 1);
}

#[test]
fn character_network_excludes_edges_to_other_types() {
    let f = fixture();
    let mk = |t, n: &str| {
        f.api
            .create_entity(&f.owner, f.project_id(), NewEntity::new(t, n))
            .unwrap()
    };
    let captain = mk(EntityType::Character, "Captain");
    let mate = mk(EntityType::Character, "Mate");
    let ship = mk(EntityType::Item, "Ship");
    let storm = mk(EntityType::Event, "Storm");

    for (s, t, label) in [
        (&captain, &mate, "commands"),
        (&captain, &ship, "owns"),
        (&storm, &mate, "injures"),
        (&mate, &captain, "distrusts"),
    ] {
        f.api
            .create_relationship(&f.owner, f.project_id(), NewRelationship::new(s.id.clone(), t.id.clone(), label))
            .unwrap();
    }

    let export = f
        .api
        .network_export(&f.owner, f.project_id(), Some(vec![EntityType::Character]))
        .unwrap();
    let labels: HashSet<&str> = export.edges.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, HashSet::from(["commands", "distrusts"]));
    assert!(export.nodes.iter().all(|n| n.group == EntityType::Character));

    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["edges"][0]["weight"], 5);
    assert!(json["nodes"][0]["group"].is_string());
}

#[test]
fn deleting_entity_leaves_no_edges_behind() {
    let f = fixture();
    let hub = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Location, "Market"))
        .unwrap();
    let mut spokes = Vec::new();
    for name in ["Baker", "Smith", "Guard"] {
        let spoke = f
            .api
            .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, name))
            .unwrap();
        f.api
            .create_relationship(
                &f.owner,
                f.project_id(),
                NewRelationship::new(spoke.id.clone(), hub.id.clone(), "worksAt").with_inverse(Some("employs")),
            )
            .unwrap();
        spokes.push(spoke);
    }

    assert_eq!(f.api.relationships_for_entity(&f.owner, f.project_id(), &hub.id).unwrap().count, 6);
    assert_eq!(f.api.delete_entity(&f.owner, &hub.id).unwrap(), 6);

    assert_eq!(f.api.list_relationships(&f.owner, f.project_id()).unwrap().count, 0);
    for spoke in &spokes {
        assert!(f.api.relationships_for_entity(&f.owner, f.project_id(), &spoke.id).unwrap().is_empty());
    }
    let gone = f.api.relationships_for_entity(&f.owner, f.project_id(), &hub.id).unwrap();
    assert_eq!(gone.count, 0);
    assert!(gone.is_empty());
    assert_eq!(f.api.get_entity(&f.owner, &hub.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn lookup_sees_edges_from_both_sides() {
    let f = fixture();
    let sage = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, "Sage"))
        .unwrap();
    let relic = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Item, "Relic"))
        .unwrap();
    f.api
        .create_relationship(
            &f.owner,
            f.project_id(),
            NewRelationship::new(sage.id.clone(), relic.id.clone(), "guards").with_description("for forty years"),
        )
        .unwrap();

    let from_relic = f.api.relationships_for_entity(&f.owner, f.project_id(), &relic.id).unwrap();
    assert_eq!(from_relic.count, 1);
    assert_eq!(from_relic.items[0].direction, Direction::Incoming);
    assert_eq!(from_relic.items[0].other.name, "Sage");

    let from_sage = f.api.relationships_for_entity(&f.owner, f.project_id(), &sage.id).unwrap();
    assert_eq!(from_sage.items[0].direction, Direction::Outgoing);
    assert_eq!(from_sage.items[0].other.entity_type, Some(EntityType::Item));
}

#[test]
fn entity_attribute_bag_keeps_typed_values() {
    let f = fixture();
    let hero = f
        .api
        .create_entity(
            &f.owner,
            f.project_id(),
            NewEntity::new(EntityType::Character, "Hero").with_description("Reluctant"),
        )
        .unwrap();

    let mut nested = std::collections::BTreeMap::new();
    nested.insert("city".to_string(), AttributeValue::from("Vell"));
    let mut attributes = Attributes::new();
    attributes.insert("age".into(), AttributeValue::from(34_i64));
    attributes.insert("alive".into(), AttributeValue::from(true));
    attributes.insert("origin".into(), AttributeValue::Map(nested));

    f.api
        .update_entity(
            &f.owner,
            &hero.id,
            EntityPatch {
                attributes: Some(attributes.clone()),
                ..Default::default()
            },
        )
        .unwrap();

    let loaded = f.api.get_entity(&f.owner, &hero.id).unwrap();
    assert_eq!(loaded.attributes, attributes);
    assert_eq!(loaded.description.as_deref(), Some("Reluctant"));
}

#[test]
fn entity_created_with_full_payload_reads_back() {
    let f = fixture();
    let created = f
        .api
        .create_entity(
            &f.owner,
            f.project_id(),
            NewEntity::new(EntityType::Item, "Lantern")
                .with_attribute("weight", 2i64)
                .with_attribute("lit", false)
                .with_image("lantern.png")
                .with_image("lantern-lit.png")
                .with_tag("heirloom"),
        )
        .unwrap();

    let loaded = f.api.get_entity(&f.owner, &created.id).unwrap();
    assert_eq!(loaded.attributes["weight"], AttributeValue::Int(2));
    assert_eq!(loaded.attributes["lit"], AttributeValue::Bool(false));
    assert_eq!(loaded.images, vec!["lantern.png".to_string(), "lantern-lit.png".to_string()]);
    assert_eq!(loaded.tags, vec!["heirloom".to_string()]);
}

#[test]
fn lookup_is_scoped_to_the_named_project() {
    let f = fixture();
    let other = f.api.register_project(&f.owner, "Sequel").unwrap();
    let local = f
        .api
        .create_entity(&f.owner, f.project_id(), NewEntity::new(EntityType::Character, "Local"))
        .unwrap();

    assert_eq!(
        f.api.relationships_for_entity(&f.owner, &other.id, &local.id).unwrap_err().kind(),
        ErrorKind::BadRequest
    );
    let stranger = manuscript::UserId::from("stranger");
    assert_eq!(
        f.api.relationships_for_entity(&stranger, f.project_id(), &local.id).unwrap_err().kind(),
        ErrorKind::Forbidden
    );
}
