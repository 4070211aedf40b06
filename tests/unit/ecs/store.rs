use super::*;

#[test]
fn emplace_inserts_then_replaces() {
    let mut store = EntityStore::new();
    let e = store.create();
    assert!(store.emplace(e, TransformComponent::at(1.0, 2.0)));
    assert!(store.emplace(e, TransformComponent::at(3.0, 4.0)));
    let t = store.get::<TransformComponent>(e).unwrap();
    assert_eq!((t.x, t.y), (3.0, 4.0));
    assert!(store.has::<TransformComponent>(e));
    assert!(!store.has::<MaterialComponent>(e));
}

#[test]
fn destroy_is_idempotent_and_releases_components() {
    let mut store = EntityStore::new();
    let e = store.create();
    store.emplace(e, NameComponent("a".to_string()));
    assert!(store.destroy(e));
    assert!(!store.destroy(e));
    assert!(!store.is_alive(e));
    assert!(store.get::<NameComponent>(e).is_none());
    assert!(store.is_empty());
}

#[test]
fn invalid_handles_are_silent_noops() {
    let mut store = EntityStore::new();
    let e = store.create();
    store.destroy(e);

    assert!(!store.emplace(e, TransformComponent::default()));
    assert!(store.get_mut::<TransformComponent>(e).is_none());
    assert!(store.remove::<TransformComponent>(e).is_none());
    assert!(!store.has::<TransformComponent>(e));

    let foreign = Entity::from_bits(u64::MAX);
    assert!(!store.is_alive(foreign));
    assert!(store.get::<NameComponent>(foreign).is_none());
}

#[test]
fn stale_handle_never_aliases_a_reused_slot() {
    let mut store = EntityStore::new();
    let old = store.create();
    store.emplace(old, NameComponent("old".to_string()));
    store.destroy(old);

    let new = store.create();
    store.emplace(new, NameComponent("new".to_string()));
    assert_ne!(old, new);
    assert!(store.get::<NameComponent>(old).is_none());
    assert_eq!(store.get::<NameComponent>(new).unwrap().0, "new");
}

#[test]
fn clear_invalidates_all_previous_handles() {
    let mut store = EntityStore::new();
    let before: Vec<_> = (0..4).map(|_| store.create()).collect();
    store.clear();
    let after: Vec<_> = (0..4).map(|_| store.create()).collect();
    for e in &before {
        assert!(!store.is_alive(*e));
        assert!(!after.contains(e));
    }
    assert_eq!(store.len(), 4);
}

#[test]
fn entities_keep_creation_order_across_reuse() {
    let mut store = EntityStore::new();
    let a = store.create();
    let b = store.create();
    store.destroy(a);
    let c = store.create();
    assert_eq!(store.entities().collect::<Vec<_>>(), vec![b, c]);
}

#[test]
fn each_visits_only_owners() {
    let mut store = EntityStore::new();
    let a = store.create();
    let _b = store.create();
    let c = store.create();
    store.emplace(a, TransformComponent::at(1.0, 0.0));
    store.emplace(c, TransformComponent::at(2.0, 0.0));

    let mut seen = Vec::new();
    store.each::<TransformComponent>(|e, t| seen.push((e, t.x)));
    assert_eq!(seen, vec![(a, 1.0), (c, 2.0)]);

    store.each_mut::<TransformComponent>(|_, t| t.x *= 10.0);
    assert_eq!(store.get::<TransformComponent>(c).unwrap().x, 20.0);
    assert_eq!(store.entities_with::<TransformComponent>(), vec![a, c]);
}

#[test]
fn entity_bits_round_trip() {
    let mut store = EntityStore::new();
    let e = store.create();
    assert_eq!(Entity::from_bits(e.to_bits()), e);
}
