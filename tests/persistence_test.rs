use corpusgraph::persistence::{EntityRow, MentionRow, RelationshipRow};
use corpusgraph::{
    AnalyticsEngine, Dataset, EngineConfig, EntityId, EntityKind, LoadFilter, RecordSource,
    RocksStore, SnapshotStore,
};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn dataset(people: u64) -> Dataset {
    Dataset {
        entities: (1..=people)
            .map(|i| EntityRow::new(i, &format!("Person {}", i), "person"))
            .collect(),
        relationships: (1..people)
            .map(|i| RelationshipRow::new(i, i + 1, "associate").with_evidence(&[i * 10]))
            .collect(),
        mentions: vec![MentionRow::new(1, 7), MentionRow::new(people, 7)],
        activities: vec![],
    }
}

fn engine(store: &Arc<RocksStore>) -> AnalyticsEngine<RocksStore, RocksStore> {
    let mut config = EngineConfig::default();
    config.compute.sample_seed = Some(99);
    AnalyticsEngine::new(store.clone(), store.clone(), config)
}

#[test]
fn test_rocks_batch_replaces_previous_run() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
    store.import_dataset(&dataset(12)).unwrap();
    let engine = engine(&store);

    let first = engine.compute_all(false, 20, 200).unwrap();
    assert_eq!(first.run_id, Some(1));
    // Chain plus the chunk closing it into a ring
    assert_eq!(first.edge_count, 12);

    let second = engine.compute_all(false, 10, 6).unwrap();
    assert_eq!(second.run_id, Some(2));

    let snapshot = store.latest_snapshot().unwrap().unwrap();
    assert_eq!(snapshot.header.run_id, 2);
    assert_eq!(snapshot.rows.len(), 12);
    assert!(snapshot.rows.iter().all(|r| r.computed_at == snapshot.header.computed_at));
}

#[test]
fn test_rocks_dry_run_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let before = {
        let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
        store.import_dataset(&dataset(6)).unwrap();
        let engine = engine(&store);
        engine.compute_all(false, 20, 200).unwrap();

        let before = store.latest_snapshot().unwrap();
        let dry = engine.compute_all(true, 20, 200).unwrap();
        assert_eq!(dry.entity_count, 6);
        assert_eq!(store.latest_snapshot().unwrap(), before);
        store.flush().unwrap();
        before
    };

    let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
    assert_eq!(store.latest_snapshot().unwrap(), before);
    assert_eq!(store.entity_rows().unwrap().len(), 6);
    assert_eq!(
        store.entity_row(EntityId::new(4)).unwrap().unwrap().name.as_deref(),
        Some("Person 4")
    );
}

#[test]
fn test_readers_never_see_mixed_runs() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
    store.import_dataset(&dataset(30)).unwrap();
    let engine = Arc::new(engine(&store));
    engine.compute_all(false, 20, 200).unwrap();

    let writer = {
        let engine = engine.clone();
        thread::spawn(move || {
            for _ in 0..5 {
                engine.compute_all(false, 20, 10).unwrap();
            }
        })
    };

    for _ in 0..50 {
        let snapshot = store.latest_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.rows.len(), 30);
        assert!(snapshot
            .rows
            .iter()
            .all(|r| r.computed_at == snapshot.header.computed_at));
    }

    writer.join().unwrap();
    assert_eq!(store.latest_header().unwrap().unwrap().run_id, 6);
}

#[test]
fn test_concurrent_runs_with_different_node_sets() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
    let mut data = dataset(20);
    for row in data.entities.iter_mut().filter(|r| r.id.unwrap_or(0) % 2 == 0) {
        row.entity_type = Some("organization".to_string());
    }
    store.import_dataset(&data).unwrap();

    let everyone = Arc::new(engine(&store));
    let people = Arc::new(engine(&store).with_filter(LoadFilter {
        entity_kinds: Some([EntityKind::Person].into_iter().collect()),
        min_degree: None,
    }));

    let handles: Vec<_> = [everyone, people]
        .into_iter()
        .map(|engine| {
            thread::spawn(move || {
                (0..4)
                    .map(|_| engine.compute_all(false, 10, 5).unwrap().run_id.unwrap())
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut run_ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    run_ids.sort_unstable();
    assert_eq!(run_ids, (1..=8).collect::<Vec<u64>>());

    let snapshot = store.latest_snapshot().unwrap().unwrap();
    assert_eq!(snapshot.header.run_id, 8);
    assert_eq!(snapshot.rows.len() as u64, snapshot.header.entity_count);
    assert!(snapshot.rows.len() == 20 || snapshot.rows.len() == 10);
}

#[test]
fn test_rocks_path_query() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(temp_dir.path()).unwrap());
    store.import_dataset(&dataset(8)).unwrap();
    let engine = engine(&store);

    // 1 and 8 share a chunk, so the ring shortcut wins
    let outcome = engine.find_path(EntityId::new(2), EntityId::new(8), None).unwrap();
    let path = outcome.path().unwrap();
    let ids: Vec<u64> = path.entities.iter().map(|e| e.id.as_u64()).collect();
    assert_eq!(ids, vec![2, 1, 8]);
    assert!(path.steps[1].relationship_types.is_empty());
    assert_eq!(path.steps[0].evidence[0].as_u64(), 10);
}
