mod common;

use anatlas::error::ViewerError;
use anatlas::store::GroupVisibility;
use common::{viewer, viewer_with, MockLoader};
use itertools::Itertools;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn loads_group_and_tracks_every_root() -> Result<(), anyhow::Error> {
    let (viewer, loader) = viewer();

    let summary = viewer.load_group("bones", None, false).await;
    assert_eq!(summary.requested, 4);
    assert_eq!(summary.loaded.len(), 3);
    // the entry without a model block fails, it does not abort siblings
    assert_eq!(summary.failed.len(), 1);
    assert!(matches!(
        summary.failed[0].1,
        ViewerError::MetadataMalformed { .. }
    ));

    let roots = viewer.store().roots("bones");
    assert_eq!(roots.len(), 3);
    let ids: Vec<&str> = roots.iter().map(|r| r.entity_id()).collect();
    assert_eq!(ids.iter().unique().count(), 3);

    // attached, pickable and recorded visible
    assert_eq!(viewer.scene().attached_count(), 3);
    assert_eq!(viewer.picks().pickable_count(), 6);
    assert_ne!(viewer.store().visibility("bones"), GroupVisibility::All(false));
    assert_eq!(loader.call_count(), 3);
    viewer.visibility().check_invariants()?;
    Ok(())
}

#[tokio::test]
async fn partial_failure_keeps_the_survivors() -> Result<(), anyhow::Error> {
    let loader = Arc::new(MockLoader::new());
    loader.fail_url("models/bones/tibia_draco.glb");
    let viewer = viewer_with(loader);

    let summary = viewer.load_group("bones", None, false).await;
    assert_eq!(summary.loaded.len(), 2);
    let not_found = summary
        .failed
        .iter()
        .filter(|(_, e)| matches!(e, ViewerError::AssetNotFound { .. }))
        .count();
    assert_eq!(not_found, 1);

    assert_eq!(viewer.store().root_count("bones"), 2);
    assert_ne!(viewer.store().visibility("bones"), GroupVisibility::All(false));
    viewer.visibility().check_invariants()?;
    Ok(())
}

#[tokio::test]
async fn sequential_reload_is_idempotent() -> Result<(), anyhow::Error> {
    let (viewer, loader) = viewer();

    viewer.load_group("bones", None, false).await;
    let second = viewer.load_group("bones", None, false).await;

    assert_eq!(second.loaded.len(), 0);
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(viewer.store().root_count("bones"), 3);
    // no re-fetch for entries that are already present
    assert_eq!(loader.call_count(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn concurrent_loads_never_duplicate_an_entity() -> Result<(), anyhow::Error> {
    let loader = Arc::new(MockLoader::new());
    loader.delay_every_load(Duration::from_millis(50));
    let viewer = viewer_with(loader.clone());

    let (a, b) = tokio::join!(
        viewer.load_group("bones", None, false),
        viewer.load_group("bones", None, false)
    );

    assert_eq!(viewer.store().root_count("bones"), 3);
    assert_eq!(a.loaded.len() + a.skipped.len(), 3);
    assert_eq!(b.loaded.len() + b.skipped.len(), 3);
    // the in-flight guard makes the raced call wait and skip, not re-fetch
    assert_eq!(loader.call_count(), 3);
    viewer.visibility().check_invariants()?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_raced_calls_serialized() -> Result<(), anyhow::Error> {
    let loader = Arc::new(MockLoader::new());
    loader.delay_every_load(Duration::from_millis(50));
    loader.fail_once_url("models/bones/humerus_draco.glb");
    let viewer = viewer_with(loader.clone());

    // three racing calls: the first humerus fetch fails mid-flight while the
    // other two wait on the same guard; exactly one of them may retry
    let (a, b, c) = tokio::join!(
        viewer.load_group("bones", Some("arm"), false),
        viewer.load_group("bones", Some("arm"), false),
        viewer.load_group("bones", Some("arm"), false)
    );

    let humeri = viewer
        .store()
        .roots("bones")
        .iter()
        .filter(|r| r.filename() == "humerus_draco.glb")
        .count();
    assert_eq!(humeri, 1);
    assert_eq!(viewer.store().root_count("bones"), 2);

    let not_found = [&a, &b, &c]
        .iter()
        .flat_map(|s| &s.failed)
        .filter(|(_, e)| matches!(e, ViewerError::AssetNotFound { .. }))
        .count();
    assert_eq!(not_found, 1);
    // humerus twice (failure plus one retry), radius once
    assert_eq!(loader.call_count(), 3);
    viewer.visibility().check_invariants()?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out_that_entry_only() -> Result<(), anyhow::Error> {
    let loader = Arc::new(MockLoader::new());
    loader.delay_every_load(Duration::from_secs(11));
    let viewer = viewer_with(loader);

    let summary = viewer.load_group("muscles", None, false).await;
    assert_eq!(summary.loaded.len(), 0);
    assert!(summary
        .failed
        .iter()
        .all(|(_, e)| matches!(e, ViewerError::AssetTimeout { .. })));
    assert_eq!(viewer.store().root_count("muscles"), 0);
    Ok(())
}

#[tokio::test]
async fn subgroup_filter_loads_only_matching_entries() -> Result<(), anyhow::Error> {
    let (viewer, _) = viewer();

    let summary = viewer.load_group("muscles", Some("arm"), false).await;
    assert_eq!(summary.requested, 1);
    assert_eq!(summary.loaded, vec!["fma37370".to_string()]);
    assert_eq!(viewer.store().root_count("muscles"), 1);

    // widening to the whole group only adds what is missing
    let rest = viewer.load_group("muscles", None, false).await;
    assert_eq!(rest.loaded, vec!["fma22428".to_string()]);
    assert_eq!(rest.skipped.len(), 1);
    Ok(())
}

#[tokio::test]
async fn entries_hidden_by_default_stay_out_of_the_pick_pool() -> Result<(), anyhow::Error> {
    let (viewer, _) = viewer();

    viewer.load_group("muscles", None, false).await;
    let soleus = viewer
        .store()
        .find_root("muscles", "soleus_draco.glb")
        .expect("soleus loaded");
    assert!(!soleus.node.is_visible());
    for id in common::mesh_ids(&soleus) {
        assert!(!viewer.picks().is_pickable(id));
    }
    viewer.visibility().check_invariants()?;
    Ok(())
}

#[tokio::test]
async fn unload_group_tears_everything_down() -> Result<(), anyhow::Error> {
    let (viewer, _) = viewer();

    viewer.load_group("bones", None, false).await;
    let tibia = viewer
        .store()
        .find_root("bones", "tibia_draco.glb")
        .expect("tibia loaded");

    let removed = viewer.unload_group("bones", None);
    assert_eq!(removed, 3);
    assert_eq!(viewer.store().root_count("bones"), 0);
    assert_eq!(viewer.scene().attached_count(), 0);
    assert_eq!(viewer.picks().pickable_count(), 0);
    tibia
        .node
        .for_each_mesh(&mut |_, surface| assert!(surface.is_disposed()));
    // the group state is cleared, not deleted
    assert!(viewer.store().group_names().contains(&"bones".to_string()));
    Ok(())
}

#[tokio::test]
async fn unload_by_subgroup_and_filename() -> Result<(), anyhow::Error> {
    let (viewer, _) = viewer();

    viewer.load_group("bones", None, false).await;
    assert_eq!(viewer.unload_group("bones", Some("leg")), 1);
    assert_eq!(viewer.store().root_count("bones"), 2);

    assert!(viewer.unload_model("bones", "radius_draco.glb"));
    assert!(!viewer.unload_model("bones", "radius_draco.glb"));
    assert_eq!(viewer.store().root_count("bones"), 1);
    assert_eq!(viewer.picks().pickable_count(), 2);
    Ok(())
}

#[tokio::test]
async fn reload_after_unload_fetches_again() -> Result<(), anyhow::Error> {
    let (viewer, loader) = viewer();

    viewer.load_group("bones", None, false).await;
    viewer.unload_group("bones", None);
    let again = viewer.load_group("bones", None, false).await;

    assert_eq!(again.loaded.len(), 3);
    assert_eq!(viewer.store().root_count("bones"), 3);
    assert_eq!(loader.call_count(), 6);
    Ok(())
}
