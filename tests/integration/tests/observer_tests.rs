//! Observer integration tests
//!
//! Drives write sessions through the engine and asserts the change events
//! observers deliver, including the query-scoped list case.

use std::time::Duration;

use anyhow::Result;
use tokio::time::timeout;

use integration_tests::{channel_payload, unique_cid};
use mirror_core::ChannelRecord;
use mirror_db::{ChannelField, ChannelListQuery, Filter, StorageEngine};
use mirror_observe::{
    EntityEvent, EntityObserver, EntityObserving, ListEvent, ListObserver, ListObserving,
    TypingState,
};

async fn next_changes(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<ListEvent<ChannelRecord>>,
) -> mirror_observe::ListDiff<ChannelRecord> {
    match timeout(Duration::from_secs(2), rx.recv()).await {
        Ok(Some(ListEvent::Changes(diff))) => diff,
        other => panic!("expected a Changes event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_query_observer_sees_only_associated_channels() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let query = ChannelListQuery::new(Filter::equal(ChannelField::Kind, "messaging"));

    let observer = ListObserver::for_query(engine.clone(), &query);
    let mut rx = observer.start_observing()?;

    let linked = unique_cid("messaging");
    let mut session = engine.begin();
    session.save_channel(&channel_payload(linked.clone()), Some(&query))?;
    session.save_channel(&channel_payload(unique_cid("messaging")), None)?;
    session.commit()?;

    let diff = next_changes(&mut rx).await;
    assert_eq!(diff.inserted.len(), 1);
    assert_eq!(diff.inserted[0].item.cid, linked);
    Ok(())
}

#[tokio::test]
async fn test_one_commit_one_event() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let observer = ListObserver::new(
        engine.clone(),
        mirror_db::FetchSpec::all(vec![mirror_db::Sorting::ascending(
            mirror_db::ChannelSortKey::Cid,
        )]),
    );
    let mut rx = observer.start_observing()?;

    // Three channels in one session: a single transition
    let mut session = engine.begin();
    for _ in 0..3 {
        session.save_channel(&channel_payload(unique_cid("messaging")), None)?;
    }
    session.commit()?;

    let diff = next_changes(&mut rx).await;
    assert_eq!(diff.inserted.len(), 3);

    let silence = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(silence.is_err(), "expected exactly one event");
    Ok(())
}

#[tokio::test]
async fn test_entity_observer_across_sessions() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let cid = unique_cid("messaging");
    let observer = EntityObserver::channel(engine.clone(), cid.clone());
    let mut rx = observer.start_observing()?;

    let mut session = engine.begin();
    session.save_channel(&channel_payload(cid.clone()), None)?;
    session.commit()?;

    let event = timeout(Duration::from_secs(2), rx.recv()).await?.unwrap();
    assert!(matches!(event, EntityEvent::Created(_)));

    let mut session = engine.begin();
    session.delete_channel(&cid)?;
    session.commit()?;

    let event = timeout(Duration::from_secs(2), rx.recv()).await?.unwrap();
    match event {
        EntityEvent::Removed(record) => assert_eq!(record.cid, cid),
        other => panic!("expected Removed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_stopped_observer_stays_silent() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let observer = ListObserver::new(
        engine.clone(),
        mirror_db::FetchSpec::all(vec![mirror_db::Sorting::ascending(
            mirror_db::ChannelSortKey::Cid,
        )]),
    );
    let mut rx = observer.start_observing()?;
    observer.stop_observing();

    let mut session = engine.begin();
    session.save_channel(&channel_payload(unique_cid("messaging")), None)?;
    session.commit()?;

    let got = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(matches!(got, Ok(None) | Err(_)), "got {got:?}");
    Ok(())
}

#[tokio::test]
async fn test_typing_state_is_not_transactional() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let typing = TypingState::new();
    let cid = unique_cid("messaging");
    let mut feed = engine.subscribe();

    typing.typing_started(&cid, &mirror_core::UserId::from("luke"));
    assert_eq!(typing.typing_users(&cid).len(), 1);

    // No commit was published for the typing signal
    assert!(feed.try_recv().is_err());
    assert_eq!(engine.channel_count(), 0);
    Ok(())
}
