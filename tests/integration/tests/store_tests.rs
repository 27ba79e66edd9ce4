//! Store integration tests
//!
//! Exercises write sessions, fetch specs, queries, and snapshot persistence
//! across the public crate boundaries.

use anyhow::Result;
use chrono::{TimeDelta, Utc};

use integration_tests::{
    channel_payload, member_payload, message_payload, unique_cid, user_payload,
};
use mirror_common::StoreKind;
use mirror_core::{ChannelId, UserId};
use mirror_db::{ChannelField, ChannelListQuery, ChannelSortKey, Filter, Sorting, StorageEngine};

#[test]
fn test_channel_graph_roundtrip() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let cid = unique_cid("messaging");

    let mut payload = channel_payload(cid.clone());
    payload.channel.team = Some("blue".to_string());
    payload.channel.extra = serde_json::json!({"name": "general", "custom": {"rank": 3}});
    payload.members = Some(vec![member_payload("luke"), member_payload("leia")]);

    let mut session = engine.begin();
    session.save_channel(&payload, None)?;
    session.save_message(&message_payload(cid.clone(), "luke"))?;
    session.commit()?;

    let channel = engine.channel(&cid).expect("channel should exist");
    assert_eq!(channel.team.as_deref(), Some("blue"));
    // Opaque attributes survive byte-for-byte
    assert_eq!(
        channel.extra,
        serde_json::json!({"name": "general", "custom": {"rank": 3}})
    );
    assert_eq!(engine.members_of(&cid).len(), 2);
    assert!(engine.user(&UserId::from("creator")).is_some());
    assert!(engine.user(&UserId::from("luke")).is_some());
    assert!(channel.last_message_at.is_some());
    Ok(())
}

#[test]
fn test_malformed_payload_commits_nothing() -> Result<()> {
    let engine = StorageEngine::in_memory();

    let mut payload = channel_payload(ChannelId::new("messaging", ""));
    payload.members = Some(vec![member_payload("luke")]);

    let mut session = engine.begin();
    let err = session.save_channel(&payload, None).unwrap_err();
    assert!(err.is_validation());
    assert!(session.commit().is_err());

    // Not even the embedded valid users landed
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(engine.user_count(), 0);
    Ok(())
}

#[test]
fn test_query_associations_are_isolated() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let watched = ChannelListQuery::new(Filter::equal(ChannelField::Team, "blue"));
    let other = ChannelListQuery::new(Filter::equal(ChannelField::Team, "red"));

    let linked = unique_cid("messaging");
    let unlinked = unique_cid("messaging");

    let mut session = engine.begin();
    session.save_channel(&channel_payload(linked.clone()), Some(&watched))?;
    session.save_channel(&channel_payload(unlinked), None)?;
    session.commit()?;

    let rows = engine.fetch(&watched.fetch_spec())?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cid, linked);

    assert!(engine.fetch(&other.fetch_spec())?.is_empty());
    assert!(engine.query(&watched.filter_hash()).is_some());
    assert!(engine.query(&other.filter_hash()).is_none());
    Ok(())
}

#[test]
fn test_compound_filter_fetch() -> Result<()> {
    let engine = StorageEngine::in_memory();

    let mut frozen_blue = channel_payload(unique_cid("team"));
    frozen_blue.channel.frozen = true;
    frozen_blue.channel.team = Some("blue".to_string());

    let mut thawed_blue = channel_payload(unique_cid("team"));
    thawed_blue.channel.team = Some("blue".to_string());

    let mut frozen_red = channel_payload(unique_cid("team"));
    frozen_red.channel.frozen = true;
    frozen_red.channel.team = Some("red".to_string());

    let mut session = engine.begin();
    session.save_channel(&frozen_blue, None)?;
    session.save_channel(&thawed_blue, None)?;
    session.save_channel(&frozen_red, None)?;
    session.commit()?;

    let filter = Filter::equal(ChannelField::Team, "blue")
        & Filter::equal(ChannelField::Frozen, true);
    let spec = mirror_db::FetchSpec::new(filter, vec![Sorting::ascending(ChannelSortKey::Cid)]);
    let rows = engine.fetch(&spec)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cid, frozen_blue.channel.cid);
    Ok(())
}

#[test]
fn test_on_disk_store_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mirror.json");
    let cid = unique_cid("messaging");

    {
        let engine = StorageEngine::open(StoreKind::OnDisk(path.clone()))?;
        let mut payload = channel_payload(cid.clone());
        payload.members = Some(vec![member_payload("luke")]);
        payload.channel.extra = serde_json::json!({"name": "general"});

        let mut session = engine.begin();
        session.save_channel(&payload, None)?;
        session.save_message(&message_payload(cid.clone(), "luke"))?;
        session.commit()?;
    }

    let reopened = StorageEngine::open(StoreKind::OnDisk(path))?;
    let channel = reopened.channel(&cid).expect("channel should survive reopen");
    assert_eq!(channel.extra, serde_json::json!({"name": "general"}));
    assert_eq!(reopened.members_of(&cid).len(), 1);
    assert!(reopened.user(&UserId::from("luke")).is_some());
    Ok(())
}

#[test]
fn test_partial_upsert_preserves_membership_and_config() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let cid = unique_cid("messaging");
    let now = Utc::now();

    let mut first = channel_payload(cid.clone());
    first.members = Some(vec![member_payload("luke"), member_payload("leia")]);
    first.channel.config.max_message_length = Some(5000);

    let mut session = engine.begin();
    session.save_channel(&first, None)?;
    session.commit()?;

    // A later partial payload: no members, stale config, fresh frozen flag
    let mut second = channel_payload(cid.clone());
    second.channel.frozen = true;
    second.channel.config.created_at = now - TimeDelta::seconds(120);
    second.channel.config.updated_at = now - TimeDelta::seconds(120);

    let mut session = engine.begin();
    session.save_channel(&second, None)?;
    session.commit()?;

    let channel = engine.channel(&cid).expect("channel should exist");
    assert!(channel.frozen);
    assert_eq!(channel.config.max_message_length, Some(5000));
    assert_eq!(engine.members_of(&cid).len(), 2);
    Ok(())
}

#[test]
fn test_save_user_standalone() -> Result<()> {
    let engine = StorageEngine::in_memory();

    let mut payload = user_payload("solo");
    payload.online = true;
    payload.teams = vec!["blue".to_string()];

    let mut session = engine.begin();
    session.save_user(&payload)?;
    session.commit()?;

    let user = engine.user(&UserId::from("solo")).expect("user should exist");
    assert!(user.online);
    assert_eq!(user.teams, vec!["blue".to_string()]);
    Ok(())
}

#[test]
fn test_delete_channel_spares_shared_users() -> Result<()> {
    let engine = StorageEngine::in_memory();
    let doomed = unique_cid("messaging");
    let survivor = unique_cid("messaging");

    let mut session = engine.begin();
    let mut first = channel_payload(doomed.clone());
    first.members = Some(vec![member_payload("luke")]);
    session.save_channel(&first, None)?;

    let mut second = channel_payload(survivor.clone());
    second.members = Some(vec![member_payload("luke")]);
    session.save_channel(&second, None)?;
    session.commit()?;

    let mut session = engine.begin();
    session.delete_channel(&doomed)?;
    session.commit()?;

    assert!(engine.channel(&doomed).is_none());
    assert!(engine.channel(&survivor).is_some());
    assert_eq!(engine.members_of(&survivor).len(), 1);
    assert!(engine.user(&UserId::from("luke")).is_some());
    Ok(())
}
