use sea_orm::{Database, DatabaseConnection};

use engine::{
    Engine, EngineError, IdentityVerifier, MemberId, NewGroupCmd, UpdateGroupCmd, VerifyError,
    notifier::{ADDED_TO_GROUP, GROUP_CREATED, INIT_GROUPS},
};
use migration::MigratorTrait;

/// Treats the credential as the member id.
struct PlainIds;

impl IdentityVerifier for PlainIds {
    fn verify(&self, credential: &str) -> Result<MemberId, VerifyError> {
        credential
            .parse()
            .map_err(|_| VerifyError::Invalid(credential.to_string()))
    }
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn new_members(engine: &Engine, count: usize) -> Vec<MemberId> {
    let mut ids = Vec::new();
    for i in 0..count {
        let member = engine
            .new_member(&format!("member {i}"), None)
            .await
            .unwrap();
        ids.push(member.id);
    }
    ids
}

#[tokio::test]
async fn create_group_validates_members() {
    let (engine, _db) = engine_with_db().await;
    let ids = new_members(&engine, 2).await;

    let err = engine
        .create_group(NewGroupCmd::new("Trip", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidGroup(_)));

    let err = engine
        .create_group(NewGroupCmd::new("Trip", vec![ids[0], 77]))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member 77 not exists".to_string()));

    let group = engine
        .create_group(NewGroupCmd::new(" Trip ", vec![ids[1], ids[0], ids[1]]))
        .await
        .unwrap();
    assert_eq!(group.name, "Trip");
    assert_eq!(group.member_ids(), vec![ids[0], ids[1]]);
    assert_eq!(engine.group(group.id).await.unwrap(), group);
}

#[tokio::test]
async fn connected_members_receive_group_created() {
    let (engine, _db) = engine_with_db().await;
    let ids = new_members(&engine, 4).await;

    let mut second = engine
        .connect_session(&ids[1].to_string(), &PlainIds)
        .await
        .unwrap();
    let mut outsider = engine
        .connect_session(&ids[3].to_string(), &PlainIds)
        .await
        .unwrap();
    assert_eq!(second.try_recv().map(|e| e.event), Some(INIT_GROUPS.to_string()));
    assert!(outsider.try_recv().is_some());

    let group = engine
        .create_group(NewGroupCmd::new("Trip", vec![ids[0], ids[1], ids[2]]))
        .await
        .unwrap();

    let event = second.try_recv().unwrap();
    assert_eq!(event.event, GROUP_CREATED);
    assert_eq!(event.payload["group"]["id"], group.id);
    assert!(outsider.try_recv().is_none());

    // Only connected members sit in the room.
    assert_eq!(engine.notifier().group_room(group.id), vec![ids[1]]);
}

#[tokio::test]
async fn removed_member_stops_receiving_group_broadcasts() {
    let (engine, _db) = engine_with_db().await;
    let ids = new_members(&engine, 3).await;

    let group = engine
        .create_group(NewGroupCmd::new("Trip", ids.clone()))
        .await
        .unwrap();

    let mut kept = engine
        .connect_session(&ids[1].to_string(), &PlainIds)
        .await
        .unwrap();
    let mut removed = engine
        .connect_session(&ids[2].to_string(), &PlainIds)
        .await
        .unwrap();
    let init = removed.try_recv().unwrap();
    assert_eq!(init.event, INIT_GROUPS);
    assert_eq!(init.payload.as_array().map(Vec::len), Some(1));
    kept.try_recv();

    engine
        .notifier()
        .broadcast_to_group(group.id, "PING", &serde_json::json!({}));
    assert!(kept.try_recv().is_some());
    assert!(removed.try_recv().is_some());

    let updated = engine
        .update_group(UpdateGroupCmd::new(group.id, "Trip 2", vec![ids[0], ids[1]]))
        .await
        .unwrap();
    assert_eq!(updated.name, "Trip 2");
    assert_eq!(updated.member_ids(), vec![ids[0], ids[1]]);
    assert_eq!(kept.try_recv().map(|e| e.event), Some(ADDED_TO_GROUP.to_string()));
    assert!(removed.try_recv().is_none());

    engine
        .notifier()
        .broadcast_to_group(group.id, "PING", &serde_json::json!({}));
    assert_eq!(kept.try_recv().map(|e| e.event), Some("PING".to_string()));
    assert!(removed.try_recv().is_none());

    engine.disconnect_session(&mut kept);
    assert!(engine.notifier().group_room(group.id).is_empty());
}

#[tokio::test]
async fn update_group_creates_unregistered_extra_members() {
    let (engine, _db) = engine_with_db().await;
    let owner = engine
        .new_member("Ann", Some("ann@example.com"))
        .await
        .unwrap();
    let group = engine
        .create_group(NewGroupCmd::new("Flat", vec![owner.id]))
        .await
        .unwrap();

    let updated = engine
        .update_group(
            UpdateGroupCmd::new(group.id, "Flat", vec![owner.id])
                .extra_member("Bob", "Bob@Example.com"),
        )
        .await
        .unwrap();
    assert_eq!(updated.members.len(), 2);
    let bob = updated.members.iter().find(|m| m.name == "Bob").unwrap();
    assert!(!bob.registered);
    assert_eq!(bob.email.as_deref(), Some("bob@example.com"));

    // A taken email fails the whole update.
    let err = engine
        .update_group(
            UpdateGroupCmd::new(group.id, "Renamed", vec![owner.id])
                .extra_member("Ann again", "ann@example.com"),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("ann@example.com".to_string()));
    assert_eq!(engine.group(group.id).await.unwrap(), updated);
}

#[tokio::test]
async fn groups_for_member_lists_memberships() {
    let (engine, _db) = engine_with_db().await;
    let ids = new_members(&engine, 2).await;

    let first = engine
        .create_group(NewGroupCmd::new("One", vec![ids[0], ids[1]]))
        .await
        .unwrap();
    let second = engine
        .create_group(NewGroupCmd::new("Two", vec![ids[1]]))
        .await
        .unwrap();

    let groups = engine.groups_for_member(ids[1]).await.unwrap();
    assert_eq!(groups, vec![first.clone(), second]);
    assert_eq!(engine.groups_for_member(ids[0]).await.unwrap(), vec![first]);
    assert!(engine.groups_for_member(999).await.unwrap().is_empty());

    assert!(matches!(
        engine
            .update_group(UpdateGroupCmd::new(999, "Nope", vec![ids[0]]))
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn members_can_be_renamed_and_listed() {
    let (engine, _db) = engine_with_db().await;
    let ann = engine.new_member("Ann", None).await.unwrap();
    assert!(ann.registered);

    let renamed = engine.rename_member(ann.id, "Annie").await.unwrap();
    assert_eq!(renamed.name, "Annie");
    assert_eq!(engine.member(ann.id).await.unwrap(), renamed);
    assert_eq!(engine.list_members().await.unwrap(), vec![renamed]);

    assert!(engine.new_member("   ", None).await.unwrap_err().is_validation());
    assert!(matches!(
        engine.member(999).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}
