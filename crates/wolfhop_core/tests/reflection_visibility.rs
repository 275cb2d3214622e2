use rusqlite::Connection;
use uuid::Uuid;
use wolfhop_core::db::open_db_in_memory;
use wolfhop_core::model::notification::NOTIFICATION_REFLECTION_SHARED;
use wolfhop_core::repo::herd_repo::SqliteHerdRepository;
use wolfhop_core::repo::notification_repo::{
    NotificationRepository, SqliteNotificationRepository,
};
use wolfhop_core::repo::reflection_repo::SqliteReflectionRepository;
use wolfhop_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use wolfhop_core::service::herd_service::HerdService;
use wolfhop_core::service::notifier::StoreNotificationEmitter;
use wolfhop_core::service::reaction_service::ReactionService;
use wolfhop_core::service::reflection_service::ReflectionService;
use wolfhop_core::{
    Entity, ReflectionDraft, ReflectionId, ServiceError, ShareTarget, User, UserId,
};

type Reflections<'conn> = ReflectionService<
    SqliteUserRepository<'conn>,
    SqliteHerdRepository<'conn>,
    SqliteReflectionRepository<'conn>,
    StoreNotificationEmitter<SqliteNotificationRepository<'conn>>,
>;

fn reflection_service(conn: &Connection) -> Reflections<'_> {
    ReflectionService::new(
        SqliteUserRepository::try_new(conn).unwrap(),
        SqliteHerdRepository::try_new(conn).unwrap(),
        SqliteReflectionRepository::try_new(conn).unwrap(),
        StoreNotificationEmitter::new(SqliteNotificationRepository::try_new(conn).unwrap()),
    )
}

fn herd_service(
    conn: &Connection,
) -> HerdService<SqliteUserRepository<'_>, SqliteHerdRepository<'_>> {
    HerdService::new(
        SqliteUserRepository::try_new(conn).unwrap(),
        SqliteHerdRepository::try_new(conn).unwrap(),
    )
}

fn insert_user(conn: &Connection, name: &str, email: &str) -> User {
    let user = User::new(name, email, "$argon2id$test-only");
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&user)
        .unwrap();
    user
}

fn draft(share: ShareTarget, high: &str) -> ReflectionDraft {
    ReflectionDraft {
        high_text: high.to_string(),
        low_text: "a long meeting".to_string(),
        buffalo_text: "saw a heron".to_string(),
        share,
    }
}

fn visible_ids(service: &Reflections<'_>, user_id: UserId) -> Vec<ReflectionId> {
    service
        .list_visible(user_id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.reflection.id)
        .collect()
}

#[test]
fn herd_share_is_visible_to_members_and_notifies_them() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let notifications = SqliteNotificationRepository::try_new(&conn).unwrap();
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let b = insert_user(&conn, "Bravo", "b@x.com");
    let outsider = insert_user(&conn, "Oscar", "o@x.com");

    let herd = herd_service(&conn)
        .create(a.id, "Team", &["b@x.com".to_string()])
        .unwrap();
    assert_eq!(herd.member_ids, vec![b.id, a.id]);

    let reflection = reflections
        .create(b.id, draft(ShareTarget::Herd(herd.id), "shipped"))
        .unwrap();
    assert_eq!(reflection.author_id, b.id);

    assert_eq!(visible_ids(&reflections, a.id), vec![reflection.id]);
    assert_eq!(visible_ids(&reflections, b.id), vec![reflection.id]);
    assert!(visible_ids(&reflections, outsider.id).is_empty());

    let inbox = notifications.list_notifications_for_recipient(a.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NOTIFICATION_REFLECTION_SHARED);
    assert_eq!(inbox[0].sender_id, b.id);
    assert_eq!(
        inbox[0].message,
        "Bravo shared a reflection with your herd: Team"
    );
    assert!(notifications
        .list_notifications_for_recipient(b.id)
        .unwrap()
        .is_empty());

    assert_eq!(
        reflections.get_one(reflection.id, a.id).unwrap().reflection,
        reflection
    );
    assert!(matches!(
        reflections.get_one(reflection.id, outsider.id),
        Err(ServiceError::Forbidden(_))
    ));
}

#[test]
fn friend_share_is_listed_for_target_but_not_readable_individually() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let notifications = SqliteNotificationRepository::try_new(&conn).unwrap();
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let c = insert_user(&conn, "Charlie", "c@x.com");
    let d = insert_user(&conn, "Delta", "d@x.com");

    let reflection = reflections
        .create(a.id, draft(ShareTarget::Friend(c.id), "hello"))
        .unwrap();

    assert_eq!(visible_ids(&reflections, c.id), vec![reflection.id]);
    assert!(visible_ids(&reflections, d.id).is_empty());

    assert!(matches!(
        reflections.get_one(reflection.id, c.id),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(reflections.get_one(reflection.id, a.id).is_ok());

    let inbox = notifications.list_notifications_for_recipient(c.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message, "Alpha shared a reflection with you");
}

#[test]
fn self_share_stays_private() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let b = insert_user(&conn, "Bravo", "b@x.com");

    let reflection = reflections
        .create(a.id, draft(ShareTarget::SelfOnly, "quiet day"))
        .unwrap();

    assert_eq!(visible_ids(&reflections, a.id), vec![reflection.id]);
    assert!(visible_ids(&reflections, b.id).is_empty());
    assert!(matches!(
        reflections.get_one(reflection.id, b.id),
        Err(ServiceError::Forbidden(_))
    ));

    let missing = Uuid::new_v4();
    assert!(matches!(
        reflections.get_one(missing, a.id),
        Err(ServiceError::NotFound(Entity::Reflection, id)) if id == missing
    ));
}

#[test]
fn list_orders_authored_then_herd_then_friend_without_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let b = insert_user(&conn, "Bravo", "b@x.com");

    let herd = herd_service(&conn)
        .create(b.id, "Team", &["a@x.com".to_string()])
        .unwrap();

    let friend_to_a = reflections
        .create(b.id, draft(ShareTarget::Friend(a.id), "to a"))
        .unwrap();
    let herd_from_b = reflections
        .create(b.id, draft(ShareTarget::Herd(herd.id), "team b"))
        .unwrap();
    let herd_from_a = reflections
        .create(a.id, draft(ShareTarget::Herd(herd.id), "team a"))
        .unwrap();
    let own = reflections
        .create(a.id, draft(ShareTarget::SelfOnly, "mine"))
        .unwrap();

    assert_eq!(
        visible_ids(&reflections, a.id),
        vec![herd_from_a.id, own.id, herd_from_b.id, friend_to_a.id]
    );
}

#[test]
fn missing_herd_or_recipient_does_not_fail_creation() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let notifications = SqliteNotificationRepository::try_new(&conn).unwrap();
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let b = insert_user(&conn, "Bravo", "b@x.com");

    let herd = herd_service(&conn)
        .create(a.id, "Gone", &["b@x.com".to_string()])
        .unwrap();
    herd_service(&conn).delete(herd.id, a.id).unwrap();

    let orphan = reflections
        .create(a.id, draft(ShareTarget::Herd(herd.id), "nobody"))
        .unwrap();
    assert!(notifications
        .list_notifications_for_recipient(b.id)
        .unwrap()
        .is_empty());
    assert_eq!(visible_ids(&reflections, a.id), vec![orphan.id]);
    assert!(visible_ids(&reflections, b.id).is_empty());
    assert!(matches!(
        reflections.get_one(orphan.id, b.id),
        Err(ServiceError::Forbidden(_))
    ));

    let unknown_friend = reflections
        .create(a.id, draft(ShareTarget::Friend(Uuid::new_v4()), "lost"))
        .unwrap();
    assert!(reflections.get_one(unknown_friend.id, a.id).is_ok());
}

#[test]
fn reactions_are_resolved_in_recorded_order() {
    let conn = open_db_in_memory().unwrap();
    let reflections = reflection_service(&conn);
    let reactions = ReactionService::new(SqliteReflectionRepository::try_new(&conn).unwrap());
    let a = insert_user(&conn, "Alpha", "a@x.com");
    let b = insert_user(&conn, "Bravo", "b@x.com");
    let c = insert_user(&conn, "Charlie", "c@x.com");

    let first = reflections
        .create(a.id, draft(ShareTarget::SelfOnly, "one"))
        .unwrap();
    let second = reflections
        .create(a.id, draft(ShareTarget::SelfOnly, "two"))
        .unwrap();

    let by_c = reactions.react(first.id, c.id, Some("hug")).unwrap();
    let by_b = reactions.react(first.id, b.id, None).unwrap();
    let on_second = reactions.react(second.id, b.id, None).unwrap();

    let listed = reflections.list_visible(a.id).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].reactions, vec![by_c.clone(), by_b.clone()]);
    assert_eq!(listed[0].reflection.reaction_ids, vec![by_c.id, by_b.id]);
    assert_eq!(listed[1].reactions, vec![on_second]);

    let single = reflections.get_one(first.id, a.id).unwrap();
    assert_eq!(single.reactions, vec![by_c, by_b]);
}
