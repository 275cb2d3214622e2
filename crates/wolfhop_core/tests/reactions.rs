use rusqlite::Connection;
use uuid::Uuid;
use wolfhop_core::db::open_db_in_memory;
use wolfhop_core::model::reflection::DEFAULT_REACTION_TYPE;
use wolfhop_core::repo::reflection_repo::{ReflectionRepository, SqliteReflectionRepository};
use wolfhop_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use wolfhop_core::service::reaction_service::ReactionService;
use wolfhop_core::{Entity, Reflection, ReflectionDraft, ServiceError, ShareTarget, User};

fn insert_user(conn: &Connection, name: &str, email: &str) -> User {
    let user = User::new(name, email, "$argon2id$test-only");
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&user)
        .unwrap();
    user
}

fn insert_reflection(conn: &Connection, author: &User) -> Reflection {
    let reflection = Reflection::new(
        author.id,
        ReflectionDraft {
            high_text: "high".to_string(),
            low_text: "low".to_string(),
            buffalo_text: "buffalo".to_string(),
            share: ShareTarget::SelfOnly,
        },
    );
    SqliteReflectionRepository::try_new(conn)
        .unwrap()
        .create_reflection(&reflection)
        .unwrap();
    reflection
}

#[test]
fn second_reaction_by_same_user_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = ReactionService::new(SqliteReflectionRepository::try_new(&conn).unwrap());
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let reflection = insert_reflection(&conn, &b);

    let reaction = service.react(reflection.id, a.id, None).unwrap();
    assert_eq!(reaction.reaction_type, DEFAULT_REACTION_TYPE);
    assert_eq!(reaction.user_id, a.id);
    assert_eq!(reaction.reflection_id, reflection.id);

    assert!(matches!(
        service.react(reflection.id, a.id, Some("hug")),
        Err(ServiceError::DuplicateReaction)
    ));

    let stored = SqliteReflectionRepository::try_new(&conn)
        .unwrap()
        .get_reflection(reflection.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.reaction_ids, vec![reaction.id]);
}

#[test]
fn blank_type_defaults_and_custom_type_is_kept() {
    let conn = open_db_in_memory().unwrap();
    let service = ReactionService::new(SqliteReflectionRepository::try_new(&conn).unwrap());
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let reflection = insert_reflection(&conn, &a);

    let blank = service.react(reflection.id, a.id, Some("  ")).unwrap();
    assert_eq!(blank.reaction_type, DEFAULT_REACTION_TYPE);
    let custom = service.react(reflection.id, b.id, Some("hug")).unwrap();
    assert_eq!(custom.reaction_type, "hug");
}

#[test]
fn reacting_to_missing_reflection_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ReactionService::new(SqliteReflectionRepository::try_new(&conn).unwrap());
    let a = insert_user(&conn, "A", "a@x.com");

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.react(missing, a.id, None),
        Err(ServiceError::NotFound(Entity::Reflection, id)) if id == missing
    ));
}
