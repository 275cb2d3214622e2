use rusqlite::Connection;
use uuid::Uuid;
use wolfhop_core::db::open_db_in_memory;
use wolfhop_core::repo::herd_repo::SqliteHerdRepository;
use wolfhop_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use wolfhop_core::service::herd_service::{HerdPatch, HerdService};
use wolfhop_core::{Entity, ServiceError, User};

type Herds<'conn> = HerdService<SqliteUserRepository<'conn>, SqliteHerdRepository<'conn>>;

fn herd_service(conn: &Connection) -> Herds<'_> {
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

fn emails(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn create_includes_owner_and_resolved_members() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");

    let herd = service
        .create(a.id, " Team ", &emails(&["B@X.com", "b@x.com"]))
        .unwrap();
    assert_eq!(herd.name, "Team");
    assert_eq!(herd.owner_id, a.id);
    assert_eq!(herd.member_ids, vec![b.id, a.id]);

    let fetched = service.get(herd.id, b.id).unwrap();
    assert_eq!(fetched, herd);
}

#[test]
fn create_rejects_blank_name_and_unknown_email() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");

    assert!(matches!(
        service.create(a.id, "   ", &[]),
        Err(ServiceError::InvalidInput(_))
    ));
    match service.create(a.id, "Team", &emails(&["ghost@x.com"])) {
        Err(ServiceError::MemberNotFound(email)) => assert_eq!(email, "ghost@x.com"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(service.list(a.id).unwrap().is_empty());
}

#[test]
fn list_joins_member_records() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let c = insert_user(&conn, "C", "c@x.com");

    service.create(a.id, "One", &emails(&["b@x.com"])).unwrap();
    service.create(c.id, "Two", &[]).unwrap();

    let listed = service.list(b.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].herd.name, "One");
    assert_eq!(listed[0].members, vec![b.clone(), a.clone()]);
    assert_eq!(service.list(c.id).unwrap().len(), 1);
}

#[test]
fn get_requires_membership() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let outsider = insert_user(&conn, "O", "o@x.com");
    let herd = service.create(a.id, "Team", &[]).unwrap();

    assert!(matches!(
        service.get(herd.id, outsider.id),
        Err(ServiceError::Forbidden(_))
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.get(missing, a.id),
        Err(ServiceError::NotFound(Entity::Herd, id)) if id == missing
    ));
}

#[test]
fn update_is_owner_only_and_does_not_re_add_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let c = insert_user(&conn, "C", "c@x.com");
    let herd = service.create(a.id, "Team", &emails(&["b@x.com"])).unwrap();

    assert!(matches!(
        service.update(herd.id, b.id, HerdPatch::default()),
        Err(ServiceError::Forbidden(_))
    ));

    let renamed = service
        .update(
            herd.id,
            a.id,
            HerdPatch {
                name: Some("Crew".to_string()),
                member_emails: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Crew");
    assert_eq!(renamed.member_ids, vec![b.id, a.id]);

    let blank_name = service
        .update(
            herd.id,
            a.id,
            HerdPatch {
                name: Some("  ".to_string()),
                member_emails: None,
            },
        )
        .unwrap();
    assert_eq!(blank_name.name, "Crew");

    let replaced = service
        .update(
            herd.id,
            a.id,
            HerdPatch {
                name: None,
                member_emails: Some(emails(&["c@x.com"])),
            },
        )
        .unwrap();
    assert_eq!(replaced.member_ids, vec![c.id]);
    assert_eq!(replaced.owner_id, a.id);

    // Owner dropped out of membership but keeps owner rights.
    assert!(matches!(
        service.get(herd.id, a.id),
        Err(ServiceError::Forbidden(_))
    ));
    let cleared = service
        .update(
            herd.id,
            a.id,
            HerdPatch {
                name: None,
                member_emails: Some(Vec::new()),
            },
        )
        .unwrap();
    assert!(cleared.member_ids.is_empty());

    assert!(matches!(
        service.update(
            herd.id,
            a.id,
            HerdPatch {
                name: Some("Lost".to_string()),
                member_emails: Some(emails(&["ghost@x.com"])),
            },
        ),
        Err(ServiceError::MemberNotFound(_))
    ));
}

#[test]
fn delete_is_owner_only() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let herd = service.create(a.id, "Team", &emails(&["b@x.com"])).unwrap();

    assert!(matches!(
        service.delete(herd.id, b.id),
        Err(ServiceError::Forbidden(_))
    ));
    service.delete(herd.id, a.id).unwrap();
    assert!(matches!(
        service.get(herd.id, a.id),
        Err(ServiceError::NotFound(Entity::Herd, _))
    ));
    assert!(matches!(
        service.delete(herd.id, a.id),
        Err(ServiceError::NotFound(Entity::Herd, _))
    ));
}

#[test]
fn leave_removes_member_but_never_the_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = herd_service(&conn);
    let a = insert_user(&conn, "A", "a@x.com");
    let b = insert_user(&conn, "B", "b@x.com");
    let outsider = insert_user(&conn, "O", "o@x.com");
    let herd = service.create(a.id, "Team", &emails(&["b@x.com"])).unwrap();

    assert!(matches!(
        service.leave(herd.id, a.id),
        Err(ServiceError::OwnerCannotLeave)
    ));
    assert!(matches!(
        service.leave(herd.id, outsider.id),
        Err(ServiceError::Forbidden(_))
    ));

    service.leave(herd.id, b.id).unwrap();
    assert_eq!(service.get(herd.id, a.id).unwrap().member_ids, vec![a.id]);
    assert!(service.list(b.id).unwrap().is_empty());
    assert!(matches!(
        service.leave(Uuid::new_v4(), b.id),
        Err(ServiceError::NotFound(Entity::Herd, _))
    ));
}
