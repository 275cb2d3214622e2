use serde_json::{json, Value};
use wolfhop_api::{Api, ApiRequest, ApiResponse, Method};
use wolfhop_core::{open_db_in_memory, JwtIdentityProvider};

const SECRET: &str = "test-secret-with-at-least-32-chars!!";

fn api() -> Api {
    let conn = open_db_in_memory().unwrap();
    Api::new(conn, JwtIdentityProvider::new(SECRET, 60).unwrap())
}

fn call(api: &Api, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> ApiResponse {
    let mut request = ApiRequest::new(method, path);
    if let Some(token) = token {
        request = request.with_bearer(token);
    }
    if let Some(body) = body {
        request = request.with_json(&body);
    }
    api.handle(&request)
}

struct Account {
    token: String,
    id: String,
}

fn signup(api: &Api, name: &str, email: &str) -> Account {
    let response = call(
        api,
        Method::Post,
        "/auth/signup",
        None,
        Some(json!({ "displayName": name, "email": email, "password": "pw" })),
    );
    assert_eq!(response.status, 201, "{}", response.body);
    let token = response.body["token"].as_str().unwrap().to_string();
    let me = call(api, Method::Get, "/auth/me", Some(&token), None);
    assert_eq!(me.status, 200);
    Account {
        token,
        id: me.body["id"].as_str().unwrap().to_string(),
    }
}

#[test]
fn public_routes_and_auth_gate() {
    let api = api();

    let root = call(&api, Method::Get, "/", None, None);
    assert_eq!(root.status, 200);
    assert_eq!(root.body["message"], "Hello World");

    let health = call(&api, Method::Get, "/api/v1/healthz", None, None);
    assert_eq!(health.status, 200);
    assert_eq!(health.body["status"], "ok");

    let unknown = call(&api, Method::Get, "/nowhere", None, None);
    assert_eq!(unknown.status, 404);

    let anonymous = call(&api, Method::Get, "/friends", None, None);
    assert_eq!(anonymous.status, 401);
    assert_eq!(anonymous.body["detail"], "Could not validate credentials");

    let forged = call(&api, Method::Get, "/friends", Some("not-a-token"), None);
    assert_eq!(forged.status, 401);
}

#[test]
fn signup_login_and_profile() {
    let api = api();
    let ada = signup(&api, "Ada", "Ada@X.com");

    let duplicate = call(
        &api,
        Method::Post,
        "/auth/signup",
        None,
        Some(json!({ "displayName": "Ada2", "email": "ada@x.com", "password": "pw" })),
    );
    assert_eq!(duplicate.status, 400);
    assert_eq!(duplicate.body["detail"], "Email already registered");

    let wrong = call(
        &api,
        Method::Post,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ada@x.com", "password": "nope" })),
    );
    assert_eq!(wrong.status, 401);

    let missing = call(
        &api,
        Method::Post,
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "pw" })),
    );
    assert_eq!(missing.status, 404);

    let login = call(
        &api,
        Method::Post,
        "/auth/login",
        None,
        Some(json!({ "email": "ADA@x.com", "password": "pw" })),
    );
    assert_eq!(login.status, 200);

    let updated = call(
        &api,
        Method::Put,
        "/users/me",
        Some(&ada.token),
        Some(json!({ "displayName": "Countess" })),
    );
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["displayName"], "Countess");
    assert!(updated.body.get("passwordHash").is_none());
    assert!(updated.body.get("password").is_none());

    let by_email = call(&api, Method::Get, "/users/email/ada%40x.com", Some(&ada.token), None);
    assert_eq!(by_email.status, 200);
    assert_eq!(by_email.body["id"], ada.id.as_str());

    let listed = call(&api, Method::Get, "/users", Some(&ada.token), None);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let malformed = call(&api, Method::Post, "/auth/signup", None, None);
    assert_eq!(malformed.status, 400);
}

#[test]
fn friends_flow_with_notification_toggle() {
    let api = api();
    let a = signup(&api, "A", "a@x.com");
    let b = signup(&api, "B", "b@x.com");
    let c = signup(&api, "C", "c@x.com");

    let added = call(&api, Method::Post, &format!("/friends/add/{}", b.id), Some(&a.token), None);
    assert_eq!(added.status, 200);
    assert_eq!(added.body[0]["id"], b.id.as_str());

    let again = call(&api, Method::Post, &format!("/friends/add/{}", b.id), Some(&a.token), None);
    assert_eq!(again.status, 400);
    assert_eq!(again.body["detail"], "User is already your friend");

    let me = call(&api, Method::Post, &format!("/friends/add/{}", a.id), Some(&a.token), None);
    assert_eq!(me.status, 400);

    let quiet = call(
        &api,
        Method::Post,
        &format!("/friends/add/{}?notification_creation=false", c.id),
        Some(&a.token),
        None,
    );
    assert_eq!(quiet.status, 200);

    let b_inbox = call(&api, Method::Get, "/notifications", Some(&b.token), None);
    assert_eq!(b_inbox.body.as_array().unwrap().len(), 1);
    assert_eq!(b_inbox.body[0]["type"], "friend_request");
    assert_eq!(
        b_inbox.body[0]["message"],
        "You have a new friend request from a@x.com"
    );
    let c_inbox = call(&api, Method::Get, "/notifications", Some(&c.token), None);
    assert!(c_inbox.body.as_array().unwrap().is_empty());

    let removed = call(
        &api,
        Method::Delete,
        &format!("/friends/remove/{}", b.id),
        Some(&a.token),
        None,
    );
    assert_eq!(removed.status, 200);
    assert_eq!(removed.body["friends"].as_array().unwrap().len(), 1);
    let b_friends = call(&api, Method::Get, "/friends", Some(&b.token), None);
    assert_eq!(b_friends.body[0]["id"], a.id.as_str());

    let bad_id = call(&api, Method::Post, "/friends/add/not-a-uuid", Some(&a.token), None);
    assert_eq!(bad_id.status, 400);
}

#[test]
fn herds_reflections_reactions_and_notifications() {
    let api = api();
    let a = signup(&api, "A", "a@x.com");
    let b = signup(&api, "B", "b@x.com");
    let c = signup(&api, "C", "c@x.com");

    let herd = call(
        &api,
        Method::Post,
        "/api/v1/herds",
        Some(&a.token),
        Some(json!({ "name": "Pack", "memberEmails": ["b@x.com"] })),
    );
    assert_eq!(herd.status, 201);
    let herd_id = herd.body["id"].as_str().unwrap().to_string();

    let unknown_member = call(
        &api,
        Method::Post,
        "/herds",
        Some(&a.token),
        Some(json!({ "name": "Ghosts", "memberEmails": ["ghost@x.com"] })),
    );
    assert_eq!(unknown_member.status, 404);
    assert_eq!(unknown_member.body["detail"], "User with email ghost@x.com not found");

    let outsider = call(&api, Method::Get, &format!("/herds/{herd_id}"), Some(&c.token), None);
    assert_eq!(outsider.status, 403);

    let b_herds = call(&api, Method::Get, "/herds", Some(&b.token), None);
    assert_eq!(b_herds.body.as_array().unwrap().len(), 1);
    assert_eq!(b_herds.body[0]["members"].as_array().unwrap().len(), 2);

    let shared = call(
        &api,
        Method::Post,
        "/reflections",
        Some(&a.token),
        Some(json!({
            "highText": "h",
            "lowText": "l",
            "buffaloText": "b",
            "sharedWithType": "herd",
            "sharedWithId": herd_id,
        })),
    );
    assert_eq!(shared.status, 201);
    let reflection_id = shared.body["id"].as_str().unwrap().to_string();

    let b_inbox = call(&api, Method::Get, "/notifications", Some(&b.token), None);
    assert_eq!(
        b_inbox.body[0]["message"],
        "A shared a reflection with your herd: Pack"
    );
    let notification_id = b_inbox.body[0]["id"].as_str().unwrap().to_string();

    let visible = call(&api, Method::Get, "/reflections", Some(&b.token), None);
    assert_eq!(visible.body.as_array().unwrap().len(), 1);
    let hidden = call(&api, Method::Get, &format!("/reflections/{reflection_id}"), Some(&c.token), None);
    assert_eq!(hidden.status, 403);

    let react_path = format!("/reflections/{reflection_id}/react");
    let reacted = call(&api, Method::Post, &react_path, Some(&b.token), None);
    assert_eq!(reacted.status, 201);
    assert_eq!(reacted.body["reactionType"], "tell_me_more");
    let twice = call(
        &api,
        Method::Post,
        &react_path,
        Some(&b.token),
        Some(json!({ "reactionType": "love" })),
    );
    assert_eq!(twice.status, 400);
    assert_eq!(twice.body["detail"], "User has already reacted to this reflection");

    let detail = call(&api, Method::Get, &format!("/reflections/{reflection_id}"), Some(&a.token), None);
    assert_eq!(detail.body["reactions"].as_array().unwrap().len(), 1);

    let foreign_read = call(
        &api,
        Method::Put,
        &format!("/notifications/{notification_id}/read"),
        Some(&c.token),
        None,
    );
    assert_eq!(foreign_read.status, 403);
    let read = call(
        &api,
        Method::Put,
        &format!("/notifications/{notification_id}/read"),
        Some(&b.token),
        None,
    );
    assert_eq!(read.status, 200);
    assert_eq!(read.body["message"], "Notification marked as read");

    let deleted = call(
        &api,
        Method::Delete,
        &format!("/notifications/{notification_id}"),
        Some(&a.token),
        None,
    );
    assert_eq!(deleted.status, 200);

    let owner_leave = call(&api, Method::Post, &format!("/herds/{herd_id}/leave"), Some(&a.token), None);
    assert_eq!(owner_leave.status, 400);
    let left = call(&api, Method::Post, &format!("/herds/{herd_id}/leave"), Some(&b.token), None);
    assert_eq!(left.status, 200);
    assert_eq!(left.body["message"], "Successfully left the herd");

    let not_owner = call(&api, Method::Delete, &format!("/herds/{herd_id}"), Some(&c.token), None);
    assert_eq!(not_owner.status, 403);
    let gone = call(&api, Method::Delete, &format!("/herds/{herd_id}"), Some(&a.token), None);
    assert_eq!(gone.status, 200);
    let missing = call(&api, Method::Get, &format!("/herds/{herd_id}"), Some(&a.token), None);
    assert_eq!(missing.status, 404);
}

#[test]
fn direct_notifications_require_known_recipient() {
    let api = api();
    let a = signup(&api, "A", "a@x.com");
    let b = signup(&api, "B", "b@x.com");

    let sent = call(
        &api,
        Method::Post,
        "/notifications",
        Some(&a.token),
        Some(json!({ "recipientId": b.id, "type": "nudge", "message": "hi" })),
    );
    assert_eq!(sent.status, 201);
    assert_eq!(sent.body["read"], false);

    let nobody = call(
        &api,
        Method::Post,
        "/notifications",
        Some(&a.token),
        Some(json!({ "recipientId": uuid::Uuid::new_v4().to_string(), "type": "nudge", "message": "hi" })),
    );
    assert_eq!(nobody.status, 404);

    let bad = call(
        &api,
        Method::Post,
        "/notifications",
        Some(&a.token),
        Some(json!({ "recipientId": "nope", "type": "nudge", "message": "hi" })),
    );
    assert_eq!(bad.status, 400);
}
