//! Route table, authentication gate, and error-to-status mapping.
//!
//! # Invariants
//! - Routes resolve identically with or without the [`API_PREFIX`].
//! - Every route except `/`, `/healthz`, signup, and login requires a valid
//!   bearer credential; the route is resolved first so unknown paths are 404.
//! - One request holds the connection lock for its whole duration.

use crate::dto::{
    FriendAddQuery, HerdCreateBody, HerdDto, HerdUpdateBody, LoginBody, NotificationCreateBody,
    NotificationDto, ProfileUpdateBody, ReactionCreateBody, ReactionDto, ReflectionCreateBody,
    ReflectionDto, SignupBody, TokenDto, UserDto,
};
use crate::request::{ApiRequest, ApiResponse, Method};
use log::{error, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use uuid::Uuid;
use wolfhop_core::repo::friend_repo::SqliteFriendRepository;
use wolfhop_core::repo::herd_repo::SqliteHerdRepository;
use wolfhop_core::repo::notification_repo::SqliteNotificationRepository;
use wolfhop_core::repo::reflection_repo::SqliteReflectionRepository;
use wolfhop_core::repo::user_repo::SqliteUserRepository;
use wolfhop_core::service::account_service::AccountService;
use wolfhop_core::service::friend_service::FriendService;
use wolfhop_core::service::herd_service::{HerdPatch, HerdService};
use wolfhop_core::service::notification_service::NotificationService;
use wolfhop_core::service::notifier::StoreNotificationEmitter;
use wolfhop_core::service::reaction_service::ReactionService;
use wolfhop_core::service::reflection_service::ReflectionService;
use wolfhop_core::{
    ErrorKind, IdentityProvider, JwtIdentityProvider, ReflectionDraft, RepoError, ServiceError,
    ShareTarget, User, UserId,
};

/// Versioned prefix under which every route is also served.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug)]
pub enum ApiError {
    /// Malformed body, path id, or query.
    BadRequest(String),
    RouteNotFound,
    Service(ServiceError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::RouteNotFound => 404,
            Self::Service(err) => match err.kind() {
                ErrorKind::NotFound => 404,
                ErrorKind::Forbidden => 403,
                ErrorKind::Validation => 400,
                ErrorKind::Unauthenticated => 401,
                ErrorKind::Internal => 500,
            },
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::RouteNotFound => write!(f, "Not Found"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Service(ServiceError::Repo(value))
    }
}

type ApiResult = Result<ApiResponse, ApiError>;

/// Request dispatcher owning the record store connection.
pub struct Api {
    conn: Mutex<Connection>,
    identity: JwtIdentityProvider,
}

impl Api {
    pub fn new(conn: Connection, identity: JwtIdentityProvider) -> Self {
        Self {
            conn: Mutex::new(conn),
            identity,
        }
    }

    /// Handles one request; failures become `{"detail": ...}` bodies.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(poisoned) => {
                warn!("event=api_lock module=api status=error reason=poisoned");
                poisoned.into_inner()
            }
        };

        match self.dispatch(&conn, request) {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    let cause = err
                        .source()
                        .map(|source| format!("{source:?}"))
                        .unwrap_or_default();
                    error!(
                        "event=api_error module=api status=error method={} path={} code={} cause={}",
                        request.method.as_str(),
                        request.route_path(),
                        status,
                        cause
                    );
                }
                ApiResponse::error(status, &err.to_string())
            }
        }
    }

    fn dispatch(&self, conn: &Connection, request: &ApiRequest) -> ApiResult {
        let path = request.route_path();
        let path = path
            .strip_prefix(API_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path);
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        let route = Route::resolve(request.method, &segments).ok_or(ApiError::RouteNotFound)?;

        match route {
            Route::Root => return Ok(ApiResponse::message(200, "Hello World")),
            Route::Health => return Ok(health(conn)),
            _ => {}
        }

        let stores = Stores::open(conn)?;
        match route {
            Route::Signup => {
                let body: SignupBody = parse_body(request)?;
                let token = stores.accounts(&self.identity).signup(
                    &body.display_name,
                    &body.email,
                    &body.password,
                )?;
                return Ok(ApiResponse::json(201, &TokenDto { token }));
            }
            Route::Login => {
                let body: LoginBody = parse_body(request)?;
                let token = stores
                    .accounts(&self.identity)
                    .login(&body.email, &body.password)?;
                return Ok(ApiResponse::json(200, &TokenDto { token }));
            }
            _ => {}
        }

        let token = request
            .bearer_token()
            .ok_or(ApiError::Service(ServiceError::Unauthenticated))?;
        let user = stores.accounts(&self.identity).authenticate(token)?;
        self.dispatch_authenticated(&stores, request, route, user)
    }

    fn dispatch_authenticated(
        &self,
        stores: &Stores<'_>,
        request: &ApiRequest,
        route: Route<'_>,
        user: User,
    ) -> ApiResult {
        let me = user.id;
        match route {
            Route::Me => Ok(ApiResponse::json(200, &UserDto::from(&user))),
            Route::ListUsers => {
                let users = stores.accounts(&self.identity).list_users()?;
                Ok(ApiResponse::json(200, &users_dto(&users)))
            }
            Route::UserByEmail(raw) => {
                let email = urlencoding::decode(raw)
                    .map_err(|_| ApiError::BadRequest("invalid email in path".to_string()))?;
                let found = stores.accounts(&self.identity).find_by_email(&email)?;
                Ok(ApiResponse::json(200, &UserDto::from(&found)))
            }
            Route::UpdateMe => {
                let body: ProfileUpdateBody = parse_body(request)?;
                let updated = stores.accounts(&self.identity).update_profile(
                    me,
                    body.display_name.as_deref(),
                    body.password.as_deref(),
                )?;
                Ok(ApiResponse::json(200, &UserDto::from(&updated)))
            }
            Route::AddFriend(raw) => {
                let friend_id = parse_id(raw, "friend")?;
                let query = parse_query::<FriendAddQuery>(request)?;
                let friends =
                    stores
                        .friends()
                        .add_friend(me, friend_id, query.notification_creation)?;
                Ok(ApiResponse::json(200, &users_dto(&friends)))
            }
            Route::RemoveFriend(raw) => {
                let friend_id = parse_id(raw, "friend")?;
                let service = stores.friends();
                service.remove_friend(me, friend_id)?;
                let remaining = service.list_friends(me)?;
                Ok(ApiResponse::json(
                    200,
                    &json!({ "friends": users_dto(&remaining) }),
                ))
            }
            Route::ListFriends => {
                let friends = stores.friends().list_friends(me)?;
                Ok(ApiResponse::json(200, &users_dto(&friends)))
            }
            Route::CreateHerd => {
                let body: HerdCreateBody = parse_body(request)?;
                let herd = stores.herds().create(me, &body.name, &body.member_emails)?;
                Ok(ApiResponse::json(201, &HerdDto::from(&herd)))
            }
            Route::ListHerds => {
                let herds = stores.herds().list(me)?;
                Ok(ApiResponse::json(
                    200,
                    &herds.iter().map(HerdDto::from).collect::<Vec<_>>(),
                ))
            }
            Route::GetHerd(raw) => {
                let herd = stores.herds().get(parse_id(raw, "herd")?, me)?;
                Ok(ApiResponse::json(200, &HerdDto::from(&herd)))
            }
            Route::UpdateHerd(raw) => {
                let herd_id = parse_id(raw, "herd")?;
                let body: HerdUpdateBody = parse_body(request)?;
                let herd = stores.herds().update(
                    herd_id,
                    me,
                    HerdPatch {
                        name: body.name,
                        member_emails: body.member_emails,
                    },
                )?;
                Ok(ApiResponse::json(200, &HerdDto::from(&herd)))
            }
            Route::DeleteHerd(raw) => {
                stores.herds().delete(parse_id(raw, "herd")?, me)?;
                Ok(ApiResponse::message(200, "Herd deleted successfully"))
            }
            Route::LeaveHerd(raw) => {
                stores.herds().leave(parse_id(raw, "herd")?, me)?;
                Ok(ApiResponse::message(200, "Successfully left the herd"))
            }
            Route::CreateReflection => {
                let body: ReflectionCreateBody = parse_body(request)?;
                let share =
                    ShareTarget::from_parts(&body.shared_with_type, body.shared_with_id.as_deref())
                        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                let reflection = stores.reflections().create(
                    me,
                    ReflectionDraft {
                        high_text: body.high_text,
                        low_text: body.low_text,
                        buffalo_text: body.buffalo_text,
                        share,
                    },
                )?;
                Ok(ApiResponse::json(201, &ReflectionDto::from(&reflection)))
            }
            Route::ListReflections => {
                let visible = stores.reflections().list_visible(me)?;
                Ok(ApiResponse::json(
                    200,
                    &visible.iter().map(ReflectionDto::from).collect::<Vec<_>>(),
                ))
            }
            Route::GetReflection(raw) => {
                let entry = stores
                    .reflections()
                    .get_one(parse_id(raw, "reflection")?, me)?;
                Ok(ApiResponse::json(200, &ReflectionDto::from(&entry)))
            }
            Route::React(raw) => {
                let reflection_id = parse_id(raw, "reflection")?;
                let body: ReactionCreateBody = parse_optional_body(request)?;
                let reaction = ReactionService::new(stores.reflections).react(
                    reflection_id,
                    me,
                    body.reaction_type.as_deref(),
                )?;
                Ok(ApiResponse::json(201, &ReactionDto::from(&reaction)))
            }
            Route::ListNotifications => {
                let inbox = stores.notifications().list(me)?;
                Ok(ApiResponse::json(
                    200,
                    &inbox.iter().map(NotificationDto::from).collect::<Vec<_>>(),
                ))
            }
            Route::SendNotification => {
                let body: NotificationCreateBody = parse_body(request)?;
                let recipient_id = parse_id(&body.recipient_id, "recipient")?;
                let notification =
                    stores
                        .notifications()
                        .send(me, recipient_id, &body.kind, &body.message)?;
                Ok(ApiResponse::json(201, &NotificationDto::from(&notification)))
            }
            Route::MarkNotificationRead(raw) => {
                stores
                    .notifications()
                    .mark_read(parse_id(raw, "notification")?, me)?;
                Ok(ApiResponse::message(200, "Notification marked as read"))
            }
            Route::DeleteNotification(raw) => {
                stores
                    .notifications()
                    .delete(parse_id(raw, "notification")?, me)?;
                Ok(ApiResponse::message(200, "Notification deleted"))
            }
            Route::Root | Route::Health | Route::Signup | Route::Login => {
                Err(ApiError::RouteNotFound)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    Root,
    Health,
    Signup,
    Login,
    Me,
    ListUsers,
    UserByEmail(&'a str),
    UpdateMe,
    AddFriend(&'a str),
    RemoveFriend(&'a str),
    ListFriends,
    CreateHerd,
    ListHerds,
    GetHerd(&'a str),
    UpdateHerd(&'a str),
    DeleteHerd(&'a str),
    LeaveHerd(&'a str),
    CreateReflection,
    ListReflections,
    GetReflection(&'a str),
    React(&'a str),
    ListNotifications,
    SendNotification,
    MarkNotificationRead(&'a str),
    DeleteNotification(&'a str),
}

impl<'a> Route<'a> {
    fn resolve(method: Method, segments: &[&'a str]) -> Option<Self> {
        use Method::{Delete, Get, Post, Put};

        let route = match (method, segments) {
            (Get, []) => Self::Root,
            (Get, ["healthz"]) => Self::Health,
            (Post, ["auth", "signup"]) => Self::Signup,
            (Post, ["auth", "login"]) => Self::Login,
            (Get, ["auth", "me"]) => Self::Me,
            (Get, ["users"]) => Self::ListUsers,
            (Get, ["users", "email", email]) => Self::UserByEmail(email),
            (Put, ["users", "me"]) => Self::UpdateMe,
            (Post, ["friends", "add", id]) => Self::AddFriend(id),
            (Delete, ["friends", "remove", id]) => Self::RemoveFriend(id),
            (Get, ["friends"]) => Self::ListFriends,
            (Post, ["herds"]) => Self::CreateHerd,
            (Get, ["herds"]) => Self::ListHerds,
            (Get, ["herds", id]) => Self::GetHerd(id),
            (Put, ["herds", id]) => Self::UpdateHerd(id),
            (Delete, ["herds", id]) => Self::DeleteHerd(id),
            (Post, ["herds", id, "leave"]) => Self::LeaveHerd(id),
            (Post, ["reflections"]) => Self::CreateReflection,
            (Get, ["reflections"]) => Self::ListReflections,
            (Get, ["reflections", id]) => Self::GetReflection(id),
            (Post, ["reflections", id, "react"]) => Self::React(id),
            (Get, ["notifications"]) => Self::ListNotifications,
            (Post, ["notifications"]) => Self::SendNotification,
            (Put, ["notifications", id, "read"]) => Self::MarkNotificationRead(id),
            (Delete, ["notifications", id]) => Self::DeleteNotification(id),
            _ => return None,
        };
        Some(route)
    }
}

/// Repositories bound to the locked connection for one request.
#[derive(Clone, Copy)]
struct Stores<'conn> {
    users: SqliteUserRepository<'conn>,
    friends: SqliteFriendRepository<'conn>,
    herds: SqliteHerdRepository<'conn>,
    reflections: SqliteReflectionRepository<'conn>,
    notifications: SqliteNotificationRepository<'conn>,
}

impl<'conn> Stores<'conn> {
    fn open(conn: &'conn Connection) -> Result<Self, RepoError> {
        Ok(Self {
            users: SqliteUserRepository::try_new(conn)?,
            friends: SqliteFriendRepository::try_new(conn)?,
            herds: SqliteHerdRepository::try_new(conn)?,
            reflections: SqliteReflectionRepository::try_new(conn)?,
            notifications: SqliteNotificationRepository::try_new(conn)?,
        })
    }

    fn emitter(&self) -> StoreNotificationEmitter<SqliteNotificationRepository<'conn>> {
        StoreNotificationEmitter::new(self.notifications)
    }

    fn accounts<I: IdentityProvider>(
        &self,
        identity: I,
    ) -> AccountService<SqliteUserRepository<'conn>, I> {
        AccountService::new(self.users, identity)
    }

    fn friends(
        &self,
    ) -> FriendService<
        SqliteUserRepository<'conn>,
        SqliteFriendRepository<'conn>,
        StoreNotificationEmitter<SqliteNotificationRepository<'conn>>,
    > {
        FriendService::new(self.users, self.friends, self.emitter())
    }

    fn herds(&self) -> HerdService<SqliteUserRepository<'conn>, SqliteHerdRepository<'conn>> {
        HerdService::new(self.users, self.herds)
    }

    fn reflections(
        &self,
    ) -> ReflectionService<
        SqliteUserRepository<'conn>,
        SqliteHerdRepository<'conn>,
        SqliteReflectionRepository<'conn>,
        StoreNotificationEmitter<SqliteNotificationRepository<'conn>>,
    > {
        ReflectionService::new(self.users, self.herds, self.reflections, self.emitter())
    }

    fn notifications(
        &self,
    ) -> NotificationService<SqliteUserRepository<'conn>, SqliteNotificationRepository<'conn>>
    {
        NotificationService::new(self.users, self.notifications)
    }
}

fn health(conn: &Connection) -> ApiResponse {
    match conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => ApiResponse::json(200, &json!({ "status": "ok" })),
        Err(err) => ApiResponse::json(
            500,
            &json!({ "status": "error", "details": err.to_string() }),
        ),
    }
}

fn users_dto(users: &[User]) -> Vec<UserDto> {
    users.iter().map(UserDto::from).collect()
}

fn parse_id(raw: &str, what: &str) -> Result<UserId, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid {what} id `{raw}`")))
}

fn parse_body<T: DeserializeOwned>(request: &ApiRequest) -> Result<T, ApiError> {
    serde_json::from_slice(&request.body)
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
}

/// Like [`parse_body`] but an empty body yields `T::default()`.
fn parse_optional_body<T>(request: &ApiRequest) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if request.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_body(request)
}

fn parse_query<T: DeserializeOwned + Default>(request: &ApiRequest) -> Result<T, ApiError> {
    let query = request.query();
    if query.is_empty() {
        return Ok(T::default());
    }
    serde_urlencoded::from_str(query)
        .map_err(|err| ApiError::BadRequest(format!("invalid query string: {err}")))
}
