//! HTTP/1 transport around [`wolfhop_api::Api`].
//!
//! The API is synchronous and holds a SQLite connection, so each request is
//! handed to the blocking pool.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE, ORIGIN,
    VARY,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{error, info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use wolfhop_api::{Api, ApiRequest, ApiResponse, Method};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Authorization, Content-Type";

struct ServerState {
    api: Arc<Api>,
    allowed_origins: Vec<String>,
}

/// Serves until Ctrl-C.
pub async fn run(api: Api, listen: SocketAddr, allowed_origins: Vec<String>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    let state = Arc::new(ServerState {
        api: Arc::new(api),
        allowed_origins,
    });
    info!("event=server_start module=cli status=ok listen={}", listen);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, Infallible>(handle(&state, req).await) }
                        });
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            warn!(
                                "event=http_connection module=cli status=error peer={} error={}",
                                addr, err
                            );
                        }
                    });
                }
                Err(err) => error!("event=http_accept module=cli status=error error={}", err),
            },
            _ = &mut shutdown => {
                info!("event=server_stop module=cli status=ok reason=ctrl_c");
                return Ok(());
            }
        }
    }
}

async fn handle(state: &ServerState, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let method_name = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| state.allowed_origins.iter().any(|allowed| allowed == origin))
        .map(str::to_string);

    let mut response = match Method::parse(&method_name) {
        Some(Method::Options) => empty(StatusCode::NO_CONTENT),
        Some(method) => dispatch(state, method, req).await,
        None => to_http(&ApiResponse::error(405, "Method Not Allowed")),
    };

    if let Some(origin) = origin {
        apply_cors(&mut response, &origin);
    }

    info!(
        "event=http_request module=cli method={} path={} status={} duration_ms={}",
        method_name,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn dispatch(state: &ServerState, method: Method, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let path = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(err) => {
            warn!("event=http_body module=cli status=error error={}", err);
            return to_http(&ApiResponse::error(400, "could not read request body"));
        }
    };

    let request = ApiRequest {
        method,
        path,
        authorization,
        body,
    };
    let api = Arc::clone(&state.api);
    match tokio::task::spawn_blocking(move || api.handle(&request)).await {
        Ok(response) => to_http(&response),
        Err(err) => {
            error!("event=http_dispatch module=cli status=error error={}", err);
            to_http(&ApiResponse::error(500, "Internal server error"))
        }
    }
}

fn to_http(response: &ApiResponse) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = Response::new(Full::new(Bytes::from(response.body_bytes())));
    *http.status_mut() = status;
    http.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    http
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut http = Response::new(Full::new(Bytes::new()));
    *http.status_mut() = status;
    http
}

fn apply_cors(response: &mut Response<Full<Bytes>>, origin: &str) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(VARY, HeaderValue::from_static("Origin"));
}
