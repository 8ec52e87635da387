use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{JwtVerifier, expenses, gateway, groups, history, members};
use engine::{Engine, IdentityVerifier, MemberId};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub jwt: Arc<JwtVerifier>,
}

/// Member resolved from the bearer token of the request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CurrentMember(pub MemberId);

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let member_id = state.jwt.verify(bearer.token()).map_err(|err| {
        tracing::debug!("rejecting request: {err}");
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(CurrentMember(member_id));
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/members/{id}", get(members::member_get))
        .route("/expenses", post(expenses::expense_new).get(expenses::expenses_list))
        .route("/expenses/mine", get(expenses::expenses_mine))
        .route("/expenses/balance", get(expenses::expenses_balance))
        .route("/expenses/settlements", get(expenses::expenses_settlements))
        .route("/expenses/history", get(history::history_mine))
        .route(
            "/expenses/{id}",
            put(expenses::expense_update).delete(expenses::expense_delete),
        )
        .route("/expenses/{id}/history", get(history::expense_history))
        .route("/groups", post(groups::group_new).get(groups::groups_list))
        .route("/groups/{id}", put(groups::group_update))
        .route("/groups/{id}/debts", get(groups::group_debts))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/members", post(members::member_new))
        .route("/ws", get(gateway::ws_handler))
        .merge(protected)
        .with_state(state)
}

pub async fn run(engine: Engine, jwt: JwtVerifier, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, jwt, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    jwt: JwtVerifier,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        jwt: Arc::new(jwt),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    jwt: JwtVerifier,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, jwt, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
