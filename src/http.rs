//! HTTP surface: routes, authentication and request/response mapping onto
//! [`TicketResource`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::JsonRejection, FromRequestParts, Path, Query, State,
    },
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE},
        request, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error};

use crate::{
    api, config,
    db::{self, Storage},
    resource::{
        self, Assignment, ListFilter, NewTicket, Principal, TicketResource,
        Tickets,
    },
};

/// Builds the application router over the given storage.
pub fn router(
    storage: Arc<dyn Storage>,
    http: &config::Http,
    jwt: &config::Jwt,
) -> Result<Router, InvalidHeaderValue> {
    let origins = http
        .cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(origins));

    Ok(Router::new()
        .route("/auth", post(auth))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/tickets/:id",
            get(retrieve_ticket)
                .put(update_ticket)
                .delete(destroy_ticket),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState {
            tickets: Box::new(Tickets::new(Arc::clone(&storage))),
            storage,
            jwt_expiration_time: jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            jwt_encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
        })))
}

type SharedAppState = Arc<AppState>;

struct AppState {
    tickets: Box<dyn TicketResource>,

    storage: Arc<dyn Storage>,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

#[derive(Deserialize)]
struct AuthInput {
    login: String,
    password: String,
}

async fn auth(
    State(state): State<SharedAppState>,
    Json(AuthInput { login, password }): Json<AuthInput>,
) -> Result<String, AuthError> {
    use AuthError as E;

    let password_hash = db::user::PasswordHash::new(&password);

    let user = state
        .storage
        .get_user_by_login(&login)
        .await?
        .filter(|u| u.password_hash == password_hash)
        .ok_or(E::WrongLoginOrPassword)?;

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    debug!(user = %user.id, "issuing access token");
    encode(
        &Header::default(),
        &AuthClaims {
            user_id: user.id,
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(E::TokenEncoding)
}

#[derive(Debug, From)]
pub enum AuthError {
    #[from]
    DbError(db::Error),
    InvalidToken,
    TokenEncoding(jsonwebtoken::errors::Error),
    UnknownUser,
    WrongLoginOrPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(e) => {
                error!(error = %e, "failed to authenticate");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TokenEncoding(e) => {
                error!(error = %e, "failed to sign access token");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidToken | Self::UnknownUser => StatusCode::UNAUTHORIZED,
            Self::WrongLoginOrPassword => StatusCode::FORBIDDEN,
        }
        .into_response()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    user_id: db::user::Id,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl FromRequestParts<SharedAppState> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = AuthClaims::from_request_parts(parts, state).await?;
        let user = state
            .storage
            .get_user_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        Ok(Self::from(&user))
    }
}

#[derive(Debug, From)]
pub enum TicketError {
    #[from]
    Resource(resource::Error),
    #[from]
    MalformedPayload(JsonRejection),
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Resource(e) => e.into_response(),
            Self::MalformedPayload(rejection) => {
                debug!(%rejection, "malformed ticket payload");
                StatusCode::BAD_REQUEST.into_response()
            }
        }
    }
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    principal: Principal,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<api::Ticket>>, TicketError> {
    let filter = params.into_iter().collect::<ListFilter>();
    Ok(Json(state.tickets.list(&principal, &filter).await?))
}

async fn retrieve_ticket(
    State(state): State<SharedAppState>,
    principal: Principal,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::Ticket>, TicketError> {
    Ok(Json(state.tickets.retrieve(&principal, id).await?))
}

async fn create_ticket(
    State(state): State<SharedAppState>,
    principal: Principal,
    input: Result<Json<NewTicket>, JsonRejection>,
) -> Result<(StatusCode, Json<api::Ticket>), TicketError> {
    let Json(input) = input?;
    let ticket = state.tickets.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn update_ticket(
    State(state): State<SharedAppState>,
    principal: Principal,
    Path(id): Path<api::ticket::Id>,
    input: Result<Json<Assignment>, JsonRejection>,
) -> Result<StatusCode, TicketError> {
    let Json(input) = input?;
    state.tickets.update(&principal, id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn destroy_ticket(
    State(state): State<SharedAppState>,
    principal: Principal,
    Path(id): Path<api::ticket::Id>,
) -> Result<StatusCode, TicketError> {
    state.tickets.destroy(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
