use crate::counter::{self, CountAction};
use crate::errors::AppError;
use crate::models::{CountOutcome, CountRequest, DateQuery, LoginForm, SummaryResponse};
use crate::session::{Notice, NoticeKind, SessionId, session_cookie, session_id_from_headers};
use crate::state::AppState;
use crate::stats::build_summary;
use crate::ui::{render_dashboard, render_login};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use tracing::error;

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Result<Response, AppError> {
    let Ok(id) = require_login(&state, &headers).await else {
        return Ok(Html(render_login(None)).into_response());
    };

    let summary = summary_for(&state, &query).await?;
    let notice = state.sessions.take_notice(id).await;
    Ok(Html(render_dashboard(&summary, notice.as_ref())).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let existing = session_id_from_headers(&headers);
    match state
        .sessions
        .login(existing, &form.password, &state.password)
        .await
    {
        Ok((id, true)) => (
            [(header::SET_COOKIE, session_cookie(id))],
            Redirect::to("/"),
        )
            .into_response(),
        Ok((_, false)) => Redirect::to("/").into_response(),
        Err(err) => (
            StatusCode::UNAUTHORIZED,
            Html(render_login(Some(&format!("Login failed: {err}.")))),
        )
            .into_response(),
    }
}

pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    require_login(&state, &headers).await?;
    Ok(Json(summary_for(&state, &query).await?))
}

pub async fn count(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CountRequest>,
) -> Result<Json<CountOutcome>, AppError> {
    require_login(&state, &headers).await?;
    let action: CountAction = payload.action.parse().map_err(AppError::bad_request)?;

    let outcome = counter::apply(&state.log, action, state.log.now())
        .await
        .map_err(|err| {
            error!("failed to record {action:?}: {err}");
            AppError::from(err)
        })?;
    Ok(Json(outcome))
}

pub async fn count_add(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    count_form(&state, &headers, CountAction::Add).await
}

pub async fn count_sub(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    count_form(&state, &headers, CountAction::Sub).await
}

pub async fn count_reset(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    count_form(&state, &headers, CountAction::Reset).await
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn count_form(state: &AppState, headers: &HeaderMap, action: CountAction) -> Redirect {
    let Ok(id) = require_login(state, headers).await else {
        return Redirect::to("/");
    };

    let notice = match counter::apply(&state.log, action, state.log.now()).await {
        Ok(outcome) => Notice::new(notice_kind(action), outcome.message),
        Err(err) => {
            error!("failed to record {action:?}: {err}");
            Notice::new(NoticeKind::Error, format!("Could not save the change: {err}"))
        }
    };
    state.sessions.set_notice(id, notice).await;
    Redirect::to("/")
}

fn notice_kind(action: CountAction) -> NoticeKind {
    match action {
        CountAction::Add => NoticeKind::Success,
        CountAction::Sub => NoticeKind::Warning,
        CountAction::Reset => NoticeKind::Error,
    }
}

async fn require_login(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionId, AppError> {
    let id = session_id_from_headers(headers).ok_or_else(AppError::unauthorized)?;
    if state.sessions.is_logged_in(Some(id)).await {
        Ok(id)
    } else {
        Err(AppError::unauthorized())
    }
}

async fn summary_for(state: &AppState, query: &DateQuery) -> Result<SummaryResponse, AppError> {
    let selected = selected_date(query, state.log.now().date_naive())?;
    let events = state.log.read_all().await;
    Ok(build_summary(
        events.as_ref().map(|events| events.as_slice()),
        selected,
        state.initial_visitors,
    ))
}

fn selected_date(query: &DateQuery, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match query.date.as_deref().map(str::trim) {
        None | Some("") => Ok(today),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::bad_request(format!("date must be YYYY-MM-DD, got '{raw}'"))),
    }
}
