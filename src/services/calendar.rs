//! Calendar services - Export iCal degli eventi visibili
//!
//! Le app calendario non possono impostare l'header Authorization, quindi il
//! JWT arriva nel parametro `token` della query string.

use crate::calendar::{CalendarEntry, render_calendar};
use crate::core::auth::resolve_user;
use crate::core::{AppError, AppState};
use crate::dtos::CalendarQuery;
use crate::entities::User;
use crate::repositories::Read;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};

const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

async fn build_calendar(state: &AppState, user: &User) -> Result<String, AppError> {
    let events = state
        .event
        .list_visible_for_user(&user.user_id, &[])
        .await?;

    let mut entries = Vec::with_capacity(events.len());
    for event in events {
        let location = match event.address_id {
            Some(address_id) => state.address.read(&address_id).await?.map(|address| {
                match address.city {
                    Some(city) => format!("{}, {}", address.address_line, city),
                    None => address.address_line,
                }
            }),
            None => None,
        };
        entries.push(CalendarEntry {
            uid: event.event_id,
            title: event.title,
            description: event.description,
            location,
            start: event.start_time,
            end: event.end_time,
            updated_at: event.updated_at,
        });
    }

    debug!("Rendering calendar with {} events", entries.len());
    Ok(render_calendar(
        &format!("zigzag - {}", user.username),
        &entries,
        Utc::now(),
    ))
}

#[instrument(skip(state, query))]
pub async fn download_calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = resolve_user(&state, &query.token).await?;
    let body = build_calendar(&state, &user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"zigzag-events.ics\"",
            ),
        ],
        body,
    ))
}

#[instrument(skip(state, query))]
pub async fn calendar_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = resolve_user(&state, &query.token).await?;
    let body = build_calendar(&state, &user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "inline; filename=\"zigzag-events.ics\""),
        ],
        body,
    ))
}
