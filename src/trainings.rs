use std::collections::HashMap;

use axum::{
    Form, Router,
    extract::{Path, State},
    response::Html,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use hypertext::{Raw, prelude::*};
use uuid::Uuid;

use crate::calendar::{self, DateKey};
use crate::engine::{EditorFlow, TrainingEditor};
use crate::error::{AppError, AppResult};
use crate::overrides::OverrideStore;
use crate::registry::AppState;
use crate::schedule::{DateRange, Training, Weekday};
use crate::view::{Notice, OccurrenceView, WeekdayView};

const CLIENT_COOKIE: &str = "client";
/// Span offered for a new training, starting today.
const NEW_TRAINING_DAYS: i64 = 28;

/// Every editor event posts the whole form.
type EditorFields = HashMap<String, String>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trainings_index))
        .route("/new", get(new_training))
        .route("/{id}", get(training_show))
        .route("/{id}/edit", get(edit_training))
        .route("/editor/{sid}/dates", post(dates_changed))
        .route("/editor/{sid}/weekday/{code}", post(weekday_toggled))
        .route("/editor/{sid}/time/{code}", post(time_changed))
        .route("/editor/{sid}/per-week", post(per_week_changed))
        .route("/editor/{sid}/occurrence/{key}", post(occurrence_toggled))
        .route("/editor/{sid}/submit", post(submit_editor))
        .route("/editor/{sid}/close", post(close_editor))
}

/// Id of the browsing session, issuing a cookie on first contact.
fn client_id(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(CLIENT_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }
    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((CLIENT_COOKIE, id.clone()))
        .path("/")
        .http_only(true);
    (jar.add(cookie), id)
}

fn field<'a>(fields: &'a EditorFields, name: &str) -> &'a str {
    fields.get(name).map_or("", String::as_str)
}

fn editor_not_found(sid: Uuid) -> AppError {
    AppError::NotFound(format!("Editor {sid}"))
}

// GET /trainings - List saved trainings
async fn trainings_index(State(state): State<AppState>) -> Html<String> {
    let registry = state.registry.lock().await;
    let rows: Vec<String> = registry
        .trainings()
        .map(|(id, training)| render_training_row(id, training))
        .collect();
    Html(render_index(&rows))
}

// GET /trainings/new - Open an editor for a new training
async fn new_training(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    let (jar, client) = client_id(jar);
    let start = calendar::today();
    let end = calendar::add_days(start, NEW_TRAINING_DAYS).unwrap_or(start);

    let mut registry = state.registry.lock().await;
    let sid = registry.open_create(&state.settings, &client, DateRange::new(start, end));
    let html = registry
        .session(sid)
        .map(|session| render_editor_page(sid, &session.editor))
        .unwrap_or_default();
    (jar, Html(html))
}

// GET /trainings/:id - Show a saved training and its sessions
async fn training_show(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Html<String>> {
    let registry = state.registry.lock().await;
    let training = registry
        .training(id)
        .ok_or_else(|| AppError::NotFound(format!("Training {id}")))?;
    Ok(Html(render_show_page(id, training)))
}

// GET /trainings/:id/edit - Open an editor for a saved training
async fn edit_training(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Html<String>)> {
    let (jar, client) = client_id(jar);
    let mut registry = state.registry.lock().await;
    let sid = registry
        .open_edit(&state.settings, &client, id)
        .ok_or_else(|| AppError::NotFound(format!("Training {id}")))?;
    let html = registry
        .session(sid)
        .map(|session| render_editor_page(sid, &session.editor))
        .unwrap_or_default();
    Ok((jar, Html(html)))
}

/// Apply one event to an open editor and re-render it.
async fn editor_event(
    state: &AppState,
    sid: Uuid,
    fields: &EditorFields,
    event: impl FnOnce(&mut TrainingEditor, &mut OverrideStore),
) -> AppResult<Html<String>> {
    let mut registry = state.registry.lock().await;
    registry
        .with_editor(sid, |editor, store| {
            if let Some(name) = fields.get("name") {
                editor.set_name(name);
            }
            event(editor, store);
            Html(render_editor(sid, editor))
        })
        .ok_or_else(|| editor_not_found(sid))
}

// POST /trainings/editor/:sid/dates
async fn dates_changed(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    editor_event(&state, sid, &fields, |editor, store| {
        let (start, end) = (field(&fields, "date_start"), field(&fields, "date_end"));
        editor.on_date_range_changed(store, start, end);
    })
    .await
}

// POST /trainings/editor/:sid/weekday/:code
async fn weekday_toggled(
    State(state): State<AppState>,
    Path((sid, code)): Path<(Uuid, String)>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    let weekday = Weekday::from_code(&code)
        .ok_or_else(|| AppError::BadRequest(format!("unknown weekday '{code}'")))?;
    editor_event(&state, sid, &fields, |editor, store| {
        editor.on_weekday_toggled(store, weekday);
    })
    .await
}

// POST /trainings/editor/:sid/time/:code
async fn time_changed(
    State(state): State<AppState>,
    Path((sid, code)): Path<(Uuid, String)>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    let weekday = Weekday::from_code(&code)
        .ok_or_else(|| AppError::BadRequest(format!("unknown weekday '{code}'")))?;
    let from = field(&fields, &format!("{code}_from")).to_string();
    let to = field(&fields, &format!("{code}_to")).to_string();
    editor_event(&state, sid, &fields, |editor, _| {
        editor.on_time_field_changed(weekday, &from, &to);
    })
    .await
}

// POST /trainings/editor/:sid/per-week
async fn per_week_changed(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    editor_event(&state, sid, &fields, |editor, _| {
        editor.on_per_week_changed(field(&fields, "per_week"));
    })
    .await
}

// POST /trainings/editor/:sid/occurrence/:key
async fn occurrence_toggled(
    State(state): State<AppState>,
    Path((sid, key)): Path<(Uuid, String)>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    let key: DateKey = key
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid date '{key}'")))?;
    editor_event(&state, sid, &fields, |editor, store| {
        editor.on_occurrence_toggled(store, key);
    })
    .await
}

/// Bring the model in line with whatever the submitted form carries.
fn sync_fields(editor: &mut TrainingEditor, store: &mut OverrideStore, fields: &EditorFields) {
    if let Some(name) = fields.get("name") {
        editor.set_name(name);
    }
    let start = field(fields, "date_start").trim();
    let end = field(fields, "date_end").trim();
    if start != editor.date_start() || end != editor.date_end() {
        editor.on_date_range_changed(store, start, end);
    }
    if let Some(value) = fields.get("per_week") {
        editor.on_per_week_changed(value);
    }
    // disabled time inputs are not posted
    for weekday in Weekday::ALL {
        let from = fields.get(&format!("{}_from", weekday.code()));
        let to = fields.get(&format!("{}_to", weekday.code()));
        if let (Some(from), Some(to)) = (from, to) {
            editor.on_time_field_changed(weekday, from, to);
        }
    }
}

// POST /trainings/editor/:sid/submit - Run the gate; save on success
async fn submit_editor(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Form(fields): Form<EditorFields>,
) -> AppResult<Html<String>> {
    let mut registry = state.registry.lock().await;
    registry
        .with_editor(sid, |editor, store| sync_fields(editor, store, &fields))
        .ok_or_else(|| editor_not_found(sid))?;

    match registry.submit(sid) {
        Some(Ok(id)) => Ok(Html(format!(
            r#"<script>location.href = "/trainings/{id}";</script>"#
        ))),
        Some(Err(error)) => {
            tracing::info!(%sid, %error, "submission rejected");
            let session = registry.session(sid).ok_or_else(|| editor_not_found(sid))?;
            Ok(Html(render_editor(sid, &session.editor)))
        }
        None => Err(editor_not_found(sid)),
    }
}

// POST /trainings/editor/:sid/close - Cancel or page hide
async fn close_editor(State(state): State<AppState>, Path(sid): Path<Uuid>) -> Html<String> {
    let mut registry = state.registry.lock().await;
    registry.close(sid);
    Html(r#"<script>location.href = "/trainings";</script>"#.to_string())
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn display_name(training: &Training) -> &str {
    if training.name.is_empty() {
        "Untitled training"
    } else {
        &training.name
    }
}

fn format_range(range: &DateRange) -> String {
    format!(
        "{} – {}",
        calendar::format_display_date(range.start),
        calendar::format_display_date(range.end)
    )
}

fn render_page(title: &str, body: &str) -> String {
    maud! {
        !DOCTYPE
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Trainings" }
                link rel="stylesheet" href="/static/app.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body {
                (Raw::dangerously_create(body))
            }
        }
    }
    .render()
    .into_inner()
}

fn render_index(rows: &[String]) -> String {
    let body = maud! {
        div .trainings-page {
            div .title-row {
                h1 { "Trainings" }
                a .btn href="/trainings/new" { "New Training" }
            }
            @if rows.is_empty() {
                div .empty-list {
                    p { "No trainings yet. Create your first one!" }
                }
            } @else {
                ul .training-list {
                    (Raw::dangerously_create(&rows.join("\n")))
                }
            }
        }
    }
    .render()
    .into_inner();

    render_page("All", &body)
}

fn render_training_row(id: u64, training: &Training) -> String {
    maud! {
        li .training-list-item {
            a href=(format!("/trainings/{id}")) { (display_name(training)) }
            span .training-range { (format_range(&training.range)) }
            span .training-days { (training.weekdays_label()) }
            a .btn href=(format!("/trainings/{id}/edit")) { "Edit" }
        }
    }
    .render()
    .into_inner()
}

fn render_show_page(id: u64, training: &Training) -> String {
    let sessions = training.sessions();
    let per_week = training
        .per_week
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    let body = maud! {
        div .training-show-page {
            div .training-show-header {
                a href="/trainings" { "← Trainings" }
            }
            div .title-row {
                h1 { (display_name(training)) }
                a .btn href=(format!("/trainings/{id}/edit")) { "Edit" }
            }
            div .training-show-info {
                div .info-row {
                    strong { "Period: " }
                    span { (format_range(&training.range)) }
                }
                div .info-row {
                    strong { "Weekdays: " }
                    span { (training.weekdays_label()) }
                }
                div .info-row {
                    strong { "Per week: " }
                    span { (per_week) }
                }
            }
            section .training-show-section {
                h2 { "Sessions (" (sessions.len().to_string()) ")" }
                table .sessions {
                    thead {
                        tr { th { "Day" } th { "Date" } th { "From" } th { "To" } }
                    }
                    tbody {
                        @for session in &sessions {
                            tr {
                                td { (Weekday::of(session.start.date()).short_label()) }
                                td { (calendar::format_display_date(session.start.date())) }
                                td { (session.start.format("%H:%M").to_string()) }
                                td { (session.end.format("%H:%M").to_string()) }
                            }
                        }
                    }
                }
            }
        }
    }
    .render()
    .into_inner();

    render_page(display_name(training), &body)
}

fn render_editor_page(sid: Uuid, editor: &TrainingEditor) -> String {
    let editor_html = render_editor(sid, editor);
    // Leaving the page ends the editor session; a repeated close is ignored.
    let beacon = format!(
        r#"<script>window.addEventListener("pagehide", () => navigator.sendBeacon("/trainings/editor/{sid}/close"));</script>"#
    );

    let body = maud! {
        div .training-editor-page {
            div .training-show-header {
                a href="/trainings" { "← Trainings" }
            }
            (Raw::dangerously_create(&editor_html))
        }
    }
    .render()
    .into_inner();

    let title = match editor.flow() {
        EditorFlow::Create => "New",
        EditorFlow::Edit => "Edit",
    };
    render_page(title, &format!("{body}\n{beacon}"))
}

/// `<input>` posting the editor form to `url` on change.
fn event_input(url: &str, kind: &str, name: &str, value: &str, extra: &str) -> String {
    format!(
        r##"<input type="{kind}" id="{name}" name="{name}" value="{value}"{extra} hx-post="{url}" hx-trigger="change" hx-target="#training-editor" hx-swap="outerHTML" hx-include="closest form">"##,
        value = escape(value),
    )
}

fn event_checkbox(url: &str, id: &str, name: &str, checked: bool, disabled: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    let disabled = if disabled { " disabled" } else { "" };
    format!(
        r##"<input type="checkbox" id="{id}" name="{name}"{checked}{disabled} hx-post="{url}" hx-trigger="change" hx-target="#training-editor" hx-swap="outerHTML" hx-include="closest form">"##
    )
}

fn render_notice(notice: &Option<Notice>) -> String {
    let Some(notice) = notice else {
        return String::new();
    };
    let class = if notice.reported {
        "field-error-message reported"
    } else {
        "field-error-message"
    };
    maud! {
        div class=(class) { (notice.message) }
    }
    .render()
    .into_inner()
}

fn render_occurrence(base: &str, occurrence: &OccurrenceView) -> String {
    let id = format!("occurrence-{}", occurrence.key);
    let checkbox = event_checkbox(
        &format!("{base}/occurrence/{}", occurrence.key),
        &id,
        &format!("occurrence_{}", occurrence.key),
        occurrence.checked,
        occurrence.disabled,
    );

    maud! {
        li .occurrence {
            (Raw::dangerously_create(&checkbox))
            label for=(id) { (occurrence.label) }
            (Raw::dangerously_create(&render_notice(&occurrence.error)))
        }
    }
    .render()
    .into_inner()
}

fn render_weekday(base: &str, day: &WeekdayView, range_valid: bool) -> String {
    let code = day.weekday.code();
    let toggle_id = format!("weekday-{code}");
    let toggle = event_checkbox(
        &format!("{base}/weekday/{code}"),
        &toggle_id,
        &format!("weekday_{code}"),
        day.selected,
        day.toggle_disabled,
    );

    // unselected weekdays keep their typed times, hidden and not posted
    let time_url = format!("{base}/time/{code}");
    let time_state = if day.time_enabled { " required" } else { " disabled" };
    let hidden = if day.time_enabled { "" } else { " hidden" };
    let time_html = format!(
        r#"<div class="time-window"{hidden}><label for="{code}_from">From</label>{}<label for="{code}_to">To</label>{}</div>"#,
        event_input(&time_url, "time", &format!("{code}_from"), &day.from, time_state),
        event_input(&time_url, "time", &format!("{code}_to"), &day.to, time_state),
    );

    let occurrences: Vec<String> = day
        .occurrences
        .iter()
        .map(|o| render_occurrence(base, o))
        .collect();

    maud! {
        div .weekday id=(format!("weekday-row-{code}")) {
            div .field-row {
                (Raw::dangerously_create(&toggle))
                label for=(toggle_id) { (day.weekday.to_string()) }
            }
            (Raw::dangerously_create(&render_notice(&day.error)))
            (Raw::dangerously_create(&time_html))
            (Raw::dangerously_create(&render_notice(&day.time_error)))
            @if day.selected && !range_valid {
                p .occurrences-pending { "Training dates appear once the date range is valid." }
            }
            @if !occurrences.is_empty() {
                ul .occurrences {
                    (Raw::dangerously_create(&occurrences.join("\n")))
                }
            }
        }
    }
    .render()
    .into_inner()
}

/// The editor form. Every event swaps it whole.
pub fn render_editor(sid: Uuid, editor: &TrainingEditor) -> String {
    let view = editor.view();
    let base = format!("/trainings/editor/{sid}");

    let title = match editor.flow() {
        EditorFlow::Create => "New Training".to_string(),
        EditorFlow::Edit => format!("Edit Training: {}", view.name),
    };

    let dates_url = format!("{base}/dates");
    let date_start = event_input(&dates_url, "text", "date_start", &view.date_start, r#" placeholder="d. m. yyyy""#);
    let date_end = event_input(&dates_url, "text", "date_end", &view.date_end, r#" placeholder="d. m. yyyy""#);

    let per_week_html = view
        .per_week
        .as_ref()
        .map(|per_week| {
            let input = event_input(
                &format!("{base}/per-week"),
                "number",
                "per_week",
                &per_week.value,
                &format!(r#" min="1" max="{}""#, per_week.max),
            );
            format!(
                r#"<div class="form-group"><label for="per_week">Trainings per week</label>{input}{}</div>"#,
                render_notice(&per_week.error)
            )
        })
        .unwrap_or_default();

    let weekdays_html: Vec<String> = view
        .weekdays
        .iter()
        .map(|day| render_weekday(&base, day, view.range_valid))
        .collect();

    let cancel_button = format!(
        r##"<button class="btn" type="button" hx-post="{base}/close" hx-target="#training-editor" hx-swap="outerHTML">Cancel</button>"##
    );
    let weekdays_label = format!("Weekdays (at most {})", view.max_weekdays);
    let reported = view.has_reported_errors();

    let inner = maud! {
        div .title-bar {
            h1 .title { (title) }
        }
        div .separator {}

        div .window-pane {
            div .form-group {
                label for="name" { "Name" }
                input type="text" id="name" name="name" value=(view.name);
            }

            div .form-group.date-range {
                label for="date_start" { "From" }
                (Raw::dangerously_create(&date_start))
                label for="date_end" { "To" }
                (Raw::dangerously_create(&date_end))
                (Raw::dangerously_create(&render_notice(&view.date_error)))
            }

            (Raw::dangerously_create(&per_week_html))

            div .form-group.weekdays {
                label { (weekdays_label) }
                (Raw::dangerously_create(&weekdays_html.join("\n")))
            }

            div .form-group style="margin-top: 16px;" {
                @if reported {
                    div .form-error-message style="margin-bottom: 12px; color: #c00; text-align: center;" {
                        "Please fix the error(s) and save again"
                    }
                }
                div style="text-align: right;" {
                    (Raw::dangerously_create(&cancel_button))
                    " "
                    button .btn.btn-default type="submit" { "Save" }
                }
            }
        }
    }
    .render()
    .into_inner();

    // submitting goes through the gate instead of a page load
    format!(
        r##"<form id="training-editor" class="window training-editor" hx-post="{base}/submit" hx-target="this" hx-swap="outerHTML">{inner}</form>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::config::{EditorSettings, WeekdayBound};
    use crate::engine::tests::{date, january};

    fn app(state: &AppState) -> Router {
        router().with_state(state.clone())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn open(state: &AppState) -> Uuid {
        let mut registry = state.registry.lock().await;
        registry.open_create(&state.settings, "c1", january())
    }

    #[tokio::test]
    async fn test_new_training_sets_client_cookie() {
        let state = AppState::new(EditorSettings::default());
        let response = app(&state)
            .oneshot(Request::builder().uri("/new").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("client="));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains(r#"id="training-editor""#));
        assert!(body.contains("sendBeacon"));
    }

    #[tokio::test]
    async fn test_weekday_event_renders_occurrences() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        let uri = format!("/editor/{sid}/weekday/mon");
        let (status, body) = post(app(&state), &uri, "name=Kids").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"id="occurrence-2024-01-08""#));
        assert!(body.contains(r#"name="mon_from""#));

        let registry = state.registry.lock().await;
        let editor = &registry.session(sid).unwrap().editor;
        assert_eq!(editor.name(), "Kids");
        assert_eq!(editor.occurrences(Weekday::Monday).len(), 4);
    }

    #[tokio::test]
    async fn test_short_range_shows_message() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        let (status, body) = post(
            app(&state),
            &format!("/editor/{sid}/dates"),
            "date_start=1.+1.+2024&date_end=5.+1.+2024",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("A recurring training must span at least 14 days"));
        assert!(!body.contains("Please fix the error(s)"));
    }

    #[tokio::test]
    async fn test_selected_weekday_waits_for_valid_range() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;
        post(app(&state), &format!("/editor/{sid}/weekday/tue"), "").await;

        let (_, body) = post(
            app(&state),
            &format!("/editor/{sid}/dates"),
            "date_start=1.+1.+2024&date_end=5.+1.+2024",
        )
        .await;
        assert!(body.contains("Training dates appear once the date range is valid."));
        assert!(!body.contains(r#"class="occurrences""#));
    }

    #[tokio::test]
    async fn test_count_mismatch_reported_only_on_save() {
        let settings = EditorSettings {
            weekday_bound: WeekdayBound::PerWeek { max: 3 },
            ..EditorSettings::default()
        };
        let state = AppState::new(settings);
        let sid = open(&state).await;

        post(app(&state), &format!("/editor/{sid}/per-week"), "per_week=2").await;
        let uri = format!("/editor/{sid}/weekday/mon");
        let (_, body) = post(app(&state), &uri, "per_week=2").await;
        assert!(body.contains("1 weekdays selected but 2 trainings per week are set"));
        assert!(!body.contains("Please fix the error(s)"));

        let uri = format!("/editor/{sid}/submit");
        let form = "date_start=1.+1.+2024&date_end=22.+1.+2024&per_week=2&mon_from=17:00&mon_to=18:00";
        let (_, body) = post(app(&state), &uri, form).await;
        assert!(body.contains("field-error-message reported"));
        assert!(body.contains("Please fix the error(s) and save again"));
    }

    #[tokio::test]
    async fn test_full_create_flow() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        post(app(&state), &format!("/editor/{sid}/weekday/mon"), "").await;
        let (status, _) = post(
            app(&state),
            &format!("/editor/{sid}/occurrence/2024-01-15"),
            "",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post(
            app(&state),
            &format!("/editor/{sid}/submit"),
            "name=Seniors&date_start=1.+1.+2024&date_end=22.+1.+2024&mon_from=17:00&mon_to=18:30",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"location.href = "/trainings/1""#));

        let (status, body) = get(app(&state), "/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Seniors"));
        assert!(body.contains("Sessions (3)"));
        assert!(!body.contains("15. 1. 2024"));

        let (_, body) = get(app(&state), "/").await;
        assert!(body.contains(r#"href="/trainings/1/edit""#));
    }

    #[tokio::test]
    async fn test_rejected_submit_rerenders_editor() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        let (status, body) = post(
            app(&state),
            &format!("/editor/{sid}/submit"),
            "name=&date_start=1.+1.+2024&date_end=22.+1.+2024",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No weekday is selected"));
        assert!(body.contains("Please fix the error(s)"));
        assert_eq!(state.registry.lock().await.trainings().count(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        let (status, _) = post(app(&state), &format!("/editor/{sid}/close"), "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post(app(&state), &format!("/editor/{sid}/close"), "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post(app(&state), &format!("/editor/{sid}/weekday/mon"), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_paths() {
        let state = AppState::new(EditorSettings::default());
        let sid = open(&state).await;

        let (status, _) = post(app(&state), &format!("/editor/{sid}/weekday/xyz"), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = post(app(&state), &format!("/editor/{sid}/occurrence/soon"), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get(app(&state), "/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(app(&state), "/99/edit").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_page_prefills_saved_training() {
        let state = AppState::new(EditorSettings::default());
        {
            let mut registry = state.registry.lock().await;
            let sid = registry.open_create(&state.settings, "c1", january());
            registry
                .with_editor(sid, |editor, store| {
                    editor.set_name("Juniors");
                    editor.on_weekday_toggled(store, Weekday::Thursday);
                    editor.on_time_field_changed(Weekday::Thursday, "09:00", "10:00");
                    editor.on_occurrence_toggled(store, DateKey(date(2024, 1, 11)));
                })
                .unwrap();
            registry.submit(sid).unwrap().unwrap();
        }

        let (status, body) = get(app(&state), "/1/edit").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Edit Training: Juniors"));
        assert!(body.contains(r#"value="09:00""#));
        assert!(body.contains(r#"id="occurrence-2024-01-04" name="occurrence_2024-01-04" checked"#));
        assert!(!body.contains(r#"id="occurrence-2024-01-11" name="occurrence_2024-01-11" checked"#));
    }
}
