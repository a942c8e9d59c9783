// Web views - read-only HTML pages over the storage engine
//
// Page bodies are produced by plain functions over `&dyn Storage` so they can
// be tested without a server. The axum router (feature `server`) wraps each
// render in a storage session: reload before reading, close after.

use crate::entities::State;
use crate::error::Result;
use crate::storage::{relations, Storage};

/// Minimal HTML escaping for text nodes and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<HTML lang=\"en\">\n<HEAD>\n<TITLE>HBNB</TITLE>\n</HEAD>\n<BODY>\n{}</BODY>\n</HTML>\n",
        body
    )
}

/// `<LI>id: <B>name</B></LI>` entry used by every listing page.
fn list_item(id: &str, name: &str, nested: &str) -> String {
    format!(
        "<LI>{}: <B>{}</B>{}</LI>\n",
        escape(id),
        escape(name),
        nested
    )
}

// ============================================================================
// TEXT ROUTES
// ============================================================================

pub fn render_c(text: &str) -> String {
    format!("C {}", escape(&text.replace('_', " ")))
}

pub fn render_python(text: Option<&str>) -> String {
    let text = text.unwrap_or("is cool");
    format!("Python {}", escape(&text.replace('_', " ")))
}

pub fn render_number(n: i64) -> String {
    format!("{} is a number", n)
}

pub fn render_number_template(n: i64) -> String {
    page(&format!("<H1>Number: {}</H1>\n", n))
}

pub fn render_number_odd_or_even(n: i64) -> String {
    let parity = if n % 2 == 0 { "even" } else { "odd" };
    page(&format!("<H1>Number: {} is {}</H1>\n", n, parity))
}

// ============================================================================
// STORAGE ROUTES
// ============================================================================

pub fn render_states_list(storage: &dyn Storage) -> Result<String> {
    let items: String = relations::sorted_states(storage)?
        .iter()
        .map(|state| list_item(&state.base.id, state.display_name(), ""))
        .collect();
    Ok(page(&format!("<H1>States</H1>\n<UL>\n{}</UL>\n", items)))
}

fn cities_list(storage: &dyn Storage, state: &State) -> Result<String> {
    let items: String = relations::state_cities(storage, state)?
        .iter()
        .map(|city| list_item(&city.base.id, &city.name, ""))
        .collect();
    Ok(format!("\n<UL>\n{}</UL>\n", items))
}

pub fn render_cities_by_states(storage: &dyn Storage) -> Result<String> {
    let mut items = String::new();
    for state in relations::sorted_states(storage)? {
        let cities = cities_list(storage, &state)?;
        items.push_str(&list_item(&state.base.id, state.display_name(), &cities));
    }
    Ok(page(&format!("<H1>States</H1>\n<UL>\n{}</UL>\n", items)))
}

/// One state with its cities, or `Not found!` for an unknown id.
pub fn render_state(storage: &dyn Storage, id: &str) -> Result<String> {
    let state = relations::sorted_states(storage)?
        .into_iter()
        .find(|state| state.base.id == id);

    let Some(state) = state else {
        return Ok(page("<H1>Not found!</H1>\n"));
    };

    let cities = cities_list(storage, &state)?;
    Ok(page(&format!(
        "<H1>State: {}</H1>\n<H3>Cities:</H3>{}",
        escape(state.display_name()),
        cities
    )))
}

pub fn render_hbnb_filters(storage: &dyn Storage) -> Result<String> {
    let mut states = String::new();
    for state in relations::sorted_states(storage)? {
        let cities: String = relations::state_cities(storage, &state)?
            .iter()
            .map(|city| format!("<li>{}</li>\n", escape(&city.name)))
            .collect();
        states.push_str(&format!(
            "<li><h2>{}</h2>\n<ul>\n{}</ul>\n</li>\n",
            escape(state.display_name()),
            cities
        ));
    }

    let amenities: String = relations::sorted_amenities(storage)?
        .iter()
        .map(|amenity| format!("<li>{}</li>\n", escape(amenity.display_name())))
        .collect();

    Ok(page(&format!(
        "<div class=\"filters\">\n<div class=\"locations\">\n<h3>States</h3>\n<ul class=\"popover\">\n{}</ul>\n</div>\n\
         <div class=\"amenities\">\n<h3>Amenities</h3>\n<ul class=\"popover\">\n{}</ul>\n</div>\n\
         <button>Search</button>\n</div>\n",
        states, amenities
    )))
}

// ============================================================================
// HTTP ROUTER
// ============================================================================

#[cfg(feature = "server")]
pub use server::{router, AppState};

#[cfg(feature = "server")]
mod server {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{Html, IntoResponse, Response},
        routing::get,
        Router,
    };
    use std::sync::{Arc, Mutex};

    use super::{
        render_c, render_cities_by_states, render_hbnb_filters, render_number,
        render_number_odd_or_even, render_number_template, render_python, render_state,
        render_states_list,
    };
    use crate::storage::Storage;

    /// Shared application state
    #[derive(Clone)]
    pub struct AppState {
        storage: Arc<Mutex<Box<dyn Storage>>>,
    }

    impl AppState {
        pub fn new(storage: Box<dyn Storage>) -> Self {
            AppState {
                storage: Arc::new(Mutex::new(storage)),
            }
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(|| async { "Hello HBNB!" }))
            .route("/hbnb", get(|| async { "HBNB" }))
            .route("/c/:text", get(c_route))
            .route("/python", get(python_default))
            .route("/python/:text", get(python_route))
            .route("/number/:n", get(number_route))
            .route("/number_template/:n", get(number_template))
            .route("/number_odd_or_even/:n", get(number_odd_or_even))
            .route("/states_list", get(states_list))
            .route("/cities_by_states", get(cities_by_states))
            .route("/states", get(states_list))
            .route("/states/:id", get(state_by_id))
            .route("/hbnb_filters", get(hbnb_filters))
            .with_state(state)
    }

    /// Run `render` inside a fresh storage session.
    fn with_session<F>(state: &AppState, render: F) -> Response
    where
        F: FnOnce(&dyn Storage) -> crate::error::Result<String>,
    {
        let Ok(mut storage) = state.storage.lock() else {
            tracing::error!("storage lock poisoned");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let rendered = storage.reload().and_then(|_| render(&**storage));
        if let Err(e) = storage.close() {
            tracing::error!(error = %e, "closing storage session");
        }

        match rendered {
            Ok(body) => Html(body).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "rendering page");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    /// Integer path segment; anything else is a 404 like an unmatched route.
    fn parse_number(raw: &str) -> Result<i64, StatusCode> {
        raw.parse().map_err(|_| StatusCode::NOT_FOUND)
    }

    async fn c_route(Path(text): Path<String>) -> Html<String> {
        Html(render_c(&text))
    }

    async fn python_default() -> Html<String> {
        Html(render_python(None))
    }

    async fn python_route(Path(text): Path<String>) -> Html<String> {
        Html(render_python(Some(&text)))
    }

    async fn number_route(Path(raw): Path<String>) -> Result<Html<String>, StatusCode> {
        Ok(Html(render_number(parse_number(&raw)?)))
    }

    async fn number_template(Path(raw): Path<String>) -> Result<Html<String>, StatusCode> {
        Ok(Html(render_number_template(parse_number(&raw)?)))
    }

    async fn number_odd_or_even(Path(raw): Path<String>) -> Result<Html<String>, StatusCode> {
        Ok(Html(render_number_odd_or_even(parse_number(&raw)?)))
    }

    async fn states_list(State(state): State<AppState>) -> Response {
        with_session(&state, render_states_list)
    }

    async fn cities_by_states(State(state): State<AppState>) -> Response {
        with_session(&state, render_cities_by_states)
    }

    async fn state_by_id(State(state): State<AppState>, Path(id): Path<String>) -> Response {
        with_session(&state, |storage| render_state(storage, &id))
    }

    async fn hbnb_filters(State(state): State<AppState>) -> Response {
        with_session(&state, render_hbnb_filters)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::entities::City;
        use crate::storage::FileStorage;
        use axum::body::{to_bytes, Body};
        use axum::http::Request;
        use tempfile::TempDir;
        use tower::ServiceExt;

        async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        fn seeded_app(dir: &TempDir) -> (Router, String) {
            let path = dir.path().join("file.json");
            let mut storage = FileStorage::open(path.clone());
            let texas = crate::entities::State::new("Texas");
            storage.new(City::new("Austin", &texas.base.id).into()).unwrap();
            storage.new(texas.clone().into()).unwrap();
            storage.save().unwrap();

            let mut storage = FileStorage::open(path);
            storage.reload().unwrap();
            (router(AppState::new(Box::new(storage))), texas.base.id)
        }

        #[tokio::test]
        async fn test_text_routes() {
            let dir = TempDir::new().unwrap();
            let (app, _) = seeded_app(&dir);

            assert_eq!(get_body(app.clone(), "/").await.1, "Hello HBNB!");
            assert_eq!(get_body(app.clone(), "/c/is_fun").await.1, "C is fun");
            assert_eq!(get_body(app.clone(), "/python").await.1, "Python is cool");
            assert_eq!(get_body(app.clone(), "/number/7").await.1, "7 is a number");
            assert_eq!(get_body(app.clone(), "/number/x").await.0, StatusCode::NOT_FOUND);
            assert!(get_body(app, "/number_odd_or_even/4").await.1.contains("4 is even"));
        }

        #[tokio::test]
        async fn test_state_pages() {
            let dir = TempDir::new().unwrap();
            let (app, texas_id) = seeded_app(&dir);

            let (status, body) = get_body(app.clone(), "/cities_by_states").await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("<B>Texas</B>"));
            assert!(body.contains("<B>Austin</B>"));

            let (_, body) = get_body(app.clone(), &format!("/states/{}", texas_id)).await;
            assert!(body.contains("<H1>State: Texas</H1>"));

            let (_, body) = get_body(app, "/states/nope").await;
            assert!(body.contains("Not found!"));
        }
    }
}
