//! The server-rendered post page.
//!
//! Each request performs one upstream fetch and renders the result straight
//! into markup. Nothing is kept between requests.

use askama::Template;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use common::posts::PostSource;
use common::types::Post;
use tracing::info;

use crate::errors::PageError;
use crate::observability;
use crate::state::AppState;

/// `GET /ssr`
pub async fn ssr_page(State(state): State<AppState>) -> Result<Response, PageError> {
    let markup = render(state.posts.as_ref(), &state.heading).await?;
    Ok(([(header::CACHE_CONTROL, "no-store")], Html(markup)).into_response())
}

/// Fetch the post and render the page document.
pub async fn render(source: &dyn PostSource, heading: &str) -> Result<String, PageError> {
    observability::PAGE_RENDERS_TOTAL.inc();
    info!("Fetching data from API on the server...");

    let post = {
        let _timer = observability::UPSTREAM_FETCH_DURATION.start_timer();
        observability::UPSTREAM_FETCHES_TOTAL.inc();
        source.fetch_post().await
    };
    let post = post.map_err(|e| {
        observability::PAGE_RENDER_FAILURES_TOTAL.inc();
        PageError::from(e)
    })?;

    render_document(heading, &post)
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    heading: &'a str,
    title: &'a str,
    body: &'a str,
}

pub fn render_document(heading: &str, post: &Post) -> Result<String, PageError> {
    let template = PageTemplate { heading, title: &post.title, body: &post.body };
    Ok(template.render()?)
}
