//! Startup registration of the documentation routes.
//!
//! [`boot`] builds the document for a set of controller classes and mounts
//! two GET routes on a [`DocsRouter`]: one returning the document as JSON
//! and one returning a Swagger UI page that loads it. The HTTP server itself
//! stays behind the trait; [`InMemoryRouter`] is enough for the command line
//! and for tests.

use crate::config::DocsConfig;
use crate::document_builder::{Document, DocumentBuilder};
use crate::error::Result;
use crate::facts::{FactStore, HttpMethod};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Body returned by a documentation route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content_type: &'static str,
    pub body: Arc<str>,
}

/// Handler of a documentation route
pub type Handler = Box<dyn Fn() -> Reply + Send + Sync>;

/// Anything documentation routes can be mounted on
pub trait DocsRouter {
    fn bind(&mut self, method: HttpMethod, path: &str, handler: Handler);
}

/// Route table keyed by verb and path
#[derive(Default)]
pub struct InMemoryRouter {
    routes: BTreeMap<(HttpMethod, String), Handler>,
}

impl InMemoryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the handler bound to `method` and `path`, if any
    pub fn dispatch(&self, method: HttpMethod, path: &str) -> Option<Reply> {
        self.routes
            .get(&(method, path.to_string()))
            .map(|handler| handler())
    }

    /// Bound routes, ordered by verb then path
    pub fn routes(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.routes.keys().map(|(method, path)| (*method, path.as_str()))
    }
}

impl DocsRouter for InMemoryRouter {
    fn bind(&mut self, method: HttpMethod, path: &str, handler: Handler) {
        debug!("Binding {} {}", method, path);
        self.routes.insert((method, path.to_string()), handler);
    }
}

/// Swagger UI page pointing at the document route
pub struct DocsUi<'a> {
    pub title: &'a str,
    pub url: &'a str,
}

impl DocsUi<'_> {
    pub const CONTENT_TYPE: &'static str = "text/html; charset=utf-8";

    /// Render the page. The top bar is hidden.
    pub fn render(&self) -> String {
        // JSON string literals are valid JavaScript string literals
        let url = serde_json::Value::from(self.url).to_string();
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
    <style>.swagger-ui .topbar {{ display: none; }}</style>
</head>
<body style="margin: 0; padding: 0;">
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {{
            window.ui = SwaggerUIBundle({{
                url: {url},
                dom_id: "#swagger-ui",
                deepLinking: true,
                presets: [SwaggerUIBundle.presets.apis],
                layout: "BaseLayout"
            }});
        }};
    </script>
</body>
</html>
"##,
            title = escape_html(self.title),
            url = url.replace("</", "<\\/"),
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Build the document for `controllers` and mount the documentation routes.
///
/// Returns `Ok(None)` without touching the router when the configuration is
/// disabled. The document is serialized once; the JSON route hands out the
/// shared rendering.
pub fn boot<S, R>(
    config: &DocsConfig,
    facts: &S,
    controllers: &[&str],
    router: &mut R,
) -> Result<Option<Document>>
where
    S: FactStore + ?Sized,
    R: DocsRouter + ?Sized,
{
    if !config.enable {
        info!("API documentation is disabled");
        return Ok(None);
    }

    let mut builder = DocumentBuilder::new(facts)
        .with_host(config.host.clone())
        .with_info(
            config.title.clone(),
            config.version.clone(),
            config.description.clone(),
        );
    for controller in controllers {
        builder.register(controller);
    }
    if !builder.fallbacks().is_empty() {
        warn!(
            "{} type reference(s) documented as generic objects",
            builder.fallbacks().len()
        );
    }
    let document = builder.build();

    let json: Arc<str> = serde_json::to_string(&document)?.into();
    router.bind(
        HttpMethod::Get,
        &config.api_json,
        Box::new(move || Reply {
            content_type: "application/json",
            body: Arc::clone(&json),
        }),
    );

    let page: Arc<str> = DocsUi {
        title: config.title.as_deref().unwrap_or("API Documentation"),
        url: &config.api_json,
    }
    .render()
    .into();
    router.bind(
        HttpMethod::Get,
        &config.index_page,
        Box::new(move || Reply {
            content_type: DocsUi::CONTENT_TYPE,
            body: Arc::clone(&page),
        }),
    );

    info!(
        "API documentation mounted at {} ({} paths, {} definitions)",
        config.index_page,
        document.paths.len(),
        document.definitions.len()
    );
    Ok(Some(document))
}
