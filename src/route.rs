//! Client routes and share-link parsing.

use std::fmt;

/// A page of the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`, the create page.
    Create,
    /// `/secret/{token}`
    Secret(String),
    /// `/maintainance`
    Maintenance,
    /// `/not-found`, also where unknown paths redirect.
    NotFound,
}

impl Route {
    /// Resolve a path (or full URL) to a route. Unknown paths redirect to `NotFound`.
    pub fn parse(input: &str) -> Route {
        let path = strip_origin(input.trim());
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Create,
            ["secret", token] => Route::Secret((*token).to_string()),
            ["maintainance"] => Route::Maintenance,
            _ => Route::NotFound,
        }
    }

    /// Absolute link to this route under the UI base URL.
    pub fn link(&self, ui_url: &str) -> String {
        format!("{}{}", ui_url.trim_end_matches('/'), self)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Create => write!(f, "/"),
            Route::Secret(token) => write!(f, "/secret/{token}"),
            Route::Maintenance => write!(f, "/maintainance"),
            Route::NotFound => write!(f, "/not-found"),
        }
    }
}

fn strip_origin(input: &str) -> &str {
    match input.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => input,
    }
}

/// Accept either a bare token or a share link and return the token.
pub fn token_from_link(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if !input.contains('/') {
        return Some(input.to_string());
    }
    match Route::parse(input) {
        Route::Secret(token) => Some(token),
        _ => None,
    }
}
