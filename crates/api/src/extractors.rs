//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};
use foundry_shared::types::ListQuery;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// Like `axum::Json<T>`, but runs `validator::Validate` on the body.
///
/// Malformed JSON and failed validation both become a 400 `validation` error.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    messages.sort();

    if messages.is_empty() {
        "Validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;

        value
            .validate()
            .map_err(|errors| ApiError::validation(describe(&errors)))?;

        Ok(Self(value))
    }
}

/// JSON body without field rules; a malformed body is a 400 `validation` error.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string parameters; a malformed string is a 400 `validation` error.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::try_from_uri(&parts.uri)
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// The list envelope, with `limit` bounds already checked.
#[derive(Debug, Clone)]
pub struct Page(pub ListQuery);

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiQuery(query) = ApiQuery::<ListQuery>::from_request_parts(parts, state).await?;
        query.validate()?;
        Ok(Self(query))
    }
}

/// Where a request came from, for the activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client address from `X-Forwarded-For` or `X-Real-IP`.
    pub ip: Option<String>,
    /// Raw `User-Agent`.
    pub user_agent: Option<String>,
    /// Operating system guessed from the user agent.
    pub os: Option<String>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Guesses the operating system from a `User-Agent`.
#[must_use]
pub fn detect_os(user_agent: &str) -> Option<&'static str> {
    const KNOWN: &[(&str, &str)] = &[
        ("Windows", "Windows"),
        ("Android", "Android"),
        ("iPhone", "iOS"),
        ("iPad", "iOS"),
        ("Mac OS X", "macOS"),
        ("Macintosh", "macOS"),
        ("CrOS", "ChromeOS"),
        ("Linux", "Linux"),
    ];
    KNOWN
        .iter()
        .find(|(needle, _)| user_agent.contains(needle))
        .map(|(_, os)| *os)
}

impl ClientInfo {
    /// Reads client details from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = header(headers, "x-forwarded-for")
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .or_else(|| header(headers, "x-real-ip"))
            .map(ToString::to_string);
        let user_agent = header(headers, USER_AGENT.as_str()).map(ToString::to_string);
        let os = user_agent
            .as_deref()
            .and_then(detect_os)
            .map(ToString::to_string);

        Self { ip, user_agent, os }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
