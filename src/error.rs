//! Error handling.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::rejection::QueryRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::{event, Level};

/// Errors raised while loading the catalog manifest or a dataset file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Error reading a file
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a file as JSON, or a malformed record
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Dataset file holds no records
    #[error("dataset file {} contains no records", .path.display())]
    Empty { path: PathBuf },

    /// Catalog manifest failed validation
    #[error("catalog manifest is not valid")]
    ManifestInvalid(#[from] validator::ValidationErrors),
}

/// Query service error type
///
/// This type encapsulates the various errors that may occur while serving a request.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Unknown dataset identifier
    #[error("dataset {id} not found")]
    NotFound { id: String },

    /// The dataset is registered but its data could not be loaded
    #[error("failed to load dataset {id}")]
    LoadFailure {
        id: String,
        #[source]
        source: Arc<LoadError>,
    },

    /// Error extracting query parameters
    #[error("request parameters are not valid")]
    RequestQueryRejection(#[from] QueryRejection),

    /// Error validating query parameters
    #[error("request parameters are not valid")]
    RequestValidation(#[from] validator::ValidationErrors),

    /// No route for the requested path
    #[error("endpoint {path} not found")]
    EndpointNotFound { path: String },
}

impl IntoResponse for DatasetError {
    /// Convert from a `DatasetError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Classification of a failed per-dataset query in a comparison.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown dataset identifier
    NotFound,
    /// The dataset could not be loaded
    LoadFailure,
    /// The query could not be completed: transport error, timeout, bad response or task failure
    QueryFailure,
}

/// A failed per-dataset query in a comparison.
///
/// Unlike [DatasetError] this is a plain value that can be cloned into state snapshots and sent
/// to clients.
#[derive(Clone, Debug, Deserialize, Error, PartialEq, Serialize)]
#[error("{kind} for dataset {id}: {message}")]
pub struct QueryError {
    /// Dataset identifier
    pub id: String,
    /// Error classification
    pub kind: ErrorKind,
    /// Human readable description, including causes
    pub message: String,
}

impl QueryError {
    /// Return a new QueryError.
    pub fn new(id: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
        }
    }

    /// Return a [ErrorKind::QueryFailure] error.
    pub fn query_failure(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, ErrorKind::QueryFailure, message)
    }
}

impl From<DatasetError> for QueryError {
    fn from(error: DatasetError) -> Self {
        let (id, kind) = match &error {
            DatasetError::NotFound { id } => (id.clone(), ErrorKind::NotFound),
            DatasetError::LoadFailure { id, source: _ } => (id.clone(), ErrorKind::LoadFailure),
            DatasetError::RequestQueryRejection(_)
            | DatasetError::RequestValidation(_)
            | DatasetError::EndpointNotFound { path: _ } => {
                (String::new(), ErrorKind::QueryFailure)
            }
        };
        Self::new(id, kind, error_chain(&error).join(": "))
    }
}

/// Returns the message of an error followed by the messages of its causes.
///
/// A cause is skipped if the message before it already ends with it.
pub fn error_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        let message = source.to_string();
        if !messages.iter().any(|previous| previous.ends_with(&message)) {
            messages.push(message);
        }
        current = source.source();
    }
    messages
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut messages = error_chain(error);
        let message = messages.remove(0);
        let caused_by = (!messages.is_empty()).then_some(messages);
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }
}

impl From<DatasetError> for ErrorResponse {
    /// Convert from a `DatasetError` into an `ErrorResponse`.
    fn from(error: DatasetError) -> Self {
        let status = match &error {
            // Bad request
            DatasetError::RequestQueryRejection(_) | DatasetError::RequestValidation(_) => {
                StatusCode::BAD_REQUEST
            }

            // Not found
            DatasetError::NotFound { id: _ } | DatasetError::EndpointNotFound { path: _ } => {
                StatusCode::NOT_FOUND
            }

            // Internal server error
            DatasetError::LoadFailure { id: _, source: _ } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let response = Self::new(status, &error);

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
