use axum::{
    Json, RequestExt,
    extract::{FromRequest, Query, Request},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use headers::{ContentType, HeaderMapExt};
use mime::Mime;
use serde::Deserialize;

use crate::RegistryError;
use crate::db::BasicCredentials;

pub const DEFAULT_FULL_NAME: &str = "John Doe";
pub const DEFAULT_AGE: i64 = 21;
pub const MIN_AGE: i64 = 18;

/// A validated request to register one client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub full_name: String,
    pub age: i64,
    pub credentials: Option<BasicCredentials>,
}

/// Query-string form: `POST /?fullName=..&age=..`. Lenient; bad input falls
/// back to defaults instead of being rejected.
#[derive(Debug, Default, Deserialize)]
pub struct CreateClientQuery {
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub age: Option<String>,
}

impl CreateClientQuery {
    pub fn into_new_client(self) -> NewClient {
        let full_name = self
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FULL_NAME.to_string());

        let age = self
            .age
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|age| *age >= MIN_AGE)
            .unwrap_or(DEFAULT_AGE);

        NewClient {
            full_name,
            age,
            credentials: None,
        }
    }
}

/// JSON body form. Strict; violations are rejected with 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientBody {
    pub full_name: String,
    pub age: i64,
    #[serde(default)]
    pub credentials: Option<BasicCredentials>,
}

impl CreateClientBody {
    pub fn validate(self) -> Result<NewClient, RegistryError> {
        if self.full_name.trim().is_empty() {
            return Err(RegistryError::validation("fullName must not be empty"));
        }
        if self.age < MIN_AGE {
            return Err(RegistryError::validation(format!(
                "age must be at least {MIN_AGE}"
            )));
        }
        if let Some(creds) = &self.credentials
            && (creds.email.trim().is_empty() || creds.password.is_empty())
        {
            return Err(RegistryError::validation(
                "credentials require both email and password",
            ));
        }

        Ok(NewClient {
            full_name: self.full_name,
            age: self.age,
            credentials: self.credentials,
        })
    }
}

/// `application/json` or any `application/*+json`, parameters ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(ct) = headers.typed_get::<ContentType>() else {
        return false;
    };
    let mime: Mime = ct.into();
    mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix().is_some_and(|s| s == mime::JSON))
}

/// Picks the JSON form when the request declares a JSON body, the query form
/// otherwise.
pub struct ClientPreprocess(pub NewClient);

impl<S> FromRequest<S> for ClientPreprocess
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(mut req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !is_json_content_type(req.headers()) {
            let Query(query) = match req.extract_parts::<Query<CreateClientQuery>>().await {
                Ok(q) => q,
                Err(rejection) => return Err(rejection.into_response()),
            };
            return Ok(ClientPreprocess(query.into_new_client()));
        }

        // malformed bodies are validation failures too
        let Json(body) = match Json::<CreateClientBody>::from_request(req, &()).await {
            Ok(v) => v,
            Err(rejection) => {
                return Err(RegistryError::validation(rejection.body_text()).into_response());
            }
        };

        body.validate()
            .map(ClientPreprocess)
            .map_err(IntoResponse::into_response)
    }
}
