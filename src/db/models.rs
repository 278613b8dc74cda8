use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered client, optionally carrying its credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub full_name: String,
    pub age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Login material owned by exactly one client. Keys are internal and stay
/// out of the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Credentials {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub client_id: Option<i64>,
    pub email: String,
    pub password: String,
}

/// Email/password pair supplied when creating a client.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
