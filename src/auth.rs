//! Request-scoped caller identity.
//!
//! Sessions are issued elsewhere (the auth provider is an external
//! collaborator); this service only resolves a bearer token to a caller
//! and a role. Identity is carried explicitly through each operation,
//! never held in ambient state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Roles a caller can hold. Resolved once per request from the users
/// table; everything downstream branches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Owner,
}

impl Role {
    /// Anything that isn't explicitly an owner is a driver.
    pub fn from_str(s: &str) -> Self {
        match s {
            "owner" => Role::Owner,
            _ => Role::Driver,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Owner => "owner",
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Caller identity attached to a request by the session middleware.
/// `None` means the request carried no (valid-format) bearer token;
/// operations that need identity reject with `AuthenticationRequired`.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<Caller>);

impl Identity {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }
}

/// Session tokens are stored hashed; the raw token never touches the
/// database.
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
