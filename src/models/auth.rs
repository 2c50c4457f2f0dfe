// Session claims carried by bearer tokens from the hosted auth service

use serde::{Deserialize, Serialize};

/// Authentication method reference, e.g. `password` or `recovery`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmrEntry {
    pub method: String,
    /// Unix epoch seconds at which the method was used
    pub timestamp: i64,
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Auth user id (subject)
    pub sub: String,

    #[serde(default)]
    pub email: String,

    /// Expires at (Unix epoch seconds)
    pub exp: u64,

    /// Issued at (Unix epoch seconds)
    pub iat: u64,

    pub aud: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub session_id: Option<String>,

    /// How the session was established
    #[serde(default)]
    pub amr: Vec<AmrEntry>,
}

impl SessionClaims {
    /// Timestamp of the password-recovery login that produced this session, if any
    pub fn recovery_at(&self) -> Option<i64> {
        self.amr
            .iter()
            .filter(|entry| entry.method == "recovery")
            .map(|entry| entry.timestamp)
            .max()
    }
}
