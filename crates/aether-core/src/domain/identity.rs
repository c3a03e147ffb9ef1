//! Per-actor identity records stamped onto every outbound envelope.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of random bytes in an identity token.
pub const TOKEN_BYTES: usize = 32;

/// Role tag of the actor publishing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Vital-sign simulator / sensor feed.
    BioDriver,
    /// Voice intent processing.
    IntentCore,
    /// Transport gateway.
    Gateway,
    /// Cognitive transforms.
    Cognitive,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::BioDriver => "BIO_DRIVER",
            Role::IntentCore => "INTENT_CORE",
            Role::Gateway => "GATEWAY",
            Role::Cognitive => "COGNITIVE",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity attached to an envelope as `params._identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHeader {
    pub source_id: String,
    pub role: Role,
    /// Hex-encoded random secret. Never empty.
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl IdentityHeader {
    /// Short SHA-256 fingerprint of the token, safe to log.
    pub fn token_fingerprint(&self) -> String {
        fingerprint(&self.token)
    }
}

fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug)]
struct Credentials {
    token: String,
    issued_at: DateTime<Utc>,
}

/// Issues identity headers for one actor instance.
///
/// `source_id` is stable for the lifetime of the stamper; the token rotates
/// on [`IdentityStamper::refresh_token`].
#[derive(Debug)]
pub struct IdentityStamper {
    source_id: String,
    role: Role,
    credentials: RwLock<Credentials>,
}

impl IdentityStamper {
    pub fn new(role: Role) -> Self {
        let source_id = format!("{}-{}", role.as_str().to_lowercase(), uuid::Uuid::new_v4());
        Self::with_source_id(role, source_id)
    }

    /// Create a stamper with a caller-chosen stable source id.
    pub fn with_source_id(role: Role, source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            role,
            credentials: RwLock::new(Credentials {
                token: generate_token(),
                issued_at: Utc::now(),
            }),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Current identity header (a copy).
    pub fn header(&self) -> IdentityHeader {
        let creds = self
            .credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        IdentityHeader {
            source_id: self.source_id.clone(),
            role: self.role,
            token: creds.token.clone(),
            issued_at: creds.issued_at,
        }
    }

    /// Replace the token with a fresh random secret.
    pub fn refresh_token(&self) -> IdentityHeader {
        {
            let mut creds = self
                .credentials
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            creds.token = generate_token();
            creds.issued_at = Utc::now();
            tracing::debug!(
                source_id = %self.source_id,
                fingerprint = %fingerprint(&creds.token),
                "identity token rotated"
            );
        }
        self.header()
    }
}
