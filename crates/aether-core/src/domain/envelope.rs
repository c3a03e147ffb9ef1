//! The standard wrapper placed around every published payload.

use serde::{Deserialize, Serialize};

use super::identity::IdentityHeader;

/// Protocol version stamped on every envelope.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Prefix joining a topic into an envelope method.
pub const METHOD_PREFIX: &str = "tools/";

/// Build the envelope method for a topic.
pub fn method_for(topic: &str) -> String {
    format!("{METHOD_PREFIX}{topic}")
}

/// `{protocol_version, method, params: {name, arguments, _identity}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub protocol_version: String,
    pub method: String,
    pub params: EnvelopeParams<P>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams<P> {
    /// The topic, repeated.
    pub name: String,
    pub arguments: P,
    #[serde(rename = "_identity")]
    pub identity: IdentityHeader,
}

impl<P> Envelope<P> {
    pub fn new(topic: &str, arguments: P, identity: IdentityHeader) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            method: method_for(topic),
            params: EnvelopeParams {
                name: topic.to_string(),
                arguments,
                identity,
            },
        }
    }

    pub fn topic(&self) -> &str {
        &self.params.name
    }
}
