//! Line-delimited envelope transport.
//!
//! Each envelope is validated before it leaves the process; invalid ones are
//! dropped and reported as rejected deliveries.

use aether_core::{validate_message, DeliveryError, Subscriber};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

pub struct LineSubscriber<W> {
    name: String,
    writer: Mutex<W>,
}

impl<W> LineSubscriber<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> Subscriber for LineSubscriber<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let verdict = validate_message(message);
        if !verdict.passed {
            warn!(subscriber = %self.name, reason = verdict.reason, "blocked outgoing envelope");
            return Err(DeliveryError::Rejected(verdict.reason.to_string()));
        }

        let mut writer = self.writer.lock().await;
        let io = |e: std::io::Error| DeliveryError::Transport(e.to_string());
        writer.write_all(message.as_bytes()).await.map_err(io)?;
        writer.write_all(b"\n").await.map_err(io)?;
        writer.flush().await.map_err(io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::{Envelope, IdentityStamper, Role};
    use serde_json::json;

    fn envelope(energy_level: f64) -> String {
        let identity = IdentityStamper::new(Role::Gateway).header();
        let arguments = json!({ "energy_level": energy_level });
        let envelope = Envelope::new("render_light", arguments, identity);
        serde_json::to_string(&envelope).unwrap()
    }

    #[tokio::test]
    async fn writes_valid_envelopes_as_lines() {
        let subscriber = LineSubscriber::new("stdout", Vec::new());
        subscriber.deliver(&envelope(0.5)).await.unwrap();
        subscriber.deliver(&envelope(1.0)).await.unwrap();

        let written = String::from_utf8(subscriber.into_inner()).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.ends_with('\n'));
    }

    #[tokio::test]
    async fn drops_invalid_envelopes() {
        let subscriber = LineSubscriber::new("stdout", Vec::new());
        let err = subscriber.deliver(&envelope(1.5)).await.unwrap_err();
        assert_eq!(err, DeliveryError::Rejected("OUT_OF_BOUNDS".into()));
        assert!(subscriber.into_inner().is_empty());
    }
}
