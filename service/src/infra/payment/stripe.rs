//! [Stripe] implementation of the payment [`Gateway`].
//!
//! [Stripe]: https://stripe.com

use std::time::Duration;

use common::{DateTime, Money};
use derive_more::{Debug, Display, Error as StdError, From};
use hmac::{Hmac, Mac as _};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracerr::Traced;

use crate::domain::{transaction, user};

use super::{CheckoutUrl, Error, Event, Gateway, Session};

/// Configuration of a [`Stripe`] client.
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret API key.
    #[debug(skip)]
    pub secret_key: SecretString,

    /// Shared secret for webhook signature verification.
    #[debug(skip)]
    pub webhook_secret: SecretString,

    /// Base URL of the [Stripe] API.
    ///
    /// [Stripe]: https://stripe.com
    pub api_base: String,

    /// URL the payer is redirected to after a successful checkout.
    pub success_url: String,

    /// URL the payer is redirected to after an abandoned checkout.
    pub cancel_url: String,

    /// Timeout of outgoing API requests.
    pub timeout: Duration,

    /// Maximum accepted age of a webhook event signature.
    pub webhook_tolerance: Duration,
}

/// [Stripe] payment [`Gateway`] client.
///
/// [Stripe]: https://stripe.com
#[derive(Clone, Debug)]
pub struct Stripe {
    /// HTTP client to perform API requests with.
    http: reqwest::Client,

    /// [`Config`] of this client.
    config: Config,
}

impl Stripe {
    /// Creates a new [`Stripe`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the underlying HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()
            .map_err(tracerr::from_and_wrap!())?;
        Ok(Self { http, config })
    }

    /// Verifies a webhook `payload` against its `Stripe-Signature` header.
    ///
    /// The signature scheme is `t={timestamp},v1={hex(hmac_sha256)}` where
    /// the MAC is computed over `"{timestamp}.{payload}"` with the shared
    /// webhook secret. Events older than the configured tolerance are
    /// rejected to prevent replay.
    ///
    /// # Errors
    ///
    /// If the header is malformed, the event is too old, or the signature
    /// doesn't match.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), Traced<SignatureError>> {
        use SignatureError as E;

        let mut timestamp = None;
        let mut signature = None;
        for part in signature_header.split(',') {
            match part.split_once('=') {
                Some(("t", v)) => timestamp = Some(v),
                Some(("v1", v)) => signature = Some(v),
                Some(_) | None => {}
            }
        }
        let timestamp = timestamp.ok_or(E::MissingTimestamp)
            .map_err(tracerr::wrap!())?;
        let signature = signature.ok_or(E::MissingSignature)
            .map_err(tracerr::wrap!())?;

        let issued = timestamp
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_unix_timestamp)
            .ok_or(E::Malformed)
            .map_err(tracerr::wrap!())?;
        if issued < DateTime::now() - self.config.webhook_tolerance {
            return Err(tracerr::new!(E::Stale));
        }

        let signature =
            hex::decode(signature).map_err(|_| tracerr::new!(E::Malformed))?;

        let mut mac = Hmac::<Sha256>::new_from_slice(
            self.config.webhook_secret.expose_secret().as_bytes(),
        )
        .map_err(|_| tracerr::new!(E::Malformed))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&signature)
            .map_err(|_| tracerr::new!(E::Mismatch))
    }

    /// Decodes a verified webhook `payload` into an [`Event`].
    ///
    /// # Errors
    ///
    /// If the payload is not valid JSON or carries an unsupported event
    /// type.
    pub fn decode_event(
        &self,
        payload: &[u8],
    ) -> Result<Event, Traced<DecodeError>> {
        use DecodeError as E;

        let wire: WireEvent = serde_json::from_slice(payload)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let kind = super::event::Kind::from_wire(&wire.kind)
            .ok_or_else(|| E::UnsupportedKind(wire.kind.clone()))
            .map_err(tracerr::wrap!())?;

        Ok(Event {
            id: transaction::EventId::from(wire.id),
            kind,
            session_id: transaction::Id::new(wire.data.object.id),
        })
    }
}

impl Gateway for Stripe {
    async fn create_one_time_session(
        &self,
        product_name: &str,
        price: Money,
        payer_email: &user::Email,
    ) -> Result<Session, Traced<Error>> {
        let params = [
            ("mode", "payment".to_owned()),
            ("customer_email", payer_email.to_string()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]",
                price.currency.code().to_owned(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                price.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                product_name.to_owned(),
            ),
            ("line_items[0][quantity]", "1".to_owned()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .basic_auth(self.config.secret_key.expose_secret(), None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(tracerr::new!(Error::BadResponse(format!(
                "HTTP {status}: {body}",
            ))));
        }

        let session: WireSession =
            response.json().await.map_err(tracerr::from_and_wrap!())?;
        let url = session
            .url
            .ok_or_else(|| {
                Error::BadResponse("checkout session has no URL".to_owned())
            })
            .map_err(tracerr::wrap!())?;

        Ok(Session {
            id: transaction::Id::new(session.id),
            checkout_url: CheckoutUrl::from(url),
        })
    }
}

/// Checkout session representation on the wire.
#[derive(Debug, Deserialize)]
struct WireSession {
    /// Session identifier.
    id: String,

    /// Hosted checkout page URL.
    url: Option<String>,
}

/// Webhook event representation on the wire.
#[derive(Debug, Deserialize)]
struct WireEvent {
    /// Event identifier.
    id: String,

    /// Event type name.
    #[serde(rename = "type")]
    kind: String,

    /// Event payload.
    data: WireEventData,
}

/// Payload of a [`WireEvent`].
#[derive(Debug, Deserialize)]
struct WireEventData {
    /// Object the event reports about.
    object: WireEventObject,
}

/// Object a [`WireEvent`] reports about.
#[derive(Debug, Deserialize)]
struct WireEventObject {
    /// Checkout session identifier.
    id: String,
}

/// Error of verifying a webhook signature.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum SignatureError {
    /// Signature header carries no `t=` timestamp.
    #[display("signature header carries no timestamp")]
    MissingTimestamp,

    /// Signature header carries no `v1=` signature.
    #[display("signature header carries no signature")]
    MissingSignature,

    /// Signature header cannot be parsed.
    #[display("malformed signature header")]
    Malformed,

    /// Event is older than the accepted tolerance.
    #[display("event is too old")]
    Stale,

    /// Signature doesn't match the payload.
    #[display("signature mismatch")]
    Mismatch,
}

/// Error of decoding a webhook payload.
#[derive(Debug, Display, From, StdError)]
pub enum DecodeError {
    /// Payload is not a valid JSON event.
    #[display("invalid event payload: {_0}")]
    Json(serde_json::Error),

    /// Event type is not supported.
    #[display("unsupported event type: {_0}")]
    UnsupportedKind(#[error(not(source))] String),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use hmac::{Hmac, Mac as _};
    use sha2::Sha256;

    use super::{Config, SignatureError, Stripe};

    const WEBHOOK_SECRET: &str = "whsec_test123secret456";

    fn client() -> Stripe {
        Stripe::new(Config {
            secret_key: "sk_test_xxx".to_owned().into(),
            webhook_secret: WEBHOOK_SECRET.to_owned().into(),
            api_base: "https://api.stripe.com".to_owned(),
            success_url: "https://dorm.test/success".to_owned(),
            cancel_url: "https://dorm.test/cancel".to_owned(),
            timeout: Duration::from_secs(15),
            webhook_tolerance: Duration::from_secs(300),
        })
        .unwrap()
    }

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn now() -> i64 {
        common::DateTime::now().unix_timestamp()
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let t = now();
        let header = format!("t={t},v1={}", sign(payload, WEBHOOK_SECRET, t));

        assert!(client().verify_webhook_signature(payload, &header).is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let t = now();
        let header = format!("t={t},v1={}", sign(payload, "wrong_secret", t));

        assert!(matches!(
            client()
                .verify_webhook_signature(payload, &header)
                .unwrap_err()
                .as_ref(),
            SignatureError::Mismatch,
        ));
    }

    #[test]
    fn rejects_modified_payload() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let tampered =
            br#"{"type":"checkout.session.completed","hacked":true}"#;
        let t = now();
        let header = format!("t={t},v1={}", sign(payload, WEBHOOK_SECRET, t));

        assert!(matches!(
            client()
                .verify_webhook_signature(tampered, &header)
                .unwrap_err()
                .as_ref(),
            SignatureError::Mismatch,
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let t = now() - 600;
        let header = format!("t={t},v1={}", sign(payload, WEBHOOK_SECRET, t));

        assert!(matches!(
            client()
                .verify_webhook_signature(payload, &header)
                .unwrap_err()
                .as_ref(),
            SignatureError::Stale,
        ));
    }

    #[test]
    fn rejects_incomplete_header() {
        let payload = br#"{}"#;

        assert!(matches!(
            client()
                .verify_webhook_signature(payload, "v1=deadbeef")
                .unwrap_err()
                .as_ref(),
            SignatureError::MissingTimestamp,
        ));
        assert!(matches!(
            client()
                .verify_webhook_signature(payload, "t=1234567890")
                .unwrap_err()
                .as_ref(),
            SignatureError::MissingSignature,
        ));
        assert!(matches!(
            client()
                .verify_webhook_signature(payload, "garbage")
                .unwrap_err()
                .as_ref(),
            SignatureError::MissingTimestamp,
        ));
    }

    #[test]
    fn decodes_events() {
        let payload = br#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_1"}}
        }"#;

        let event = client().decode_event(payload).unwrap();
        assert_eq!(event.id.to_string(), "evt_1");
        assert_eq!(
            event.kind,
            crate::infra::payment::event::Kind::SessionCompleted,
        );
        assert_eq!(event.session_id.to_string(), "cs_test_1");
    }

    #[test]
    fn rejects_unsupported_event_kind() {
        let payload = br#"{
            "id": "evt_2",
            "type": "invoice.created",
            "data": {"object": {"id": "in_1"}}
        }"#;

        assert!(client().decode_event(payload).is_err());
    }
}
