//! Peer-side handshake state machine.
//!
//! Pure logic: the machine consumes relay payloads and returns actions. The
//! driver ([`crate::Client`] in production, plain function calls in tests)
//! performs the I/O.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ register ┌──────────────┐ NO_INTERLOCUTOR ┌────────┐
//! │ Init │─────────>│ Registering  │────────────────>│ Parked │
//! └──────┘          └──────────────┘                 └────────┘
//!                     │          │                    │      │
//!      CLIENT_EXISTS  │          │ INTERLOCUTOR_FOUND │      │ WAIT_TIMEOUT
//!                     ↓          ↓                    │      ↓
//!               ┌──────────┐  ┌────────────┐<─────────┘  ┌──────────┐
//!               │ Rejected │  │ Confirming │             │ TimedOut │
//!               └──────────┘  └────────────┘             └──────────┘
//!                                   │ CHAT_CONFIRMED
//!                                   ↓
//!                             ┌─────────────┐
//!                             │ Established │
//!                             └─────────────┘
//! ```
//!
//! On `INTERLOCUTOR_FOUND` the machine draws a private salt and emits the
//! matching public salt. On `CHAT_CONFIRMED` it checks the partner's salt,
//! derives the session key and forgets the private salt. Only the key leaves
//! the machine.

use bytes::Bytes;
use duet_crypto::{
    DomainParameters, PrivateSalt, SessionKey, compute_shared_secret, derive_key_with_len,
    generate_private_salt, public_salt,
};
use duet_proto::{ControlCodec, ProtocolError, Registration, ServerMessage};
use num_bigint::BigUint;

use crate::error::HandshakeError;

/// Actions returned by the handshake state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Write this payload to the relay
    Send(Bytes),

    /// Parked in the relay's waiting pool; keep reading
    Parked,

    /// Key agreed; switch to encrypted chat
    Established(SessionKey),

    /// Name already taken; the relay closes the connection
    Rejected,

    /// Interlocutor never arrived; the relay closes the connection
    TimedOut,
}

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Registration not sent yet
    Init,
    /// Registration sent, waiting for the relay's verdict
    Registering,
    /// Waiting in the pool for the interlocutor
    Parked,
    /// Public salt sent, waiting for `CHAT_CONFIRMED`
    Confirming,
    /// Key derived
    Established,
    /// Name was taken
    Rejected,
    /// Wait expired
    TimedOut,
}

impl HandshakeState {
    /// Whether the machine accepts no further input.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Established | Self::Rejected | Self::TimedOut)
    }
}

/// Peer-side handshake.
#[derive(Debug)]
pub struct PeerHandshake {
    state: HandshakeState,
    codec: ControlCodec,
    key_len: usize,
    params: Option<DomainParameters>,
    private: Option<PrivateSalt>,
}

impl PeerHandshake {
    /// Create a handshake deriving a `key_len`-byte key.
    pub fn new(codec: ControlCodec, key_len: usize) -> Self {
        Self { state: HandshakeState::Init, codec, key_len, params: None, private: None }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Domain parameters received from the relay, once paired.
    pub fn parameters(&self) -> Option<&DomainParameters> {
        self.params.as_ref()
    }

    /// Build the registration payload and move to `Registering`.
    pub fn register(
        &mut self,
        registration: &Registration,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::Init {
            return Err(HandshakeError::Finished(self.state));
        }
        self.state = HandshakeState::Registering;
        let payload = self.codec.encode_registration(registration);
        Ok(vec![HandshakeAction::Send(Bytes::from(payload))])
    }

    /// Process one payload read from the relay.
    pub fn handle_message(
        &mut self,
        payload: &[u8],
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state.is_finished() {
            return Err(HandshakeError::Finished(self.state));
        }
        let message = self.codec.parse_server_message(payload)?;

        match (self.state, message) {
            (HandshakeState::Registering, ServerMessage::ClientExists) => {
                self.state = HandshakeState::Rejected;
                Ok(vec![HandshakeAction::Rejected])
            },
            (HandshakeState::Registering, ServerMessage::NoInterlocutor) => {
                self.state = HandshakeState::Parked;
                Ok(vec![HandshakeAction::Parked])
            },
            (HandshakeState::Parked, ServerMessage::WaitTimeout) => {
                self.state = HandshakeState::TimedOut;
                Ok(vec![HandshakeAction::TimedOut])
            },
            (
                HandshakeState::Registering | HandshakeState::Parked,
                ServerMessage::InterlocutorFound { p, g },
            ) => self.handle_parameters(&p, &g),
            (HandshakeState::Confirming, ServerMessage::ChatConfirmed { peer_salt }) => {
                self.handle_confirmation(&peer_salt)
            },
            (state, message) => {
                Err(HandshakeError::UnexpectedMessage { state, token: message.token() })
            },
        }
    }

    fn handle_parameters(
        &mut self,
        p: &str,
        g: &str,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        let params = DomainParameters::new(parse_decimal(p, "p")?, parse_decimal(g, "g")?)?;
        let private = generate_private_salt(&params.p)?;
        let public = public_salt(&params.p, &params.g, &private);

        self.params = Some(params);
        self.private = Some(private);
        self.state = HandshakeState::Confirming;

        Ok(vec![HandshakeAction::Send(Bytes::from(public.to_str_radix(10)))])
    }

    fn handle_confirmation(
        &mut self,
        peer_salt: &str,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        let (Some(params), Some(private)) = (self.params.as_ref(), self.private.take()) else {
            return Err(HandshakeError::UnexpectedMessage {
                state: self.state,
                token: duet_proto::control::CHAT_CONFIRMED,
            });
        };

        let peer_public = parse_decimal(peer_salt, "peer_salt")?;
        params.check_public_salt(&peer_public)?;

        let shared = compute_shared_secret(&params.p, &peer_public, &private);
        drop(private);
        let key = derive_key_with_len(&shared, self.key_len)?;

        self.state = HandshakeState::Established;
        Ok(vec![HandshakeAction::Established(key)])
    }
}

fn parse_decimal(value: &str, field: &'static str) -> Result<BigUint, ProtocolError> {
    BigUint::parse_bytes(value.as_bytes(), 10).ok_or(ProtocolError::InvalidInteger { field })
}

#[cfg(test)]
mod tests {
    use duet_crypto::{DhEngine, ParameterStrategy};

    use super::*;

    fn codec() -> ControlCodec {
        ControlCodec::default()
    }

    fn found(params: &DomainParameters) -> Vec<u8> {
        codec()
            .encode_server_message(&ServerMessage::InterlocutorFound {
                p: params.p.to_string(),
                g: params.g.to_string(),
            })
            .into_bytes()
    }

    fn sent(actions: &[HandshakeAction]) -> Bytes {
        match actions {
            [HandshakeAction::Send(payload)] => payload.clone(),
            other => panic!("expected a single send, got {other:?}"),
        }
    }

    fn established(actions: Vec<HandshakeAction>) -> SessionKey {
        match actions.as_slice() {
            [HandshakeAction::Established(key)] => key.clone(),
            other => panic!("expected established, got {other:?}"),
        }
    }

    fn small_params() -> DomainParameters {
        DhEngine::new(128, ParameterStrategy::SafePrime)
            .unwrap()
            .generate_domain_parameters()
            .unwrap()
    }

    #[test]
    fn register_sends_registration() {
        let mut hs = PeerHandshake::new(codec(), 32);
        let actions = hs.register(&Registration::new("alice", "bob")).unwrap();

        assert_eq!(&sent(&actions)[..], b"alice:bob");
        assert_eq!(hs.state(), HandshakeState::Registering);
    }

    #[test]
    fn register_twice_fails() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert!(hs.register(&Registration::new("alice", "bob")).is_err());
    }

    #[test]
    fn client_exists_rejects() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert_eq!(hs.handle_message(b"CLIENT_EXISTS").unwrap(), vec![HandshakeAction::Rejected]);
        assert!(hs.state().is_finished());
        assert_eq!(
            hs.handle_message(b"NO_INTERLOCUTOR"),
            Err(HandshakeError::Finished(HandshakeState::Rejected))
        );
    }

    #[test]
    fn parked_then_timeout() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert_eq!(hs.handle_message(b"NO_INTERLOCUTOR").unwrap(), vec![HandshakeAction::Parked]);
        assert_eq!(
            hs.handle_message(b"INTERLOCUTOR_WAIT_TIMEOUT").unwrap(),
            vec![HandshakeAction::TimedOut]
        );
        assert_eq!(hs.state(), HandshakeState::TimedOut);
    }

    #[test]
    fn timeout_before_parking_is_unexpected() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert!(matches!(
            hs.handle_message(b"INTERLOCUTOR_WAIT_TIMEOUT"),
            Err(HandshakeError::UnexpectedMessage { state: HandshakeState::Registering, .. })
        ));
    }

    #[test]
    fn malformed_parameters_fail() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert!(matches!(
            hs.handle_message(b"INTERLOCUTOR_FOUND:abc:2"),
            Err(HandshakeError::Protocol(_))
        ));
        assert!(matches!(
            hs.handle_message(b"INTERLOCUTOR_FOUND:23"),
            Err(HandshakeError::Protocol(ProtocolError::FieldCount { .. }))
        ));
    }

    #[test]
    fn degenerate_modulus_fails() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert!(matches!(
            hs.handle_message(b"INTERLOCUTOR_FOUND:3:2"),
            Err(HandshakeError::Dh(duet_crypto::DhError::DegenerateModulus))
        ));
    }

    #[test]
    fn both_sides_derive_same_key() {
        let params = small_params();
        let mut alice = PeerHandshake::new(codec(), 32);
        let mut bob = PeerHandshake::new(codec(), 32);
        alice.register(&Registration::new("alice", "bob")).unwrap();
        bob.register(&Registration::new("bob", "alice")).unwrap();

        alice.handle_message(b"NO_INTERLOCUTOR").unwrap();
        let alice_salt = sent(&alice.handle_message(&found(&params)).unwrap());
        let bob_salt = sent(&bob.handle_message(&found(&params)).unwrap());
        assert_eq!(alice.parameters(), Some(&params));

        let c = codec();
        let alice_key = established(alice.handle_message(&c.confirmation(&bob_salt)).unwrap());
        let bob_key = established(bob.handle_message(&c.confirmation(&alice_salt)).unwrap());

        assert_eq!(alice_key, bob_key);
        assert_eq!(alice_key.len(), 32);
        assert_eq!(alice.state(), HandshakeState::Established);
    }

    #[test]
    fn key_length_follows_setting() {
        let params = small_params();
        let mut alice = PeerHandshake::new(codec(), 16);
        let mut bob = PeerHandshake::new(codec(), 16);
        alice.register(&Registration::new("alice", "bob")).unwrap();
        bob.register(&Registration::new("bob", "alice")).unwrap();

        sent(&alice.handle_message(&found(&params)).unwrap());
        let bob_salt = sent(&bob.handle_message(&found(&params)).unwrap());

        let key = established(alice.handle_message(&codec().confirmation(&bob_salt)).unwrap());
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn trivial_peer_salt_is_rejected() {
        let params = small_params();
        let p_minus_one = (&params.p - 1u32).to_string();
        for salt in ["0", "1", p_minus_one.as_str()] {
            let mut attempt = PeerHandshake::new(codec(), 32);
            attempt.register(&Registration::new("alice", "bob")).unwrap();
            attempt.handle_message(&found(&params)).unwrap();

            assert!(matches!(
                attempt.handle_message(&codec().confirmation(salt.as_bytes())),
                Err(HandshakeError::Dh(duet_crypto::DhError::PublicSaltOutOfRange))
            ));
        }
    }

    #[test]
    fn confirmation_before_parameters_is_unexpected() {
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();

        assert!(matches!(
            hs.handle_message(b"CHAT_CONFIRMED:5"),
            Err(HandshakeError::UnexpectedMessage { token: "CHAT_CONFIRMED", .. })
        ));
    }

    #[test]
    fn confirmation_with_missing_salt_fails() {
        let params = small_params();
        let mut hs = PeerHandshake::new(codec(), 32);
        hs.register(&Registration::new("alice", "bob")).unwrap();
        hs.handle_message(&found(&params)).unwrap();

        assert!(matches!(hs.handle_message(b"CHAT_CONFIRMED"), Err(HandshakeError::Protocol(_))));
    }
}
