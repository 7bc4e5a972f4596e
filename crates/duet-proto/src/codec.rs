//! Encoding and parsing of control messages.
//!
//! The separator is a deployment setting, so the codec carries it instead of
//! hard-coding a constant. Both sides of a deployment must agree on it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    control::{
        CHAT_CONFIRMED, CLIENT_EXISTS, INTERLOCUTOR_FOUND, INTERLOCUTOR_WAIT_TIMEOUT,
        NO_INTERLOCUTOR,
    },
    errors::{ProtocolError, Result},
    registration::Registration,
    ServerMessage,
};

/// Encodes and parses control messages joined by a separator character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCodec {
    separator: char,
}

impl ControlCodec {
    /// Separator used when none is configured.
    pub const DEFAULT_SEPARATOR: char = ':';

    /// Create a codec using `separator` between fields.
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Field separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Encode a registration as `<name><SEP><interlocutor>`.
    pub fn encode_registration(&self, registration: &Registration) -> String {
        format!("{}{}{}", registration.name, self.separator, registration.interlocutor)
    }

    /// Parse a registration payload.
    ///
    /// Trailing line endings are ignored so line-oriented peers can register
    /// by hand. Both names must be non-empty and distinct, and neither may
    /// contain the separator.
    pub fn parse_registration(&self, payload: &[u8]) -> Result<Registration> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        let text = text.trim_end_matches(['\r', '\n']);

        let (name, interlocutor) =
            text.split_once(self.separator).ok_or(ProtocolError::MissingSeparator(self.separator))?;

        if interlocutor.contains(self.separator) {
            return Err(ProtocolError::FieldCount {
                expected: 2,
                actual: text.split(self.separator).count(),
            });
        }
        if name.is_empty() {
            return Err(ProtocolError::EmptyField("name"));
        }
        if interlocutor.is_empty() {
            return Err(ProtocolError::EmptyField("interlocutor"));
        }
        if name == interlocutor {
            return Err(ProtocolError::SelfPairing(name.to_string()));
        }

        Ok(Registration::new(name, interlocutor))
    }

    /// Encode a relay-to-peer control message.
    pub fn encode_server_message(&self, message: &ServerMessage) -> String {
        let sep = self.separator;
        match message {
            ServerMessage::InterlocutorFound { p, g } => {
                format!("{INTERLOCUTOR_FOUND}{sep}{p}{sep}{g}")
            },
            ServerMessage::ChatConfirmed { peer_salt } => {
                format!("{CHAT_CONFIRMED}{sep}{peer_salt}")
            },
            other => other.token().to_string(),
        }
    }

    /// Build a `CHAT_CONFIRMED` message around an opaque partner payload.
    ///
    /// The relay never interprets the salt it forwards, so this takes raw
    /// bytes rather than a parsed integer.
    pub fn confirmation(&self, peer_payload: &[u8]) -> Bytes {
        let mut sep = [0u8; 4];
        let sep = self.separator.encode_utf8(&mut sep).as_bytes();

        let mut out =
            BytesMut::with_capacity(CHAT_CONFIRMED.len() + sep.len() + peer_payload.len());
        out.put_slice(CHAT_CONFIRMED.as_bytes());
        out.put_slice(sep);
        out.put_slice(peer_payload);
        out.freeze()
    }

    /// Parse a relay-to-peer control message.
    pub fn parse_server_message(&self, payload: &[u8]) -> Result<ServerMessage> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        let fields: Vec<&str> = text.split(self.separator).collect();
        let token = fields.first().copied().unwrap_or_default();

        match token {
            CLIENT_EXISTS => expect_fields(&fields, 1).map(|()| ServerMessage::ClientExists),
            NO_INTERLOCUTOR => expect_fields(&fields, 1).map(|()| ServerMessage::NoInterlocutor),
            INTERLOCUTOR_WAIT_TIMEOUT => {
                expect_fields(&fields, 1).map(|()| ServerMessage::WaitTimeout)
            },
            INTERLOCUTOR_FOUND => {
                expect_fields(&fields, 3)?;
                Ok(ServerMessage::InterlocutorFound {
                    p: decimal(fields[1], "p")?.to_string(),
                    g: decimal(fields[2], "g")?.to_string(),
                })
            },
            CHAT_CONFIRMED => {
                expect_fields(&fields, 2)?;
                Ok(ServerMessage::ChatConfirmed {
                    peer_salt: decimal(fields[1], "peer_salt")?.to_string(),
                })
            },
            other => Err(ProtocolError::UnexpectedToken(other.to_string())),
        }
    }
}

impl Default for ControlCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEPARATOR)
    }
}

fn expect_fields(fields: &[&str], expected: usize) -> Result<()> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount { expected, actual: fields.len() })
    }
}

fn decimal<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(ProtocolError::EmptyField(field));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidInteger { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_registration() {
        let codec = ControlCodec::default();
        let reg = codec.parse_registration(b"alice:bob").unwrap();
        assert_eq!(reg, Registration::new("alice", "bob"));
    }

    #[test]
    fn parse_registration_trims_line_ending() {
        let codec = ControlCodec::default();
        let reg = codec.parse_registration(b"alice:bob\r\n").unwrap();
        assert_eq!(reg.interlocutor, "bob");
    }

    #[test]
    fn parse_registration_without_separator() {
        let codec = ControlCodec::default();
        assert_eq!(codec.parse_registration(b"alice"), Err(ProtocolError::MissingSeparator(':')));
    }

    #[test]
    fn parse_registration_empty_fields() {
        let codec = ControlCodec::default();
        assert_eq!(codec.parse_registration(b":bob"), Err(ProtocolError::EmptyField("name")));
        assert_eq!(
            codec.parse_registration(b"alice:"),
            Err(ProtocolError::EmptyField("interlocutor"))
        );
    }

    #[test]
    fn parse_registration_extra_fields() {
        let codec = ControlCodec::default();
        assert_eq!(
            codec.parse_registration(b"alice:bob:carol"),
            Err(ProtocolError::FieldCount { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn parse_registration_self_pairing() {
        let codec = ControlCodec::default();
        assert!(matches!(
            codec.parse_registration(b"alice:alice"),
            Err(ProtocolError::SelfPairing(_))
        ));
    }

    #[test]
    fn parse_registration_invalid_utf8() {
        let codec = ControlCodec::default();
        assert_eq!(codec.parse_registration(&[0xff, b':', b'b']), Err(ProtocolError::InvalidUtf8));
    }

    #[test]
    fn custom_separator() {
        let codec = ControlCodec::new(';');
        let reg = Registration::new("alice", "bob");
        assert_eq!(codec.encode_registration(&reg), "alice;bob");
        assert_eq!(codec.parse_registration(b"alice;bob").unwrap(), reg);
        assert!(codec.parse_registration(b"alice:bob").is_err());
    }

    #[test]
    fn encode_interlocutor_found() {
        let codec = ControlCodec::default();
        let msg = ServerMessage::InterlocutorFound { p: "23".into(), g: "2".into() };
        assert_eq!(codec.encode_server_message(&msg), "INTERLOCUTOR_FOUND:23:2");
    }

    #[test]
    fn encode_bare_tokens() {
        let codec = ControlCodec::default();
        assert_eq!(codec.encode_server_message(&ServerMessage::ClientExists), "CLIENT_EXISTS");
        assert_eq!(codec.encode_server_message(&ServerMessage::NoInterlocutor), "NO_INTERLOCUTOR");
        assert_eq!(
            codec.encode_server_message(&ServerMessage::WaitTimeout),
            "INTERLOCUTOR_WAIT_TIMEOUT"
        );
    }

    #[test]
    fn confirmation_wraps_raw_payload() {
        let codec = ControlCodec::default();
        let confirmed = codec.confirmation(b"12345");
        assert_eq!(&confirmed[..], b"CHAT_CONFIRMED:12345");
        assert_eq!(
            codec.parse_server_message(&confirmed).unwrap(),
            ServerMessage::ChatConfirmed { peer_salt: "12345".into() }
        );
    }

    #[test]
    fn parse_server_message_rejects_bad_integers() {
        let codec = ControlCodec::default();
        assert_eq!(
            codec.parse_server_message(b"INTERLOCUTOR_FOUND:abc:2"),
            Err(ProtocolError::InvalidInteger { field: "p" })
        );
        assert_eq!(
            codec.parse_server_message(b"CHAT_CONFIRMED:"),
            Err(ProtocolError::EmptyField("peer_salt"))
        );
        assert_eq!(
            codec.parse_server_message(b"INTERLOCUTOR_FOUND:23"),
            Err(ProtocolError::FieldCount { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn parse_server_message_unknown_token() {
        let codec = ControlCodec::default();
        assert!(matches!(
            codec.parse_server_message(b"HELLO"),
            Err(ProtocolError::UnexpectedToken(t)) if t == "HELLO"
        ));
    }

    proptest! {
        #[test]
        fn registration_parses_what_it_encodes(
            name in "[a-z]{1,16}",
            interlocutor in "[A-Z]{1,16}",
        ) {
            let codec = ControlCodec::default();
            let reg = Registration::new(name, interlocutor);
            let encoded = codec.encode_registration(&reg);
            prop_assert_eq!(codec.parse_registration(encoded.as_bytes()).unwrap(), reg);
        }

        #[test]
        fn parse_server_message_never_panics(
            payload in proptest::collection::vec(any::<u8>(), 0..64)
        ) {
            let _ = ControlCodec::default().parse_server_message(&payload);
        }
    }
}
