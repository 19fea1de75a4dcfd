//! Handshake patterns: pre-messages, message token programs, and the `pskN`
//! /`fallback` modifiers (spec §3 `HandshakePattern`, §4.3, §4.4).

use crate::error::{NoiseError, Result};

/// One token in a message pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// Generate (or reuse, for fallback) and transmit a local ephemeral key.
    E,
    /// Transmit the local static key, AEAD-protected once a key is set.
    S,
    /// Mix `DH(e, re)`.
    Ee,
    /// Mix `DH(e, rs)` (initiator) or `DH(s, re)` (responder).
    Es,
    /// Mix `DH(s, re)` (initiator) or `DH(e, rs)` (responder).
    Se,
    /// Mix `DH(s, rs)`.
    Ss,
    /// Mix in the next queued pre-shared key.
    Psk,
}

/// Which local/remote keys a pattern's pre-message declares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreMessage {
    /// A static key is exchanged before the first message.
    pub s: bool,
    /// An ephemeral key is exchanged before the first message.
    pub e: bool,
}

impl PreMessage {
    const NONE: PreMessage = PreMessage { s: false, e: false };

    fn tokens(self) -> Vec<Token> {
        let mut out = Vec::new();
        if self.e {
            out.push(Token::E);
        }
        if self.s {
            out.push(Token::S);
        }
        out
    }
}

/// An immutable handshake pattern: a name, each role's pre-message
/// declaration, and the ordered message token lists. Patterns are values;
/// modifiers (`apply_psk`, `apply_fallback`) return new patterns rather than
/// mutating shared state (spec §9 "Pattern mutability").
#[derive(Clone, Debug)]
pub struct HandshakePattern {
    /// Base pattern name, e.g. `"XX"`, without modifier suffixes.
    pub name: &'static str,
    /// Initiator's pre-message keys.
    pub initiator_pre: PreMessage,
    /// Responder's pre-message keys.
    pub responder_pre: PreMessage,
    /// Ordered per-message token lists.
    pub messages: Vec<Vec<Token>>,
    /// Modifier suffixes applied so far, in order (e.g. `["psk0", "psk2"]`),
    /// kept so the protocol name can be reconstructed (spec §8 invariant 5).
    pub modifiers: Vec<String>,
}

impl HandshakePattern {
    fn new(name: &'static str, initiator_pre: PreMessage, responder_pre: PreMessage, messages: Vec<Vec<Token>>) -> Self {
        Self {
            name,
            initiator_pre,
            responder_pre,
            messages,
            modifiers: Vec::new(),
        }
    }

    /// Full pattern name including modifier suffixes, e.g. `"NNpsk0+psk2"`.
    pub fn full_name(&self) -> String {
        let mut s = self.name.to_string();
        for (i, m) in self.modifiers.iter().enumerate() {
            if i == 0 {
                s.push_str(m);
            } else {
                s.push('+');
                s.push_str(m);
            }
        }
        s
    }

    /// Apply the `pskN` modifier: insert a `psk` token at message position
    /// `n` (`psk0` prepends to message 0; `pskN`, N>=1, appends to message
    /// N-1). Modifiers are additive (spec §4.3 "PSK modifier").
    pub fn apply_psk(mut self, n: usize) -> Result<Self> {
        if n == 0 {
            self.messages
                .first_mut()
                .ok_or_else(|| NoiseError::Configuration("psk0 requires at least one message".into()))?
                .insert(0, Token::Psk);
        } else {
            let idx = n - 1;
            self.messages
                .get_mut(idx)
                .ok_or_else(|| NoiseError::Configuration(format!("psk{n} has no matching message")))?
                .push(Token::Psk);
        }
        self.modifiers.push(format!("psk{n}"));
        Ok(self)
    }

    /// Apply the `fallback` modifier: the initiator's first message becomes
    /// an initiator pre-message instead (spec §4.3 "Fallback modifier").
    /// The tokens stay attributed to the initiator's role; only their
    /// transmission moves from "on the wire" to "already known", so the new
    /// responder reads them via `re`/`rs` and the new initiator supplies
    /// them via its own `e`/`s`, exactly as the original failed attempt did.
    pub fn apply_fallback(mut self) -> Result<Self> {
        if self.messages.is_empty() {
            return Err(NoiseError::Configuration("fallback requires at least one message".into()));
        }
        let first = self.messages.remove(0);
        if !first.iter().all(|t| matches!(t, Token::E | Token::S)) {
            return Err(NoiseError::Configuration(
                "fallback only supports an initial message of e/s pre-message tokens".into(),
            ));
        }
        for t in first {
            match t {
                Token::E => self.initiator_pre.e = true,
                Token::S => self.initiator_pre.s = true,
                _ => unreachable!(),
            }
        }
        self.modifiers.push("fallback".to_string());
        Ok(self)
    }

    /// Look up one of the fifteen required base patterns by name
    /// (`N`,`K`,`X`,`NN`,`NK`,`NX`,`XN`,`XK`,`XX`,`KN`,`KK`,`KX`,`IN`,`IK`,`IX`).
    pub fn lookup(name: &str) -> Result<Self> {
        use Token::*;
        let p = match name {
            // One-way patterns: responder has no messages to send.
            "N" => Self::new(
                "N",
                PreMessage::NONE,
                PreMessage { s: true, e: false },
                vec![vec![E, Es]],
            ),
            "K" => Self::new(
                "K",
                PreMessage { s: true, e: false },
                PreMessage { s: true, e: false },
                vec![vec![E, Es, Ss]],
            ),
            "X" => Self::new(
                "X",
                PreMessage::NONE,
                PreMessage { s: true, e: false },
                vec![vec![E, Es, S, Ss]],
            ),
            // Interactive patterns.
            "NN" => Self::new("NN", PreMessage::NONE, PreMessage::NONE, vec![vec![E], vec![E, Ee]]),
            "NK" => Self::new(
                "NK",
                PreMessage::NONE,
                PreMessage { s: true, e: false },
                vec![vec![E, Es], vec![E, Ee]],
            ),
            "NX" => Self::new(
                "NX",
                PreMessage::NONE,
                PreMessage::NONE,
                vec![vec![E], vec![E, Ee, S, Es]],
            ),
            "XN" => Self::new(
                "XN",
                PreMessage::NONE,
                PreMessage::NONE,
                vec![vec![E], vec![E, Ee], vec![S, Se]],
            ),
            "XK" => Self::new(
                "XK",
                PreMessage::NONE,
                PreMessage { s: true, e: false },
                vec![vec![E, Es], vec![E, Ee], vec![S, Se]],
            ),
            "XX" => Self::new(
                "XX",
                PreMessage::NONE,
                PreMessage::NONE,
                vec![vec![E], vec![E, Ee, S, Es], vec![S, Se]],
            ),
            "KN" => Self::new(
                "KN",
                PreMessage { s: true, e: false },
                PreMessage::NONE,
                vec![vec![E], vec![E, Ee, Se]],
            ),
            "KK" => Self::new(
                "KK",
                PreMessage { s: true, e: false },
                PreMessage { s: true, e: false },
                vec![vec![E, Es, Ss], vec![E, Ee, Se]],
            ),
            "KX" => Self::new(
                "KX",
                PreMessage { s: true, e: false },
                PreMessage::NONE,
                vec![vec![E], vec![E, Ee, Se, S, Es]],
            ),
            "IN" => Self::new(
                "IN",
                PreMessage::NONE,
                PreMessage::NONE,
                vec![vec![E, S], vec![E, Ee, Se]],
            ),
            "IK" => Self::new(
                "IK",
                PreMessage::NONE,
                PreMessage { s: true, e: false },
                vec![vec![E, Es, S, Ss], vec![E, Ee, Se]],
            ),
            "IX" => Self::new(
                "IX",
                PreMessage::NONE,
                PreMessage::NONE,
                vec![vec![E, S], vec![E, Ee, Se, S, Es]],
            ),
            other => return Err(NoiseError::Configuration(format!("unknown handshake pattern {other}"))),
        };
        Ok(p)
    }

    /// Pre-message tokens for the given role, in the order they must be
    /// mixed at `Initialize` (spec §4.3 step 4: initiator's, then responder's).
    pub fn pre_message_tokens(&self, initiator: bool) -> Vec<Token> {
        if initiator {
            self.initiator_pre.tokens()
        } else {
            self.responder_pre.tokens()
        }
    }
}

/// Parses `<PATTERN><modifiers>` (e.g. `"XXfallback"`, `"NNpsk0+psk2"`) into
/// a built pattern with modifiers applied left to right (spec §4.5).
pub fn parse_and_build(handshake: &str) -> Result<HandshakePattern> {
    let boundary = handshake
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(handshake.len());
    let (base, suffix) = handshake.split_at(boundary);
    let mut pattern = HandshakePattern::lookup(base)?;

    if suffix.is_empty() {
        return Ok(pattern);
    }
    for modifier in suffix.split('+') {
        pattern = apply_modifier(pattern, modifier)?;
    }
    Ok(pattern)
}

fn apply_modifier(pattern: HandshakePattern, modifier: &str) -> Result<HandshakePattern> {
    if modifier == "fallback" {
        return pattern.apply_fallback();
    }
    if let Some(n) = modifier.strip_prefix("psk") {
        let n: usize = n
            .parse()
            .map_err(|_| NoiseError::Configuration(format!("malformed psk modifier {modifier}")))?;
        return pattern.apply_psk(n);
    }
    Err(NoiseError::Configuration(format!("unknown pattern modifier {modifier}")))
}
