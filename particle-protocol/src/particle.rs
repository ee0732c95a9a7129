/*
 * Copyright 2020 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::keypair::PeerKeyPair;

/// Base58 multihash identity of a peer, as derived from its Ed25519 public
/// key by `PeerKeyPair::get_peer_id`.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(base58: impl Into<String>) -> Self {
        Self(base58.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self(String::new())
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// An immutable, signed, TTL-bounded execution unit carrying an AIR script
/// and accumulated AVM-opaque data.
///
/// Particles are never mutated in place. Forwarding a particle to its next
/// hop produces a new value via [`Particle::with_data`], which copies every
/// identity field (including the signature) and swaps only `data`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: String,
    pub init_peer_id: PeerId,
    pub timestamp: u64,
    pub ttl: u32,
    pub script: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("id", &self.id)
            .field("init_peer_id", &self.init_peer_id)
            .field("timestamp", &self.timestamp)
            .field("ttl", &self.ttl)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Default for Particle {
    /// Yields an empty, unsigned particle, used for table-driven test
    /// construction across the corpus.
    fn default() -> Self {
        Self {
            id: String::new(),
            init_peer_id: PeerId::default(),
            timestamp: 0,
            ttl: 0,
            script: String::new(),
            data: Vec::new(),
            signature: Vec::new(),
        }
    }
}

impl Particle {
    /// Builds the canonical byte sequence covered by a particle's
    /// signature: `id || be64(timestamp) || be32(ttl) || script_utf8`.
    /// Signing and verification both go through this function so they
    /// never drift.
    pub fn signable_bytes(
        id: &str,
        timestamp: u64,
        ttl: u32,
        script: &str,
    ) -> Vec<u8> {
        let mut buf = Vec::with_capacity(id.len() + 8 + 4 + script.len());
        buf.extend_from_slice(id.as_bytes());
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&ttl.to_be_bytes());
        buf.extend_from_slice(script.as_bytes());
        buf
    }

    /// Creates and signs a new particle originated locally by `key_pair`.
    pub fn create_new(
        script: impl Into<String>,
        ttl: u32,
        key_pair: &PeerKeyPair,
    ) -> Result<Self, ProtocolError> {
        let script = script.into();
        if script.trim().is_empty() {
            return Err(ProtocolError::EmptyScript);
        }
        if ttl == 0 {
            return Err(ProtocolError::ZeroTtl);
        }

        let id = Uuid::new_v4().to_string();
        let timestamp = now_ms();
        let signable = Self::signable_bytes(&id, timestamp, ttl, &script);
        let signature = key_pair.sign_bytes(&signable)?;

        Ok(Self {
            id,
            init_peer_id: key_pair.get_peer_id(),
            timestamp,
            ttl,
            script,
            data: Vec::new(),
            signature,
        })
    }

    /// Returns a new particle identical to `self` except for `data`.
    /// Preserves identity fields and signature — used when forwarding a
    /// particle to its next hop with the AVM's updated state.
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        Self {
            id: self.id.clone(),
            init_peer_id: self.init_peer_id.clone(),
            timestamp: self.timestamp,
            ttl: self.ttl,
            script: self.script.clone(),
            data,
            signature: self.signature.clone(),
        }
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.timestamp.saturating_add(self.ttl as u64)
    }

    pub fn has_expired(&self) -> bool {
        now_ms() > self.expires_at_ms()
    }

    /// Remaining milliseconds until expiration; zero if already expired.
    pub fn actual_ttl(&self) -> u32 {
        let expires = self.expires_at_ms();
        let now = now_ms();
        if now >= expires {
            0
        } else {
            (expires - now) as u32
        }
    }

    /// Verifies the signature against the given public key's owner,
    /// expected to be `init_peer_id`'s key.
    pub fn verify(&self, key_pair: &fluence_keypair::KeyPair) -> bool {
        let signable = Self::signable_bytes(&self.id, self.timestamp, self.ttl, &self.script);
        PeerKeyPair::verify_with(key_pair, &signable, &self.signature)
    }
}

mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_new_signs_and_verifies() {
        let kp = PeerKeyPair::generate();
        let p = Particle::create_new("(null)", 7000, &kp).unwrap();
        assert_eq!(p.init_peer_id, kp.get_peer_id());
        assert!(p.verify(kp.inner()));
    }

    #[test]
    fn empty_script_rejected() {
        let kp = PeerKeyPair::generate();
        assert!(matches!(
            Particle::create_new("   ", 7000, &kp),
            Err(ProtocolError::EmptyScript)
        ));
    }

    #[test]
    fn zero_ttl_rejected() {
        let kp = PeerKeyPair::generate();
        assert!(matches!(
            Particle::create_new("(null)", 0, &kp),
            Err(ProtocolError::ZeroTtl)
        ));
    }

    #[test]
    fn with_data_preserves_identity_and_signature() {
        let kp = PeerKeyPair::generate();
        let p = Particle::create_new("(null)", 7000, &kp).unwrap();
        let p2 = p.with_data(vec![1, 2, 3]);
        assert_eq!(p.id, p2.id);
        assert_eq!(p.signature, p2.signature);
        assert_eq!(p2.data, vec![1, 2, 3]);
        assert!(p2.verify(kp.inner()));
    }

    #[test]
    fn actual_ttl_decreases_towards_zero() {
        let mut p = Particle::default();
        p.timestamp = now_ms();
        p.ttl = 1000;
        assert!(p.actual_ttl() <= 1000);
        assert!(!p.has_expired());

        p.timestamp = now_ms() - 2000;
        p.ttl = 100;
        assert!(p.has_expired());
        assert_eq!(p.actual_ttl(), 0);
    }
}
