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

use fluence_keypair::{KeyPair, Signature};

use crate::error::ProtocolError;
use crate::particle::PeerId;

/// Ed25519 identity of a peer. Thin wrapper over `fluence_keypair::KeyPair`
/// exposing exactly the surface the engine and the `sig` builtin need.
#[derive(Clone)]
pub struct PeerKeyPair {
    inner: KeyPair,
}

impl PeerKeyPair {
    /// Generates a fresh random Ed25519 identity.
    pub fn generate() -> Self {
        Self {
            inner: KeyPair::generate_ed25519(),
        }
    }

    /// Restores an identity from a raw 32-byte Ed25519 seed, as persisted
    /// between process restarts by key storage (out of scope here).
    pub fn from_secret_bytes(seed: &[u8]) -> Result<Self, ProtocolError> {
        let inner = KeyPair::ed25519_from_bytes(seed.to_vec())
            .map_err(|e| ProtocolError::SigningFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn get_peer_id(&self) -> PeerId {
        PeerId::new(self.inner.get_peer_id().to_base58())
    }

    pub fn sign_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        self.inner
            .sign(bytes)
            .map(|sig| sig.to_vec())
            .map_err(|e| ProtocolError::SigningFailed(e.to_string()))
    }

    pub fn verify(&self, bytes: &[u8], signature: &[u8]) -> bool {
        Self::verify_with(&self.inner, bytes, signature)
    }

    /// Verifies a signature against an arbitrary public key, used when
    /// checking a particle's signature against its `initPeerId`'s key
    /// rather than the local identity.
    pub fn verify_with(keypair: &KeyPair, bytes: &[u8], signature: &[u8]) -> bool {
        let format = keypair.public().get_key_format();
        let signature = Signature::from_bytes(format, signature.to_vec());
        keypair.public().verify(bytes, &signature).is_ok()
    }

    /// Raw 32-byte seed handed to the AVM so it can prove identity when
    /// invoking on behalf of this peer.
    pub fn to_ed25519_private_key(&self) -> Result<Vec<u8>, ProtocolError> {
        self.inner
            .secret()
            .map_err(|e| ProtocolError::SigningFailed(e.to_string()))
    }

    pub fn inner(&self) -> &KeyPair {
        &self.inner
    }
}

impl std::fmt::Debug for PeerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerKeyPair")
            .field("peer_id", &self.get_peer_id())
            .finish()
    }
}
