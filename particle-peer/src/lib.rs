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

#![warn(rust_2018_idioms)]

//! Top-level assembly of the client peer: wires [`PeerKeyPair`] identity,
//! a [`MarineHost`], a [`ServiceHost`] carrying the built-in services plus
//! whatever per-call services [`call_aqua_function`] registers, and a
//! [`Connection`] to a relay into one [`AquamarineApi`] engine. Deliberately
//! not a standalone node binary — no swarm behaviour beyond the relay
//! connection, no script storage, no spell scheduling; see `SPEC_FULL.md`
//! for what's out of scope.

use std::sync::Arc;
use std::time::Duration;

use libp2p::identity::Keypair as Libp2pKeypair;

use aquamarine::{call_aqua_function, AquamarineApi, AquamarineApiError, CallFunctionError, CallRequest};
use connection_pool::{Connection, RelayConnection};
use marine_host::MarineHost;
use particle_builtins::{register_builtins, ServiceHost};
use particle_protocol::PeerKeyPair;
use peer_config::PeerConfig;

/// A client peer: identity, the local service registry, and the execution
/// engine tying Marine and the relay connection together. Constructed once
/// per process; `start`/`stop` bracket its lifetime.
pub struct Peer {
    keypair: PeerKeyPair,
    config: PeerConfig,
    services: Arc<ServiceHost>,
    engine: Arc<AquamarineApi>,
}

impl Peer {
    /// Assembles a peer from already-constructed collaborators. Registers
    /// the built-in services (`sig`, `srv`, `tracing`) on `services` before
    /// returning, so callers never need to remember to call
    /// [`register_builtins`] themselves.
    pub fn new(
        keypair: PeerKeyPair,
        config: PeerConfig,
        marine: Arc<dyn MarineHost>,
        connection: Arc<dyn Connection>,
    ) -> Self {
        let services = Arc::new(ServiceHost::new());
        register_builtins(&services, keypair.inner().clone(), marine.clone());
        let engine = Arc::new(AquamarineApi::new(marine, services.clone(), connection));

        Self {
            keypair,
            config,
            services,
            engine,
        }
    }

    /// Convenience constructor for the common case: a real Marine host and
    /// a real libp2p relay connection, both built from `config`.
    pub fn with_relay(keypair: PeerKeyPair, config: PeerConfig, marine: Arc<dyn MarineHost>) -> Self {
        let mut seed = keypair
            .to_ed25519_private_key()
            .expect("local keypair must carry a raw ed25519 seed");
        let secret = libp2p::identity::ed25519::SecretKey::from_bytes(&mut seed)
            .expect("32-byte ed25519 seed");
        let libp2p_keypair = Libp2pKeypair::Ed25519(secret.into());

        let connection = Arc::new(RelayConnection::new(
            libp2p_keypair,
            config.relay_address.clone(),
            config.dial_timeout,
        ));

        Self::new(keypair, config, marine, connection)
    }

    pub fn keypair(&self) -> &PeerKeyPair {
        &self.keypair
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn services(&self) -> &Arc<ServiceHost> {
        &self.services
    }

    pub fn engine(&self) -> &Arc<AquamarineApi> {
        &self.engine
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.config.default_ttl_ms as u64)
    }

    /// Starts Marine, dials the relay, and begins servicing both locally
    /// initiated and network-received particles.
    pub async fn start(&self) -> Result<(), AquamarineApiError> {
        self.engine.start().await
    }

    /// Drains in-flight work and tears everything down.
    pub async fn stop(&self) {
        self.engine.stop().await
    }

    /// Runs one Aqua/AIR call end to end: creates a particle for `request`,
    /// registers its ephemeral services, hands it to the engine, and
    /// resolves with the AIR-supplied result (or error).
    pub async fn call_function(
        &self,
        request: CallRequest,
    ) -> Result<serde_json::Value, CallFunctionError> {
        call_aqua_function(
            &self.engine,
            &self.services,
            &self.keypair,
            self.config.default_ttl_ms,
            request,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use connection_pool::FakeConnection;
    use marine_host::{done, FakeMarineHost};
    use particle_protocol::PeerId;

    use super::*;

    #[async_std::test]
    async fn assembled_peer_registers_builtins_and_runs_a_call() {
        let keypair = PeerKeyPair::generate();
        let config = PeerConfig::default();
        let marine = Arc::new(FakeMarineHost::new(vec![Box::new(|_| done(Vec::new()))]));
        let connection = Arc::new(FakeConnection::new(PeerId::new("relay")));

        let peer = Peer::new(keypair, config, marine, connection);
        assert!(peer.services().has_service("any-particle", "sig"));
        assert!(peer.services().has_service("any-particle", "srv"));

        peer.start().await.unwrap();
        let result = peer
            .call_function(CallRequest::new("(null)").fire_and_forget())
            .await;
        assert!(result.is_ok());
        peer.stop().await;
    }
}
