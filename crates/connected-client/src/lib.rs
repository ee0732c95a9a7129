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

//! A fully in-process peer, assembled from the fakes in `marine-host` and
//! `connection-pool` instead of a real Marine/libp2p stack. Plays the role
//! the teacher's `ConnectedClient` plays for its own integration tests:
//! one call builds a runnable peer, scripted or scenario tests drive it
//! directly instead of going over a socket.

use std::sync::Arc;
use std::time::Duration;

use aquamarine::{call_aqua_function, AquamarineApi, CallFunctionError, CallRequest};
use connection_pool::FakeConnection;
use marine_host::{done, FakeMarineHost, ScriptedOutcome};
use particle_builtins::{register_builtins, ServiceHost};
use particle_protocol::{Particle, PeerId, PeerKeyPair};
use peer_config::PeerConfig;
use serde_json::Value as JValue;

/// An assembled in-process peer: a [`PeerKeyPair`] identity, the built-in
/// services registered on a [`ServiceHost`], and an [`AquamarineApi`]
/// wired to a [`FakeMarineHost`] and a [`FakeConnection`].
pub struct TestPeer {
    pub keypair: PeerKeyPair,
    pub config: PeerConfig,
    pub services: Arc<ServiceHost>,
    pub engine: Arc<AquamarineApi>,
    pub marine: Arc<FakeMarineHost>,
    pub connection: Arc<FakeConnection>,
}

impl TestPeer {
    /// Builds a peer whose `"avm"."invoke"` calls are answered in order by
    /// `steps`, relaying through a fake connection to `relay`.
    pub fn new(relay: impl Into<String>, steps: Vec<ScriptedOutcome>) -> Self {
        Self::new_with_invoke_delay(relay, steps, Duration::ZERO)
    }

    /// `new`, but every `"avm"."invoke"` call stalls for `delay` first —
    /// enough to let a particle's TTL elapse mid-interpretation.
    pub fn new_with_invoke_delay(
        relay: impl Into<String>,
        steps: Vec<ScriptedOutcome>,
        delay: Duration,
    ) -> Self {
        let keypair = PeerKeyPair::generate();
        let config = PeerConfig::default();
        let services = Arc::new(ServiceHost::new());
        let marine = Arc::new(FakeMarineHost::new(steps).with_invoke_delay(delay));
        let connection = Arc::new(FakeConnection::new(PeerId::new(relay.into())));

        register_builtins(&services, keypair.inner().clone(), marine.clone());

        let engine = Arc::new(AquamarineApi::new(
            marine.clone(),
            services.clone(),
            connection.clone(),
        ));

        Self {
            keypair,
            config,
            services,
            engine,
            marine,
            connection,
        }
    }

    /// `new`, with every scripted step reporting plain success and no
    /// further work — enough for scenarios that only care about the
    /// plumbing around one interpretation round.
    pub fn new_done(relay: impl Into<String>, rounds: usize) -> Self {
        let steps = (0..rounds)
            .map(|_| -> ScriptedOutcome { Box::new(|_| done(Vec::new())) })
            .collect();
        Self::new(relay, steps)
    }

    pub async fn start(&self) {
        self.engine.start().await.expect("engine starts");
    }

    pub async fn stop(&self) {
        self.engine.stop().await;
    }

    /// Injects a particle as if it arrived from the network.
    pub async fn deliver(&self, particle: Particle) {
        self.connection.deliver(particle).await;
    }

    pub async fn call(&self, request: CallRequest) -> Result<JValue, CallFunctionError> {
        call_aqua_function(
            &self.engine,
            &self.services,
            &self.keypair,
            self.config.default_ttl_ms,
            request,
        )
        .await
    }

    pub async fn call_script(&self, script: impl Into<String>) -> Result<JValue, CallFunctionError> {
        self.call(CallRequest::new(script)).await
    }

    pub fn relay_peer_id(&self) -> PeerId {
        self.connection.get_relay_peer_id()
    }

    pub fn short_timeout() -> Duration {
        Duration::from_millis(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[async_std::test]
    async fn call_script_resolves_through_response() {
        let peer = TestPeer::new(
            "relay",
            vec![Box::new(|_| done(Vec::new()))],
        );
        peer.start().await;

        let result = peer.call_script("(null)").await;
        assert!(result.is_ok());

        peer.stop().await;
    }

    #[async_std::test]
    async fn call_with_args_threads_values_through_getdatasrv() {
        let peer = TestPeer::new_done("relay", 1);
        peer.start().await;

        let result = peer
            .call(
                CallRequest::new("(null)")
                    .with_arg("value", json!(42))
                    .fire_and_forget(),
            )
            .await;

        assert!(result.is_ok());
        peer.stop().await;
    }
}
