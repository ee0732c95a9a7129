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

use std::sync::Mutex;

use async_std::channel::{self, Receiver, Sender};
use async_trait::async_trait;

use particle_protocol::{Particle, PeerId};

use crate::connection::{check_relay_route, Connection};
use crate::error::ConnectionError;

/// In-memory [`Connection`] for end-to-end tests: `send_particle` is
/// captured in a log instead of going over the wire, and inbound
/// particles are injected by the test via [`FakeConnection::deliver`].
/// Modeled on the teacher's `VMMock`-style test doubles (`aquamarine`
/// crate's `plumber.rs` tests).
pub struct FakeConnection {
    relay_peer_id: PeerId,
    sent: Mutex<Vec<(Vec<PeerId>, Particle)>>,
    incoming_tx: Sender<Particle>,
    incoming_rx: Receiver<Particle>,
}

impl FakeConnection {
    pub fn new(relay_peer_id: PeerId) -> Self {
        let (incoming_tx, incoming_rx) = channel::unbounded();
        Self {
            relay_peer_id,
            sent: Mutex::new(Vec::new()),
            incoming_tx,
            incoming_rx,
        }
    }

    /// Injects a particle as if it had arrived from the network.
    pub async fn deliver(&self, particle: Particle) {
        self.incoming_tx
            .send(particle)
            .await
            .expect("incoming channel closed");
    }

    /// Every particle handed to `send_particle` so far, in order.
    pub fn sent_particles(&self) -> Vec<(Vec<PeerId>, Particle)> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn start(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn stop(&self) {
        self.incoming_tx.close();
    }

    fn supports_relay(&self) -> bool {
        true
    }

    fn get_relay_peer_id(&self) -> PeerId {
        self.relay_peer_id.clone()
    }

    async fn send_particle(
        &self,
        next_peer_ids: &[PeerId],
        particle: Particle,
    ) -> Result<(), ConnectionError> {
        check_relay_route(next_peer_ids, &self.relay_peer_id)?;
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push((next_peer_ids.to_vec(), particle));
        Ok(())
    }

    fn particle_source(&self) -> Receiver<Particle> {
        self.incoming_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_protocol::PeerKeyPair;

    #[async_std::test]
    async fn non_relay_route_is_rejected() {
        let relay = PeerId::new("relay");
        let conn = FakeConnection::new(relay);

        let kp = PeerKeyPair::generate();
        let particle = Particle::create_new("(null)", 7000, &kp).unwrap();

        let other = PeerId::new("someone-else");
        let result = conn.send_particle(&[other], particle).await;
        assert!(matches!(result, Err(ConnectionError::UnsupportedRoute)));
    }

    #[async_std::test]
    async fn relay_route_is_recorded() {
        let relay = PeerId::new("relay");
        let conn = FakeConnection::new(relay.clone());

        let kp = PeerKeyPair::generate();
        let particle = Particle::create_new("(null)", 7000, &kp).unwrap();
        conn.send_particle(&[relay], particle).await.unwrap();

        assert_eq!(conn.sent_particles().len(), 1);
    }

    #[async_std::test]
    async fn delivered_particles_surface_on_particle_source() {
        let relay = PeerId::new("relay");
        let conn = FakeConnection::new(relay);

        let kp = PeerKeyPair::generate();
        let particle = Particle::create_new("(null)", 7000, &kp).unwrap();
        conn.deliver(particle.clone()).await;

        let source = conn.particle_source();
        let received = source.recv().await.unwrap();
        assert_eq!(received.id, particle.id);
    }
}
