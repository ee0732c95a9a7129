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

use async_std::channel::Receiver;
use async_trait::async_trait;

use particle_protocol::{Particle, PeerId};

use crate::error::ConnectionError;

/// Particle source/sink over a relay transport. Deliberately narrower than
/// a full connection pool: this client peer dials exactly one relay on
/// `start` and never tracks a pool of arbitrary peers — routing anywhere
/// but that relay is rejected, not attempted.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn start(&self) -> Result<(), ConnectionError>;

    async fn stop(&self);

    fn supports_relay(&self) -> bool;

    fn get_relay_peer_id(&self) -> PeerId;

    /// Sends `particle` onward. Permitted only when `next_peer_ids` is
    /// exactly `[relay_peer_id]`; anything else is an `UnsupportedRoute`.
    async fn send_particle(
        &self,
        next_peer_ids: &[PeerId],
        particle: Particle,
    ) -> Result<(), ConnectionError>;

    /// Channel of particles arriving from the network. Each call returns
    /// a clone of the same receiver; all clones observe every message
    /// (multi-consumer fan-out is the caller's concern, not this trait's).
    fn particle_source(&self) -> Receiver<Particle>;
}

/// Shared guard used by every `Connection` impl to reject non-relay
/// routes before doing any actual send work.
pub(crate) fn check_relay_route(
    next_peer_ids: &[PeerId],
    relay_peer_id: &PeerId,
) -> Result<(), ConnectionError> {
    if next_peer_ids == [relay_peer_id.clone()] {
        Ok(())
    } else {
        Err(ConnectionError::UnsupportedRoute)
    }
}
