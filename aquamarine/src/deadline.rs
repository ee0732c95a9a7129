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

use std::time::Duration;

use particle_protocol::Particle;

/// The single expiration instant shared by every particle in a signature
/// group (they all carry the same `id`/`timestamp`/`ttl`/`script`, only
/// `data` differs, so they expire together). Armed once, from the first
/// item a group's actor observes.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    pub fn from_particle(particle: &Particle) -> Self {
        Self {
            at_ms: particle.expires_at_ms(),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.at_ms
    }

    /// How long is left before this deadline, zero if already past.
    pub fn remaining(&self, now_ms: u64) -> Duration {
        if now_ms >= self.at_ms {
            Duration::ZERO
        } else {
            Duration::from_millis(self.at_ms - now_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_protocol::PeerKeyPair;

    #[test]
    fn remaining_shrinks_towards_zero_past_expiry() {
        let kp = PeerKeyPair::generate();
        let particle = Particle::create_new("(null)", 50, &kp).unwrap();
        let deadline = Deadline::from_particle(&particle);

        assert!(!deadline.is_expired(particle.timestamp));
        assert!(deadline.remaining(particle.timestamp) > Duration::ZERO);
        assert!(deadline.is_expired(particle.timestamp + 1000));
        assert_eq!(deadline.remaining(particle.timestamp + 1000), Duration::ZERO);
    }
}
