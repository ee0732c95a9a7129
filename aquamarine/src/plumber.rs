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

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use connection_pool::Connection;
use marine_host::MarineHost;
use particle_builtins::ServiceHost;

use crate::actor::Actor;
use crate::queue_item::ParticleQueueItem;

/// Routes particles to the actor owning their signature group, spawning a
/// fresh actor the first time a signature is seen. Different groups
/// process fully in parallel; particles sharing a signature are always
/// handed to the same actor, which processes them strictly serially.
pub struct Plumber {
    marine: Arc<dyn MarineHost>,
    services: Arc<ServiceHost>,
    connection: Arc<dyn Connection>,
    running: Arc<AtomicBool>,
    actors: Mutex<HashMap<Vec<u8>, Arc<Actor>>>,
}

impl Plumber {
    pub fn new(
        marine: Arc<dyn MarineHost>,
        services: Arc<ServiceHost>,
        connection: Arc<dyn Connection>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            marine,
            services,
            connection,
            running,
            actors: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueues `item` onto the actor for its particle's signature,
    /// creating that actor if this is the first particle of the group or
    /// if the previous actor for that signature has already self-reaped.
    pub async fn ingest(&self, item: ParticleQueueItem) {
        let actor = self.actor_for(&item.particle.signature);
        actor.enqueue(item).await;
    }

    fn actor_for(&self, signature: &[u8]) -> Arc<Actor> {
        let mut actors = self.actors.lock();

        if let Some(actor) = actors.get(signature) {
            if actor.is_done() {
                actors.remove(signature);
            }
        }

        actors
            .entry(signature.to_vec())
            .or_insert_with(|| {
                Arc::new(Actor::spawn(
                    self.marine.clone(),
                    self.services.clone(),
                    self.connection.clone(),
                    self.running.clone(),
                ))
            })
            .clone()
    }

    /// Waits for every actor's mailbox to drain, used during shutdown.
    pub async fn join_all(&self) {
        let actors: Vec<Arc<Actor>> = self.actors.lock().values().cloned().collect();
        for actor in actors {
            actor.join().await;
        }
    }
}
