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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_std::channel::{self, Receiver, Sender};
use async_std::task::JoinHandle;
use parking_lot::Mutex;
use serde_json::Value as JValue;

use connection_pool::Connection;
use marine_host::{CallResult, MarineHost};
use particle_builtins::ServiceHost;
use particle_execution::ParticleError;
use particle_protocol::PeerId;

use crate::deadline::Deadline;
use crate::dispatch::{call_request_params, interpret_round, resolve_call_request};
use crate::queue_item::ParticleQueueItem;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// One signature group's worker: owns that group's `prev_data` and
/// processes its particles strictly serially, one at a time, in arrival
/// order. Different groups run fully in parallel — each gets its own
/// `Actor` and its own `async_std::task`.
///
/// Call requests a round raises are never joined before the AVM is
/// re-invoked: each is resolved on its own detached task, which feeds its
/// result back onto this same mailbox as a re-entry item. The mailbox
/// still drains one item at a time, so a signature group's interpreter
/// state is never touched concurrently — but distinct call requests race
/// each other freely, and whichever resolves first re-triggers the AVM
/// without waiting on its siblings.
pub struct Actor {
    mailbox: Sender<ParticleQueueItem>,
    task: Mutex<Option<JoinHandle<()>>>,
    done: Arc<AtomicBool>,
}

impl Actor {
    pub fn spawn(
        marine: Arc<dyn MarineHost>,
        services: Arc<ServiceHost>,
        connection: Arc<dyn Connection>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let (mailbox, mailbox_rx) = channel::unbounded();
        let done = Arc::new(AtomicBool::new(false));

        let task = async_std::task::spawn(Self::run(
            marine,
            services,
            connection,
            running,
            mailbox.clone(),
            mailbox_rx,
            done.clone(),
        ));

        Self {
            mailbox,
            task: Mutex::new(Some(task)),
            done,
        }
    }

    pub async fn enqueue(&self, item: ParticleQueueItem) {
        let _ = self.mailbox.send(item).await;
    }

    /// Whether this actor's worker loop has self-terminated (its
    /// signature group's deadline passed with an empty mailbox). A done
    /// actor must not be handed new particles — [`crate::plumber::Plumber`]
    /// reaps it and spawns a fresh one instead.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    pub async fn join(&self) {
        self.mailbox.close();
        if let Some(task) = self.task.lock().take() {
            task.await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        marine: Arc<dyn MarineHost>,
        services: Arc<ServiceHost>,
        connection: Arc<dyn Connection>,
        running: Arc<AtomicBool>,
        self_tx: Sender<ParticleQueueItem>,
        mailbox: Receiver<ParticleQueueItem>,
        done: Arc<AtomicBool>,
    ) {
        let mut prev_data: Vec<u8> = Vec::new();
        let mut deadline: Option<Deadline> = None;

        loop {
            let item = match deadline {
                None => match mailbox.recv().await {
                    Ok(item) => item,
                    Err(_) => break,
                },
                Some(deadline) => {
                    let remaining = deadline.remaining(now_ms());
                    match async_std::future::timeout(remaining, mailbox.recv()).await {
                        Ok(Ok(item)) => item,
                        Ok(Err(_)) => break,
                        Err(_) => match mailbox.try_recv() {
                            Ok(item) => item,
                            Err(_) => break,
                        },
                    }
                }
            };

            if !running.load(Ordering::SeqCst) {
                item.callbacks.error(ParticleError::Send {
                    particle_id: item.particle.id.clone(),
                    message: "engine is shutting down".to_string(),
                });
                services.remove_particle_scope_handlers(&item.particle.id);
                continue;
            }

            let ParticleQueueItem {
                particle,
                callbacks,
                call_results,
            } = item;

            let script_snippet: String = particle.script.chars().take(80).collect();
            log::trace!(
                "particle {} init_peer_id={} timestamp={} ttl={} script={:?}",
                particle.id,
                particle.init_peer_id.as_str(),
                particle.timestamp,
                particle.ttl,
                script_snippet
            );

            if particle.has_expired() {
                callbacks.error(ParticleError::Expiration {
                    particle_id: particle.id.clone(),
                });
                services.remove_particle_scope_handlers(&particle.id);
                continue;
            }

            let active_deadline = *deadline.get_or_insert_with(|| Deadline::from_particle(&particle));

            let known_results = call_results.clone();
            let remaining = active_deadline.remaining(now_ms());
            let result = async_std::future::timeout(
                remaining,
                interpret_round(&*marine, &particle, prev_data.clone(), call_results),
            )
            .await;

            let particle_id = particle.id.clone();

            let outcome = match result {
                Err(_) => {
                    callbacks.error(ParticleError::Expiration {
                        particle_id: particle_id.clone(),
                    });
                    services.remove_particle_scope_handlers(&particle_id);
                    continue;
                }
                Ok(Err(e)) => {
                    callbacks.error(ParticleError::Interpreter {
                        particle_id: particle_id.clone(),
                        message: e.to_string(),
                    });
                    services.remove_particle_scope_handlers(&particle_id);
                    continue;
                }
                Ok(Ok(outcome)) => outcome,
            };

            if active_deadline.is_expired(now_ms()) {
                callbacks.error(ParticleError::Expiration {
                    particle_id: particle_id.clone(),
                });
                services.remove_particle_scope_handlers(&particle_id);
                continue;
            }

            if !outcome.is_success() {
                callbacks.error(ParticleError::Interpreter {
                    particle_id: particle_id.clone(),
                    message: outcome.error_message.clone(),
                });
                services.remove_particle_scope_handlers(&particle_id);
                continue;
            }

            if !outcome.call_requests.is_empty() {
                // Every outstanding call request is resolved on its own
                // detached task and re-enters this same mailbox as soon as
                // it lands — never joined, so one slow call never holds up
                // the others' re-invocation of the AVM. The accumulator is
                // shared and locked only around the insert, so concurrent
                // resolutions never lose each other's results.
                let accumulated = Arc::new(Mutex::new(known_results));
                for (key, req) in outcome.call_requests {
                    let marine = marine.clone();
                    let services = services.clone();
                    let particle = particle.clone();
                    let callbacks = callbacks.clone();
                    let self_tx = self_tx.clone();
                    let accumulated = accumulated.clone();

                    async_std::task::spawn(async move {
                        let particle_params = call_request_params(&particle, &req);
                        let result =
                            resolve_call_request(&*marine, &services, &particle_params, req).await;

                        let merged = {
                            let mut acc = accumulated.lock();
                            acc.insert(
                                key,
                                CallResult {
                                    ret_code: result.ret_code,
                                    result: result.result,
                                },
                            );
                            acc.clone()
                        };

                        let particle_id = particle.id.clone();
                        let reentry =
                            ParticleQueueItem::with_call_results(particle, callbacks, merged);

                        // The owning actor may have already self-reaped (its
                        // deadline passed while this resolution was in
                        // flight); the particle is expired either way, so
                        // tell its callbacks directly rather than drop them.
                        if let Err(err) = self_tx.send(reentry).await {
                            err.into_inner().callbacks.error(ParticleError::Expiration {
                                particle_id,
                            });
                        }
                    });
                }
                continue;
            }

            prev_data = outcome.data.clone();

            let next_peers: Vec<PeerId> = outcome
                .next_peer_pks
                .iter()
                .map(|s| PeerId::new(s.clone()))
                .collect();

            if !next_peers.is_empty() {
                let forwarded = particle.with_data(outcome.data.clone());
                if let Err(e) = connection.send_particle(&next_peers, forwarded).await {
                    callbacks.error(ParticleError::Send {
                        particle_id: particle_id.clone(),
                        message: e.to_string(),
                    });
                    services.remove_particle_scope_handlers(&particle_id);
                    continue;
                }
            }

            callbacks.success(JValue::Null);
            services.remove_particle_scope_handlers(&particle_id);
        }

        done.store(true, Ordering::SeqCst);
    }
}
