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

use async_std::task::JoinHandle;
use parking_lot::Mutex;
use serde_json::Value as JValue;

use connection_pool::Connection;
use marine_host::MarineHost;
use particle_builtins::ServiceHost;
use particle_execution::{ParticleError, UsageError};
use particle_protocol::Particle;

use crate::error::AquamarineApiError;
use crate::plumber::Plumber;
use crate::queue_item::{Callbacks, OnError, OnSuccess, ParticleQueueItem};

/// The particle execution engine: ties the service host, the Marine
/// runtime, and a relay connection together into the pipeline described
/// by the spec — ingest, group, interpret, dispatch, forward, expire.
pub struct AquamarineApi {
    marine: Arc<dyn MarineHost>,
    services: Arc<ServiceHost>,
    connection: Arc<dyn Connection>,
    plumber: Arc<Plumber>,
    running: Arc<AtomicBool>,
    incoming_task: Mutex<Option<JoinHandle<()>>>,
}

impl AquamarineApi {
    pub fn new(
        marine: Arc<dyn MarineHost>,
        services: Arc<ServiceHost>,
        connection: Arc<dyn Connection>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(false));
        let plumber = Arc::new(Plumber::new(
            marine.clone(),
            services.clone(),
            connection.clone(),
            running.clone(),
        ));

        Self {
            marine,
            services,
            connection,
            plumber,
            running,
            incoming_task: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts Marine, subscribes to the connection's incoming particles
    /// (enqueued with no-op callbacks), starts the connection, and flips
    /// `isInitialized`. Forwarding a particle onward is each signature
    /// group's actor's own job (it sends directly once a round names
    /// `next_peer_pks`), so there is no separate forwarding task here.
    pub async fn start(&self) -> Result<(), AquamarineApiError> {
        self.marine.start().await?;
        self.connection.start().await?;

        let particle_source = self.connection.particle_source();
        let plumber = self.plumber.clone();
        let incoming_task = async_std::task::spawn(async move {
            while let Ok(particle) = particle_source.recv().await {
                let item = ParticleQueueItem::new(particle, Callbacks::noop());
                plumber.ingest(item).await;
            }
        });
        *self.incoming_task.lock() = Some(incoming_task);

        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Unsubscribes from the network source, drains the incoming queue,
    /// awaits every actor's mailbox, then stops Marine and the
    /// connection.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        self.connection.stop().await;
        if let Some(task) = self.incoming_task.lock().take() {
            task.await;
        }

        self.plumber.join_all().await;

        let _ = self.marine.stop().await;
    }

    /// Enqueues `particle` for processing. Exactly one of `on_success`/
    /// `on_error` fires, at most once, before the particle's TTL timer
    /// triggers expiration.
    pub async fn initiate_particle(
        &self,
        particle: Particle,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> Result<(), AquamarineApiError> {
        if !self.is_initialized() {
            return Err(UsageError::NotInitialized.into());
        }

        let item = ParticleQueueItem::new(particle, Callbacks::new(on_success, on_error));
        self.plumber.ingest(item).await;
        Ok(())
    }

    pub fn marine(&self) -> &Arc<dyn MarineHost> {
        &self.marine
    }

    pub fn services(&self) -> &Arc<ServiceHost> {
        &self.services
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

/// Helper so callers can build a one-shot awaiter instead of writing the
/// channel plumbing by hand; used by [`crate::call_function`].
pub fn oneshot_callbacks() -> (
    OnSuccess,
    OnError,
    futures::channel::oneshot::Receiver<Result<JValue, ParticleError>>,
) {
    let (tx, rx) = futures::channel::oneshot::channel();
    let tx_success = Arc::new(Mutex::new(Some(tx)));
    let tx_error = tx_success.clone();

    let on_success: OnSuccess = Box::new(move |v| {
        if let Some(tx) = tx_success.lock().take() {
            let _ = tx.send(Ok(v));
        }
    });
    let on_error: OnError = Box::new(move |e| {
        if let Some(tx) = tx_error.lock().take() {
            let _ = tx.send(Err(e));
        }
    });

    (on_success, on_error, rx)
}
