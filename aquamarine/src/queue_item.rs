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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value as JValue;

use marine_host::CallResult;
use particle_execution::ParticleError;
use particle_protocol::Particle;

pub type OnSuccess = Box<dyn FnOnce(JValue) + Send>;
pub type OnError = Box<dyn FnOnce(ParticleError) + Send>;

struct Inner {
    fired: AtomicBool,
    on_success: Mutex<Option<OnSuccess>>,
    on_error: Mutex<Option<OnError>>,
}

/// A particle's `onSuccess`/`onError` pair, guarded so exactly one of them
/// ever actually runs — the TTL timer and the pipeline's own completion
/// path both hold a clone and race to call it.
#[derive(Clone)]
pub struct Callbacks(Arc<Inner>);

impl Callbacks {
    pub fn new(on_success: OnSuccess, on_error: OnError) -> Self {
        Self(Arc::new(Inner {
            fired: AtomicBool::new(false),
            on_success: Mutex::new(Some(on_success)),
            on_error: Mutex::new(Some(on_error)),
        }))
    }

    /// A pair of callbacks that do nothing, used for particles arriving
    /// from the network that nobody locally is awaiting.
    pub fn noop() -> Self {
        Self::new(Box::new(|_| {}), Box::new(|_| {}))
    }

    pub fn success(&self, value: JValue) {
        if !self.0.fired.swap(true, Ordering::SeqCst) {
            if let Some(f) = self.0.on_success.lock().take() {
                f(value);
            }
        }
    }

    pub fn error(&self, error: ParticleError) {
        if !self.0.fired.swap(true, Ordering::SeqCst) {
            if let Some(f) = self.0.on_error.lock().take() {
                f(error);
            }
        }
    }

    /// Bridges a live `Callbacks` handle into the one-shot `(OnSuccess,
    /// OnError)` pair [`crate::engine::AquamarineApi::initiate_particle`]
    /// expects, so the same underlying guard can also be reached directly
    /// (e.g. registered as a particle-scope `callbackSrv.response`
    /// handler) without risking a double resolution.
    pub fn into_once_pair(self) -> (OnSuccess, OnError) {
        let success_half = self.clone();
        let error_half = self;
        (
            Box::new(move |v| success_half.success(v)),
            Box::new(move |e| error_half.error(e)),
        )
    }
}

/// One particle delivery waiting to be interpreted: the particle itself,
/// the callbacks that resolve once the engine decides its fate, and
/// whichever call-request results are already known for this
/// interpretation. A fresh arrival carries an empty map; a re-entry
/// produced by a single call request resolving carries that result
/// merged into whatever was known when it was resolved — never the
/// full round joined, per the actor's no-implicit-join dispatch.
pub struct ParticleQueueItem {
    pub particle: Particle,
    pub callbacks: Callbacks,
    pub call_results: HashMap<u32, CallResult>,
}

impl ParticleQueueItem {
    pub fn new(particle: Particle, callbacks: Callbacks) -> Self {
        Self {
            particle,
            callbacks,
            call_results: HashMap::new(),
        }
    }

    pub fn with_call_results(
        particle: Particle,
        callbacks: Callbacks,
        call_results: HashMap<u32, CallResult>,
    ) -> Self {
        Self {
            particle,
            callbacks,
            call_results,
        }
    }
}
