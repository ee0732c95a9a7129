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

use thiserror::Error;

/// Errors delivered through a particle's `onError` callback. Internal to
/// that particle's processing — they never propagate up to the engine or
/// crash the pipeline.
#[derive(Debug, Clone, Error)]
pub enum ParticleError {
    #[error("particle {particle_id} expired")]
    Expiration { particle_id: String },

    #[error("AVM interpretation of particle {particle_id} failed: {message}")]
    Interpreter {
        particle_id: String,
        message: String,
    },

    #[error("failed to send particle {particle_id} onward: {message}")]
    Send {
        particle_id: String,
        message: String,
    },
}

/// Raised synchronously from API entry points (`initiateParticle`,
/// `sendParticle`, `callAquaFunction`), never through a callback.
#[derive(Debug, Clone, Error)]
pub enum UsageError {
    #[error("invalid particle spec: {0}")]
    InvalidParticleSpec(String),

    #[error("unsupported route: sendParticle only allows the relay as the single next hop")]
    UnsupportedRoute,

    #[error("engine is not initialized")]
    NotInitialized,
}

/// A local service handler deliberately rejected a call. Surfaced to AIR
/// as a `retCode=error` result, never to the particle's awaiter directly.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl From<crate::args::JError> for ServiceError {
    fn from(e: crate::args::JError) -> Self {
        ServiceError(e.to_string())
    }
}
