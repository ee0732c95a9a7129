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

use connection_pool::ConnectionError;
use marine_host::MarineError;
use particle_execution::UsageError;

/// Raised synchronously from this crate's public API (`start`, `stop`,
/// `initiate_particle`, `call_aqua_function`). Never delivered through a
/// particle's `onError` — that's [`particle_execution::ParticleError`]'s
/// job.
#[derive(Debug, Error)]
pub enum AquamarineApiError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("failed to start the marine host: {0}")]
    MarineStart(#[from] MarineError),

    #[error("failed to start the relay connection: {0}")]
    ConnectionStart(#[from] ConnectionError),
}
