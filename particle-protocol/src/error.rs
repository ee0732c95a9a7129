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

/// Errors raised synchronously by particle-protocol entry points, never
/// delivered through a particle's `onError` — see particle-execution's
/// `ParticleError` for the engine-side taxonomy.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("particle script must not be empty")]
    EmptyScript,

    #[error("particle ttl must be greater than zero")]
    ZeroTtl,

    #[error("failed to sign particle: {0}")]
    SigningFailed(String),

    #[error("failed to verify particle signature")]
    InvalidSignature,

    #[error("malformed peer id '{0}'")]
    MalformedPeerId(String),
}
