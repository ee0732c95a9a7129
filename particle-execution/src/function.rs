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

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use particle_protocol::ArgTetraplets;

use crate::args::Args;
use crate::outcome::FunctionOutcome;

/// Provenance context threaded alongside every service call: identifies
/// which particle triggered it, without exposing the particle's script or
/// data to the handler.
#[derive(Debug, Clone)]
pub struct ParticleParams {
    pub id: String,
    pub init_peer_id: String,
    pub timestamp: u64,
    pub ttl: u32,
    pub signature: Vec<u8>,
    pub tetraplets: ArgTetraplets,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered service handler. Boxed and `Arc`-shared so the same
/// closure can be installed under more than one (serviceId, fnName) and
/// invoked concurrently from independent signature groups.
pub type ServiceFunction =
    Arc<dyn Fn(Args, ParticleParams) -> BoxFuture<'static, FunctionOutcome> + Send + Sync>;
