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

#![warn(rust_2018_idioms)]

mod service_host;
mod sig;
mod srv;
mod tracing;

use std::sync::Arc;

use fluence_keypair::KeyPair;

use marine_host::MarineHost;

pub use service_host::ServiceHost;
pub use sig::{DefaultSecurityGuard, SecurityGuard};

/// Registers every built-in service (`sig`, `srv`, `tracing`) as global
/// handlers on `host`. Called once at peer startup.
pub fn register_builtins(host: &ServiceHost, keypair: KeyPair, marine: Arc<dyn MarineHost>) {
    let local_peer_id = keypair.get_peer_id().to_base58();
    let guard = Arc::new(DefaultSecurityGuard { local_peer_id });

    let register_fn = |service_id: &str, fn_name: &str, handler: particle_execution::ServiceFunction| {
        host.register_global_handler(service_id, fn_name, handler);
    };

    sig::register(register_fn, keypair, guard);
    srv::register(register_fn, marine);
    tracing::register(register_fn);
}
