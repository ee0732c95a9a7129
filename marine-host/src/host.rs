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

use async_trait::async_trait;
use serde_json::Value as JValue;

use crate::error::MarineError;
use crate::outcome::{AvmCallArgs, InterpreterOutcome};

/// Identity bound into the AVM at construction time: current peer id, key
/// format, and the raw secret key bytes the AVM uses to prove it is
/// executing on behalf of this peer.
#[derive(Clone)]
pub struct AvmIdentity {
    pub current_peer_id: String,
    pub key_format: &'static str,
    pub secret_key_bytes: Vec<u8>,
}

/// Capability contract for the Marine WASM runtime: hosts the reserved
/// `"avm"` service (AIR interpreter) plus arbitrary user WASM services,
/// serializing calls per service so no module observes concurrent
/// invocations.
#[async_trait]
pub trait MarineHost: Send + Sync {
    async fn start(&self) -> Result<(), MarineError>;
    async fn stop(&self) -> Result<(), MarineError>;

    /// Registers a user WASM service under `service_id`.
    async fn create_service(&self, wasm_bytes: Vec<u8>, service_id: String)
        -> Result<(), MarineError>;
    async fn remove_service(&self, service_id: &str) -> Result<(), MarineError>;
    fn has_service(&self, service_id: &str) -> bool;

    /// Generic JSON service call, used for user services and for `"ast"`.
    /// `"avm"."invoke"` goes through [`MarineHost::invoke_avm`] instead,
    /// since its wire contract is binary rather than JSON.
    async fn call_service(
        &self,
        service_id: &str,
        fn_name: &str,
        args: Vec<JValue>,
    ) -> Result<JValue, MarineError>;

    /// Typed fast path for the reserved `"avm"."invoke"` function.
    async fn invoke_avm(&self, args: AvmCallArgs) -> Result<InterpreterOutcome, MarineError>;
}
