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

use serde::{Deserialize, Serialize};
use serde_json::Value as JValue;

/// Arguments for one `"avm"."invoke"` call. Fields that are stable for the
/// lifetime of the VM (current peer id, key format, secret key bytes) are
/// bound at construction time via [`crate::host::AvmIdentity`] instead of
/// being threaded through every call, matching how `avm-server` itself
/// separates `AVMConfig` from the per-call arguments.
#[derive(Debug, Clone)]
pub struct AvmCallArgs {
    pub particle_id: String,
    pub init_peer_id: String,
    pub timestamp: u64,
    pub ttl: u32,
    pub script: String,
    pub prev_data: Vec<u8>,
    pub current_data: Vec<u8>,
    pub call_results: HashMap<u32, CallResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResult {
    pub ret_code: i32,
    pub result: JValue,
}

/// One outbound `call` request the AVM wants serviced, keyed by the `u32`
/// the AVM assigned it.
#[derive(Debug, Clone, Deserialize)]
pub struct CallRequestParams {
    pub service_id: String,
    pub function_name: String,
    pub arguments: Vec<JValue>,
    pub tetraplets: Vec<Vec<particle_protocol::SecurityTetraplet>>,
}

/// Deserialized `avm_server::AVMOutcome`-shaped result of one interpretation
/// round. Mirrors the corpus's `InterpreterResult`/`AVMOutcome` exactly:
/// `ret_code`, `data`, `next_peer_pks`, `call_requests`.
#[derive(Debug, Clone)]
pub struct InterpreterOutcome {
    pub ret_code: i32,
    pub error_message: String,
    pub data: Vec<u8>,
    pub next_peer_pks: Vec<String>,
    pub call_requests: HashMap<u32, CallRequestParams>,
}

impl InterpreterOutcome {
    pub const SUCCESS: i32 = 0;

    pub fn is_success(&self) -> bool {
        self.ret_code == Self::SUCCESS
    }
}
