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

use serde::{Deserialize, Serialize};
use serde_json::Value as JValue;

use particle_protocol::ArgTetraplets;

use crate::function::ParticleParams;

/// A single outbound `call` request emitted by the AVM, identified by the
/// `u32` key the AVM itself assigned it (used to correlate the result on
/// re-entry).
#[derive(Debug, Clone)]
pub struct CallServiceData {
    pub service_id: String,
    pub function_name: String,
    pub arguments: Vec<JValue>,
    pub tetraplets: ArgTetraplets,
    pub particle: ParticleParams,
}

/// `retCode = 0` is success, anything else is an AIR-visible error; `result`
/// is the JSON payload either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallServiceResult {
    pub ret_code: i32,
    pub result: JValue,
}

impl CallServiceResult {
    pub const SUCCESS: i32 = 0;
    pub const ERROR: i32 = 1;

    pub fn ok(result: JValue) -> Self {
        Self {
            ret_code: Self::SUCCESS,
            result,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ret_code: Self::ERROR,
            result: JValue::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.ret_code == Self::SUCCESS
    }
}
