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

#[derive(Debug, Error)]
pub enum MarineError {
    #[error("no service registered under id '{0}'")]
    NoSuchService(String),

    #[error("service '{0}' is already registered")]
    ServiceAlreadyExists(String),

    #[error("AVM invocation failed: {0}")]
    AvmError(String),

    #[error("service call to '{service_id}.{function_name}' failed: {message}")]
    CallFailed {
        service_id: String,
        function_name: String,
        message: String,
    },

    #[error("failed to load wasm module for service '{service_id}': {message}")]
    ModuleLoadFailed { service_id: String, message: String },
}
