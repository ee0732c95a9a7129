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

use serde::Serialize;
use serde_json::Value as JValue;
use thiserror::Error;

use particle_protocol::ArgTetraplets;

/// Error returned by a handler to the AVM, carried back as a `retCode=error`
/// result's `result` field. Round-trips through JSON so handlers can return
/// it as-is from a `?`.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct JError {
    message: String,
}

impl JError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<JError> for JValue {
    fn from(e: JError) -> Self {
        JValue::String(e.message)
    }
}

impl From<serde_json::Error> for JError {
    fn from(e: serde_json::Error) -> Self {
        JError::new(e.to_string())
    }
}

/// A decoded `call` request's arguments, as handed to a registered service
/// function: the `(serviceId, fnName)` pair plus the positional JSON
/// arguments and their tetraplets.
#[derive(Debug, Clone)]
pub struct Args {
    pub service_id: String,
    pub function_name: String,
    pub function_args: Vec<JValue>,
    pub tetraplets: ArgTetraplets,
}

impl Args {
    /// Pulls the next positional argument, decoding it into `T`, failing
    /// with a named [`JError`] if there is none or it doesn't decode.
    pub fn next<T: serde::de::DeserializeOwned>(
        name: &str,
        args: &mut std::vec::IntoIter<JValue>,
    ) -> Result<T, JError> {
        let value = args
            .next()
            .ok_or_else(|| JError::new(format!("missing argument '{name}'")))?;
        serde_json::from_value(value)
            .map_err(|e| JError::new(format!("argument '{name}' has wrong type: {e}")))
    }

    /// Like [`Args::next`], but the argument may legitimately be absent.
    pub fn next_opt<T: serde::de::DeserializeOwned>(
        name: &str,
        args: &mut std::vec::IntoIter<JValue>,
    ) -> Result<Option<T>, JError> {
        match args.next() {
            None => Ok(None),
            Some(JValue::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| JError::new(format!("argument '{name}' has wrong type: {e}"))),
        }
    }
}
