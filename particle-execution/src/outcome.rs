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

use serde_json::Value as JValue;

use crate::args::{Args, JError};
use crate::function::ParticleParams;

/// Result of dispatching a `call` request to a local handler.
#[derive(Debug)]
pub enum FunctionOutcome {
    /// Handler produced a value.
    Ok(JValue),
    /// Handler ran but had nothing to return (AIR's `op.noop`-style calls).
    Empty,
    /// No handler matched `(service_id, function_name)` for this particle;
    /// carries the inputs back so the caller can try the next resolver in
    /// the chain (particle-scope, then global, then "not found").
    NotDefined {
        args: Args,
        params: ParticleParams,
    },
    /// Handler deliberately rejected the call.
    Err(JError),
}

impl FunctionOutcome {
    pub fn not_err(&self) -> bool {
        !matches!(self, FunctionOutcome::Err(_))
    }

    /// Chains to `f` only if this outcome was `NotDefined`, matching the
    /// particle-scope -> global -> not-found resolution order.
    pub fn or_else(
        self,
        f: impl FnOnce(Args, ParticleParams) -> FunctionOutcome,
    ) -> FunctionOutcome {
        match self {
            FunctionOutcome::NotDefined { args, params } => f(args, params),
            other => other,
        }
    }
}

pub fn ok(value: JValue) -> FunctionOutcome {
    FunctionOutcome::Ok(value)
}

pub fn wrap(result: Result<JValue, JError>) -> FunctionOutcome {
    match result {
        Ok(v) => FunctionOutcome::Ok(v),
        Err(e) => FunctionOutcome::Err(e),
    }
}

pub fn wrap_unit(result: Result<(), JError>) -> FunctionOutcome {
    match result {
        Ok(()) => FunctionOutcome::Empty,
        Err(e) => FunctionOutcome::Err(e),
    }
}
