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

mod actor;
mod call_function;
mod deadline;
mod dispatch;
mod engine;
mod error;
mod plumber;
mod queue_item;

pub use call_function::{call_aqua_function, CallArg, CallFunctionError, CallRequest};
pub use dispatch::{call_request_params, interpret_round, resolve_call_request};
pub use engine::{oneshot_callbacks, AquamarineApi};
pub use error::AquamarineApiError;
pub use queue_item::{Callbacks, OnError, OnSuccess, ParticleQueueItem};
