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

mod error;
mod fake;
mod host;
mod outcome;
mod real;

pub use error::MarineError;
pub use fake::{done, FakeMarineHost, ScriptedOutcome};
pub use host::{AvmIdentity, MarineHost};
pub use outcome::{AvmCallArgs, CallRequestParams, CallResult, InterpreterOutcome};
pub use real::RealMarineHost;
