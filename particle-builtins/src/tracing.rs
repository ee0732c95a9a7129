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

use std::sync::Arc;

use particle_execution::{FunctionOutcome, ServiceFunction};

/// `tracing` accepts AIR-emitted span events and records them to the log
/// sink at `trace!` level, tagged with the particle id they came from.
pub fn register(register_fn: impl Fn(&str, &str, ServiceFunction)) {
    register_fn(
        "tracing",
        "add_event",
        Arc::new(|args, params| {
            Box::pin(async move {
                log::trace!(
                    "particle {} span event [{}]: {:?}",
                    params.id,
                    args.function_name,
                    args.function_args
                );
                FunctionOutcome::Empty
            })
        }),
    );
}
