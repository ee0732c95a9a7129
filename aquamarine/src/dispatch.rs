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

use marine_host::{AvmCallArgs, CallRequestParams, CallResult, InterpreterOutcome, MarineHost};
use particle_builtins::ServiceHost;
use particle_execution::{CallServiceData, CallServiceResult, ParticleParams};
use particle_protocol::Particle;

/// Resolves one outbound `call` request the AVM emitted: Marine-hosted
/// user services first (anything `srv.create`'d), then the local service
/// host (builtins plus any per-particle ephemeral services registered by
/// `call_aqua_function`), and finally a synthesized "no service found"
/// error — the AVM always gets *a* result back, never a hang.
pub async fn resolve_call_request(
    marine: &dyn MarineHost,
    services: &ServiceHost,
    particle: &ParticleParams,
    req: CallRequestParams,
) -> CallServiceResult {
    if req.service_id != "avm" && marine.has_service(&req.service_id) {
        return match marine
            .call_service(&req.service_id, &req.function_name, req.arguments.clone())
            .await
        {
            Ok(value) => CallServiceResult::ok(value),
            Err(e) => CallServiceResult::err(e.to_string()),
        };
    }

    let call = CallServiceData {
        service_id: req.service_id.clone(),
        function_name: req.function_name.clone(),
        arguments: req.arguments,
        tetraplets: req.tetraplets,
        particle: particle.clone(),
    };

    match services.call_service(call).await {
        Some(result) => result,
        None => CallServiceResult::err(format!(
            "no service found for {}.{}",
            req.service_id, req.function_name
        )),
    }
}

/// Builds a [`ParticleParams`] for a call request raised against `particle`.
pub fn call_request_params(particle: &Particle, req: &CallRequestParams) -> ParticleParams {
    ParticleParams {
        id: particle.id.clone(),
        init_peer_id: particle.init_peer_id.as_str().to_string(),
        timestamp: particle.timestamp,
        ttl: particle.ttl,
        signature: particle.signature.clone(),
        tetraplets: req.tetraplets.clone(),
    }
}

/// Invokes `"avm"."invoke"` exactly once for `particle`, passing whichever
/// call-request results are already known. `prev_data` is the signature
/// group's carried-forward interpreter state; it is read but never mutated
/// here — the caller decides whether to adopt `outcome.data` as the new
/// `prev_data`, per the `retCode == 0` rule.
///
/// Deliberately a single invocation, not a loop: when the AVM comes back
/// with outstanding `call_requests`, the caller resolves each independently
/// and feeds the result back as its own re-entry, rather than this
/// function joining the whole round before re-invoking. Joining here is
/// exactly the implicit barrier the actor's dispatch model forbids.
pub async fn interpret_round(
    marine: &dyn MarineHost,
    particle: &Particle,
    prev_data: Vec<u8>,
    call_results: HashMap<u32, CallResult>,
) -> Result<InterpreterOutcome, marine_host::MarineError> {
    let args = AvmCallArgs {
        particle_id: particle.id.clone(),
        init_peer_id: particle.init_peer_id.as_str().to_string(),
        timestamp: particle.timestamp,
        ttl: particle.ttl,
        script: particle.script.clone(),
        prev_data,
        current_data: particle.data.clone(),
        call_results,
    };

    let outcome = marine.invoke_avm(args).await?;

    log::debug!(
        "particle {}: ret_code={} call_requests={} next_peers={}",
        particle.id,
        outcome.ret_code,
        outcome.call_requests.len(),
        outcome.next_peer_pks.len()
    );

    Ok(outcome)
}
