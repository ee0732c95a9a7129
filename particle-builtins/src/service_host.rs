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

use parking_lot::RwLock;

use particle_execution::{Args, CallServiceData, CallServiceResult, FunctionOutcome, ServiceFunction};

/// A single service's registered functions, plus an optional catch-all for
/// function-name mismatches, mirroring the teacher's `CustomService`
/// shape (`particle-builtins/src/builtins.rs`).
#[derive(Default)]
struct CustomService {
    functions: HashMap<String, ServiceFunction>,
    unhandled: Option<ServiceFunction>,
}

type ServiceMap = HashMap<String, CustomService>;

/// In-process registry of local service handlers: one table of handlers
/// available to every particle, and one side-table of handlers scoped to
/// a single particle id. Particle-scope handlers shadow global ones for
/// that particle only, and are dropped on expiration or terminal
/// completion so closures never outlive their particle's TTL.
#[derive(Default)]
pub struct ServiceHost {
    global: RwLock<ServiceMap>,
    particle_scoped: RwLock<HashMap<String, ServiceMap>>,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_global_handler(
        &self,
        service_id: impl Into<String>,
        fn_name: impl Into<String>,
        handler: ServiceFunction,
    ) {
        let mut global = self.global.write();
        global
            .entry(service_id.into())
            .or_default()
            .functions
            .insert(fn_name.into(), handler);
    }

    pub fn register_particle_scope_handler(
        &self,
        particle_id: impl Into<String>,
        service_id: impl Into<String>,
        fn_name: impl Into<String>,
        handler: ServiceFunction,
    ) {
        let mut scoped = self.particle_scoped.write();
        scoped
            .entry(particle_id.into())
            .or_default()
            .entry(service_id.into())
            .or_default()
            .functions
            .insert(fn_name.into(), handler);
    }

    /// Drops every handler scoped to `particle_id`. Called on expiration
    /// or terminal completion of that particle.
    pub fn remove_particle_scope_handlers(&self, particle_id: &str) {
        self.particle_scoped.write().remove(particle_id);
    }

    /// True if any function is registered under `service_id`, in either
    /// scope — used by the engine to decide whether a call request should
    /// be routed here at all before falling through to Marine.
    pub fn has_service(&self, particle_id: &str, service_id: &str) -> bool {
        self.particle_scoped
            .read()
            .get(particle_id)
            .map(|m| m.contains_key(service_id))
            .unwrap_or(false)
            || self.global.read().contains_key(service_id)
    }

    fn resolve(&self, particle_id: &str, service_id: &str, fn_name: &str) -> Option<ServiceFunction> {
        if let Some(f) = self.particle_scoped.read().get(particle_id).and_then(|m| {
            m.get(service_id)
                .and_then(|s| s.functions.get(fn_name).or(s.unhandled.as_ref()))
                .cloned()
        }) {
            return Some(f);
        }

        self.global.read().get(service_id).and_then(|s| {
            s.functions.get(fn_name).or(s.unhandled.as_ref()).cloned()
        })
    }

    /// Dispatches a call request. Particle-scope handlers take precedence
    /// over global ones for that particle id. Returns `None` when nothing
    /// matches, so the engine can fabricate a "no service found" error.
    pub async fn call_service(&self, req: CallServiceData) -> Option<CallServiceResult> {
        let handler = self.resolve(&req.particle.id, &req.service_id, &req.function_name)?;

        let args = Args {
            service_id: req.service_id,
            function_name: req.function_name,
            function_args: req.arguments,
            tetraplets: req.tetraplets,
        };

        let outcome = handler(args, req.particle).await;
        Some(match outcome {
            FunctionOutcome::Ok(v) => CallServiceResult::ok(v),
            FunctionOutcome::Empty => CallServiceResult::ok(serde_json::Value::Null),
            FunctionOutcome::Err(e) => CallServiceResult::err(e.to_string()),
            FunctionOutcome::NotDefined { .. } => {
                CallServiceResult::err("no handler produced a result".to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_execution::ParticleParams;
    use serde_json::json;
    use std::sync::Arc;

    fn particle(id: &str) -> ParticleParams {
        ParticleParams {
            id: id.to_string(),
            init_peer_id: "init".to_string(),
            timestamp: 0,
            ttl: 7000,
            signature: vec![],
            tetraplets: vec![],
        }
    }

    fn echo_handler(tag: &'static str) -> ServiceFunction {
        Arc::new(move |_args, _params| {
            Box::pin(async move { FunctionOutcome::Ok(json!(tag)) })
        })
    }

    #[async_std::test]
    async fn particle_scope_shadows_global_for_same_particle_only() {
        let host = ServiceHost::new();
        host.register_global_handler("svc", "f", echo_handler("global"));
        host.register_particle_scope_handler("p1", "svc", "f", echo_handler("scoped"));

        let req = |pid: &str| CallServiceData {
            service_id: "svc".to_string(),
            function_name: "f".to_string(),
            arguments: vec![],
            tetraplets: vec![],
            particle: particle(pid),
        };

        let r1 = host.call_service(req("p1")).await.unwrap();
        assert_eq!(r1.result, json!("scoped"));

        let r2 = host.call_service(req("p2")).await.unwrap();
        assert_eq!(r2.result, json!("global"));
    }

    #[async_std::test]
    async fn unknown_service_returns_none() {
        let host = ServiceHost::new();
        let req = CallServiceData {
            service_id: "nope".to_string(),
            function_name: "f".to_string(),
            arguments: vec![],
            tetraplets: vec![],
            particle: particle("p1"),
        };
        assert!(host.call_service(req).await.is_none());
    }

    #[async_std::test]
    async fn removing_particle_scope_drops_only_that_particle() {
        let host = ServiceHost::new();
        host.register_particle_scope_handler("p1", "svc", "f", echo_handler("scoped"));
        host.remove_particle_scope_handlers("p1");

        assert!(!host.has_service("p1", "svc"));
    }
}
