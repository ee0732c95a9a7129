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
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use avm_server::{AVMConfig, CallResults, AVM};
use fluence_app_service::{AppService, AppServiceConfig};
use parking_lot::Mutex;
use serde_json::Value as JValue;

use crate::error::MarineError;
use crate::host::{AvmIdentity, MarineHost};
use crate::outcome::{AvmCallArgs, CallRequestParams, InterpreterOutcome};

/// Data store used by `avm-server` to persist `prevData` between calls.
/// The engine already threads `prevData` explicitly per signature group
/// (see `aquamarine::dispatch`) and passes it on every call, so this store
/// only needs to satisfy `AVM<E>`'s generic bound — it never drives the
/// `prevData` semantics the spec cares about.
#[derive(Default)]
struct PassThroughDataStore;

impl avm_server::AVMDataStore for PassThroughDataStore {
    type Error = std::convert::Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_data(&self, _particle_id: &str) -> Result<Vec<u8>, Self::Error> {
        Ok(Vec::new())
    }

    fn store_data(&mut self, _data: &[u8], _particle_id: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cleanup_data(&mut self, _particle_id: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// `MarineHost` backed by a real `avm-server`-hosted AIR interpreter for
/// the reserved `"avm"` service, and `fluence-app-service`-hosted WASM
/// modules for everything else. Per-service calls are serialized with an
/// internal mutex, matching the "no concurrent invocations on the same
/// module" contract.
pub struct RealMarineHost {
    avm: Mutex<AVM<PassThroughDataStore>>,
    services: Mutex<HashMap<String, Arc<Mutex<AppService>>>>,
    air_wasm_path: PathBuf,
}

impl RealMarineHost {
    pub fn new(identity: AvmIdentity, air_wasm_path: PathBuf) -> Result<Self, MarineError> {
        let config = AVMConfig {
            air_wasm_path: air_wasm_path.clone(),
            current_peer_id: identity.current_peer_id,
            logging_mask: 0,
            data_store: PassThroughDataStore::default(),
        };
        let avm = AVM::new(config).map_err(|e| MarineError::AvmError(e.to_string()))?;

        Ok(Self {
            avm: Mutex::new(avm),
            services: Mutex::new(HashMap::new()),
            air_wasm_path,
        })
    }
}

#[async_trait]
impl MarineHost for RealMarineHost {
    async fn start(&self) -> Result<(), MarineError> {
        log::debug!(
            "marine host starting, avm wasm at {:?}",
            self.air_wasm_path
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), MarineError> {
        self.services.lock().clear();
        Ok(())
    }

    async fn create_service(
        &self,
        wasm_bytes: Vec<u8>,
        service_id: String,
    ) -> Result<(), MarineError> {
        if self.has_service(&service_id) {
            return Err(MarineError::ServiceAlreadyExists(service_id));
        }

        let config = AppServiceConfig::from_bytes(wasm_bytes).map_err(|e| {
            MarineError::ModuleLoadFailed {
                service_id: service_id.clone(),
                message: e.to_string(),
            }
        })?;
        let service = AppService::new_with_empty_facade(config, &service_id, HashMap::new())
            .map_err(|e| MarineError::ModuleLoadFailed {
                service_id: service_id.clone(),
                message: e.to_string(),
            })?;

        self.services
            .lock()
            .insert(service_id, Arc::new(Mutex::new(service)));
        Ok(())
    }

    async fn remove_service(&self, service_id: &str) -> Result<(), MarineError> {
        self.services
            .lock()
            .remove(service_id)
            .ok_or_else(|| MarineError::NoSuchService(service_id.to_string()))?;
        Ok(())
    }

    fn has_service(&self, service_id: &str) -> bool {
        service_id == "avm" || self.services.lock().contains_key(service_id)
    }

    async fn call_service(
        &self,
        service_id: &str,
        fn_name: &str,
        args: Vec<JValue>,
    ) -> Result<JValue, MarineError> {
        if service_id == "avm" {
            // "ast" is the only JSON-speaking "avm" function; "invoke" is
            // typed and goes through `invoke_avm`.
            debug_assert_eq!(fn_name, "ast");
            let script = args
                .first()
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let ast = self
                .avm
                .lock()
                .validate(script)
                .map_err(|e| MarineError::CallFailed {
                    service_id: service_id.to_string(),
                    function_name: fn_name.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(JValue::String(ast));
        }

        let service = self
            .services
            .lock()
            .get(service_id)
            .cloned()
            .ok_or_else(|| MarineError::NoSuchService(service_id.to_string()))?;

        let mut service = service.lock();
        service
            .call(fn_name, JValue::Array(args), <_>::default())
            .map_err(|e| MarineError::CallFailed {
                service_id: service_id.to_string(),
                function_name: fn_name.to_string(),
                message: e.to_string(),
            })
    }

    async fn invoke_avm(&self, args: AvmCallArgs) -> Result<InterpreterOutcome, MarineError> {
        let call_results: CallResults = args
            .call_results
            .into_iter()
            .map(|(key, r)| (key, avm_server::CallServiceResult {
                ret_code: r.ret_code,
                result: r.result,
            }))
            .collect();

        let outcome = self
            .avm
            .lock()
            .call(
                args.script,
                args.prev_data,
                args.current_data,
                args.init_peer_id,
                &args.particle_id,
                call_results,
            )
            .map_err(|e| MarineError::AvmError(e.to_string()))?;

        let call_requests = outcome
            .call_requests
            .into_iter()
            .map(|(key, req)| {
                (
                    key,
                    CallRequestParams {
                        service_id: req.service_id,
                        function_name: req.function_name,
                        arguments: req.arguments,
                        tetraplets: req.tetraplets,
                    },
                )
            })
            .collect();

        Ok(InterpreterOutcome {
            ret_code: outcome.ret_code,
            error_message: outcome.error_message,
            data: outcome.data,
            next_peer_pks: outcome.next_peer_pks,
            call_requests,
        })
    }
}
