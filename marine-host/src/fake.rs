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
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JValue;

use crate::error::MarineError;
use crate::host::MarineHost;
use crate::outcome::{AvmCallArgs, InterpreterOutcome};

/// A scripted interpretation step, returned in FIFO order by
/// [`FakeMarineHost`] regardless of the script text — end-to-end tests
/// drive the engine's pipeline by queuing up the outcomes they want the
/// "AVM" to produce.
pub type ScriptedOutcome = Box<dyn Fn(&AvmCallArgs) -> InterpreterOutcome + Send + Sync>;

/// In-process double for [`MarineHost`] used by `aquamarine`'s end-to-end
/// scenario tests (see spec §8). Never talks to a real WASM module; every
/// `"avm"."invoke"` call is answered by the next scripted closure.
#[derive(Clone)]
pub struct FakeMarineHost {
    steps: Arc<Mutex<Vec<ScriptedOutcome>>>,
    invocations: Arc<Mutex<Vec<AvmCallArgs>>>,
    invoke_delay: Duration,
}

impl FakeMarineHost {
    pub fn new(steps: Vec<ScriptedOutcome>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps)),
            invocations: Arc::new(Mutex::new(Vec::new())),
            invoke_delay: Duration::ZERO,
        }
    }

    /// Makes every `"avm"."invoke"` call sleep for `delay` before consulting
    /// the next scripted step, so tests can stall an interpretation round
    /// long enough for a particle's TTL to elapse around it.
    pub fn with_invoke_delay(mut self, delay: Duration) -> Self {
        self.invoke_delay = delay;
        self
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl MarineHost for FakeMarineHost {
    async fn start(&self) -> Result<(), MarineError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), MarineError> {
        Ok(())
    }

    async fn create_service(
        &self,
        _wasm_bytes: Vec<u8>,
        _service_id: String,
    ) -> Result<(), MarineError> {
        Ok(())
    }

    async fn remove_service(&self, _service_id: &str) -> Result<(), MarineError> {
        Ok(())
    }

    fn has_service(&self, service_id: &str) -> bool {
        service_id == "avm"
    }

    async fn call_service(
        &self,
        service_id: &str,
        fn_name: &str,
        _args: Vec<JValue>,
    ) -> Result<JValue, MarineError> {
        Err(MarineError::CallFailed {
            service_id: service_id.to_string(),
            function_name: fn_name.to_string(),
            message: "FakeMarineHost only answers avm.invoke".to_string(),
        })
    }

    async fn invoke_avm(&self, args: AvmCallArgs) -> Result<InterpreterOutcome, MarineError> {
        if !self.invoke_delay.is_zero() {
            async_std::task::sleep(self.invoke_delay).await;
        }

        self.invocations.lock().push(args.clone());
        let mut steps = self.steps.lock();
        if steps.is_empty() {
            return Err(MarineError::AvmError(
                "FakeMarineHost ran out of scripted steps".to_string(),
            ));
        }
        let outcome = (steps.remove(0))(&args);
        Ok(outcome)
    }
}

/// Builds an [`InterpreterOutcome`] that reports success with no further
/// work: the common "done" outcome in scripted tests.
pub fn done(data: Vec<u8>) -> InterpreterOutcome {
    InterpreterOutcome {
        ret_code: InterpreterOutcome::SUCCESS,
        error_message: String::new(),
        data,
        next_peer_pks: Vec::new(),
        call_requests: HashMap::new(),
    }
}
