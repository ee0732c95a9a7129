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

use serde_json::Value as JValue;
use thiserror::Error;

use particle_builtins::ServiceHost;
use particle_execution::{Args, BoxFuture, FunctionOutcome, ParticleError, ParticleParams};
use particle_protocol::{Particle, PeerKeyPair, ProtocolError};

use crate::engine::{oneshot_callbacks, AquamarineApi};
use crate::error::AquamarineApiError;
use crate::queue_item::Callbacks;

/// One bound argument for [`call_aqua_function`]: either a literal value
/// served by `getDataSrv.<name>`, or a callback invoked through
/// `callbackSrv.<name>` whenever the AIR script calls it.
#[derive(Clone)]
pub enum CallArg {
    Value(JValue),
    Callback(Arc<dyn Fn(Vec<JValue>) -> BoxFuture<'static, JValue> + Send + Sync>),
}

impl From<JValue> for CallArg {
    fn from(value: JValue) -> Self {
        CallArg::Value(value)
    }
}

/// Parameters for one `callAquaFunction` invocation: the script to run,
/// its bound arguments, an optional TTL override, and whether the caller
/// cares about a `response` at all.
pub struct CallRequest {
    script: String,
    ttl: Option<u32>,
    args: HashMap<String, CallArg>,
    fire_and_forget: bool,
}

impl CallRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ttl: None,
            args: HashMap::new(),
            fire_and_forget: false,
        }
    }

    pub fn with_ttl(mut self, ttl_ms: u32) -> Self {
        self.ttl = Some(ttl_ms);
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<CallArg>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn with_callback(
        mut self,
        name: impl Into<String>,
        callback: impl Fn(Vec<JValue>) -> BoxFuture<'static, JValue> + Send + Sync + 'static,
    ) -> Self {
        self.args
            .insert(name.into(), CallArg::Callback(Arc::new(callback)));
        self
    }

    /// Marks this call as void-returning: the awaiter resolves as soon as
    /// the AVM reports no further work, without requiring a `response`
    /// call from the script.
    pub fn fire_and_forget(mut self) -> Self {
        self.fire_and_forget = true;
        self
    }
}

/// Errors `call_aqua_function` can resolve its awaiter with, or raise
/// synchronously before the particle is even handed to the engine.
#[derive(Debug, Error)]
pub enum CallFunctionError {
    #[error(transparent)]
    InvalidParticle(#[from] ProtocolError),

    #[error(transparent)]
    Engine(#[from] AquamarineApiError),

    #[error("particle {particle_id} expired before completion")]
    Expiration { particle_id: String },

    #[error("AIR execution of particle {particle_id} failed: {message}")]
    Interpreter {
        particle_id: String,
        message: String,
    },

    #[error("failed to forward particle {particle_id}: {message}")]
    Send {
        particle_id: String,
        message: String,
    },

    #[error("awaiting particle completion was cancelled")]
    Cancelled,
}

impl From<ParticleError> for CallFunctionError {
    fn from(e: ParticleError) -> Self {
        match e {
            ParticleError::Expiration { particle_id } => {
                CallFunctionError::Expiration { particle_id }
            }
            ParticleError::Interpreter {
                particle_id,
                message,
            } => CallFunctionError::Interpreter {
                particle_id,
                message,
            },
            ParticleError::Send {
                particle_id,
                message,
            } => CallFunctionError::Send {
                particle_id,
                message,
            },
        }
    }
}

fn literal_handler(value: JValue) -> particle_execution::ServiceFunction {
    Arc::new(move |_args: Args, _params: ParticleParams| {
        let value = value.clone();
        Box::pin(async move { FunctionOutcome::Ok(value) })
    })
}

fn callback_handler(
    callback: Arc<dyn Fn(Vec<JValue>) -> BoxFuture<'static, JValue> + Send + Sync>,
) -> particle_execution::ServiceFunction {
    Arc::new(move |args: Args, _params: ParticleParams| {
        let callback = callback.clone();
        Box::pin(async move { FunctionOutcome::Ok(callback(args.function_args).await) })
    })
}

/// Implements the spec's `callAquaFunction`: creates a new particle,
/// registers the per-call ephemeral services described in §4.7 around it
/// (`getDataSrv.<name>` for literal args, `callbackSrv.<name>` for
/// callback args, `getDataSrv.-relay-`, `callbackSrv.response` unless
/// fire-and-forget, and always `errorHandlingSrv.error`), hands the
/// particle to the engine, and awaits exactly one resolution.
pub async fn call_aqua_function(
    engine: &AquamarineApi,
    services: &ServiceHost,
    keypair: &PeerKeyPair,
    default_ttl_ms: u32,
    request: CallRequest,
) -> Result<JValue, CallFunctionError> {
    let particle = Particle::create_new(
        request.script,
        request.ttl.unwrap_or(default_ttl_ms),
        keypair,
    )?;
    let particle_id = particle.id.clone();

    for (name, arg) in request.args {
        match arg {
            CallArg::Value(value) => {
                services.register_particle_scope_handler(
                    particle_id.clone(),
                    "getDataSrv",
                    name.clone(),
                    literal_handler(value),
                );
            }
            CallArg::Callback(callback) => {
                services.register_particle_scope_handler(
                    particle_id.clone(),
                    "callbackSrv",
                    name.clone(),
                    callback_handler(callback),
                );
            }
        }
    }

    services.register_particle_scope_handler(
        particle_id.clone(),
        "getDataSrv",
        "-relay-",
        literal_handler(JValue::String(
            engine.connection().get_relay_peer_id().as_str().to_string(),
        )),
    );

    let (on_success, on_error, completion) = oneshot_callbacks();
    let callbacks = Callbacks::new(on_success, on_error);

    if !request.fire_and_forget {
        let response_callbacks = callbacks.clone();
        services.register_particle_scope_handler(
            particle_id.clone(),
            "callbackSrv",
            "response",
            Arc::new(move |args: Args, _params: ParticleParams| {
                let callbacks = response_callbacks.clone();
                Box::pin(async move {
                    let value = args.function_args.into_iter().next().unwrap_or(JValue::Null);
                    callbacks.success(value);
                    FunctionOutcome::Empty
                })
            }),
        );
    }

    let error_callbacks = callbacks.clone();
    let error_particle_id = particle_id.clone();
    services.register_particle_scope_handler(
        particle_id.clone(),
        "errorHandlingSrv",
        "error",
        Arc::new(move |args: Args, _params: ParticleParams| {
            let callbacks = error_callbacks.clone();
            let particle_id = error_particle_id.clone();
            Box::pin(async move {
                let message = args
                    .function_args
                    .into_iter()
                    .next()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_else(|| "AIR script reported an error".to_string());
                callbacks.error(ParticleError::Interpreter {
                    particle_id,
                    message,
                });
                FunctionOutcome::Empty
            })
        }),
    );

    let (init_success, init_error) = callbacks.into_once_pair();
    engine
        .initiate_particle(particle, init_success, init_error)
        .await?;

    let result = completion.await.map_err(|_| CallFunctionError::Cancelled)?;
    services.remove_particle_scope_handlers(&particle_id);
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use connection_pool::FakeConnection;
    use marine_host::{done, FakeMarineHost};
    use particle_protocol::PeerId;
    use serde_json::json;

    use super::*;
    use crate::engine::AquamarineApi;

    fn test_engine(relay: &str) -> (Arc<AquamarineApi>, Arc<ServiceHost>, PeerKeyPair) {
        let keypair = PeerKeyPair::generate();
        let services = Arc::new(ServiceHost::new());
        let marine = Arc::new(FakeMarineHost::new(vec![Box::new(|_| done(Vec::new()))]));
        let connection = Arc::new(FakeConnection::new(PeerId::new(relay)));
        let engine = Arc::new(AquamarineApi::new(marine, services.clone(), connection));
        (engine, services, keypair)
    }

    #[async_std::test]
    async fn fire_and_forget_resolves_without_response_call() {
        let (engine, services, keypair) = test_engine("relay");
        engine.start().await.unwrap();

        let result = call_aqua_function(
            &engine,
            &services,
            &keypair,
            7000,
            CallRequest::new("(null)").fire_and_forget(),
        )
        .await
        .unwrap();

        assert_eq!(result, JValue::Null);
        engine.stop().await;
    }

    #[async_std::test]
    async fn literal_and_callback_args_resolve_and_get_cleaned_up() {
        let (engine, services, keypair) = test_engine("relay");
        engine.start().await.unwrap();

        let result = call_aqua_function(
            &engine,
            &services,
            &keypair,
            7000,
            CallRequest::new("(null)")
                .with_arg("x", json!(1))
                .with_callback("on_done", |args| {
                    Box::pin(async move { args.into_iter().next().unwrap_or(JValue::Null) })
                })
                .fire_and_forget(),
        )
        .await;

        assert!(result.is_ok());
        engine.stop().await;
    }
}
