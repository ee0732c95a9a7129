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

use serde_json::json;

use marine_host::MarineHost;
use particle_execution::{wrap, wrap_unit, Args, JError, ServiceFunction};

/// Builds the `srv` service's two functions, a thin bridge onto
/// [`MarineHost::create_service`]/[`MarineHost::remove_service`] — the
/// only single-module service lifecycle management this client peer
/// exposes (no blueprint/module-repository machinery, a full relay node
/// concern).
pub fn register(register_fn: impl Fn(&str, &str, ServiceFunction), marine: Arc<dyn MarineHost>) {
    let m = marine.clone();
    register_fn(
        "srv",
        "create",
        Arc::new(move |args, _params| {
            let m = m.clone();
            Box::pin(async move { wrap(create(&*m, args).await) })
        }),
    );

    let m = marine;
    register_fn(
        "srv",
        "remove",
        Arc::new(move |args, _params| {
            let m = m.clone();
            Box::pin(async move { wrap_unit(remove(&*m, args).await) })
        }),
    );
}

async fn create(marine: &dyn MarineHost, args: Args) -> Result<serde_json::Value, JError> {
    let mut it = args.function_args.into_iter();
    let wasm_b64: String = Args::next("wasm_b64", &mut it)?;
    let service_id: Option<String> = Args::next_opt("service_id", &mut it)?;

    let wasm_bytes = base64::decode(wasm_b64).map_err(|e| JError::new(e.to_string()))?;
    let service_id = service_id.unwrap_or_else(|| uuid_like_id(&wasm_bytes));

    marine
        .create_service(wasm_bytes, service_id.clone())
        .await
        .map_err(|e| JError::new(e.to_string()))?;

    Ok(json!(service_id))
}

async fn remove(marine: &dyn MarineHost, args: Args) -> Result<(), JError> {
    let mut it = args.function_args.into_iter();
    let service_id: String = Args::next("service_id", &mut it)?;
    marine
        .remove_service(&service_id)
        .await
        .map_err(|e| JError::new(e.to_string()))
}

/// Deterministic id fallback when the caller doesn't name one: a short
/// hex digest of the module bytes, good enough for a single-peer client
/// that never needs global uniqueness guarantees.
fn uuid_like_id(wasm_bytes: &[u8]) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in wasm_bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    format!("service-{hash:016x}")
}
