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

use fluence_keypair::{KeyPair, Signature};
use serde_json::json;

use particle_execution::{Args, FunctionOutcome, JError, ServiceFunction};

/// Gates `sig.sign`: by default, only allow signing when the calling
/// particle originated locally (`initPeerId == local_peer_id`) and the
/// `data` argument's tetraplet proves it was itself produced locally.
/// Exposed as a trait so embedders can tighten or loosen the policy
/// without touching the dispatch code.
pub trait SecurityGuard: Send + Sync {
    fn allow_sign(&self, args: &Args, init_peer_id: &str) -> bool;
}

pub struct DefaultSecurityGuard {
    pub local_peer_id: String,
}

impl SecurityGuard for DefaultSecurityGuard {
    fn allow_sign(&self, args: &Args, init_peer_id: &str) -> bool {
        if init_peer_id != self.local_peer_id {
            return false;
        }

        match args.tetraplets.first() {
            Some(tetraplets) => tetraplets
                .iter()
                .all(|t| t.peer_pk == self.local_peer_id),
            None => false,
        }
    }
}

/// Builds the `sig` service's three functions: `get_peer_id`, `sign`,
/// `verify`, bound to a peer's root keypair and its security guard.
pub fn register(
    register_fn: impl Fn(&str, &str, ServiceFunction),
    keypair: KeyPair,
    guard: Arc<dyn SecurityGuard>,
) {
    let kp = keypair.clone();
    register_fn(
        "sig",
        "get_peer_id",
        Arc::new(move |_args, _params| {
            let kp = kp.clone();
            Box::pin(async move { FunctionOutcome::Ok(json!(kp.get_peer_id().to_base58())) })
        }),
    );

    let kp = keypair.clone();
    let guard_for_sign = guard;
    register_fn(
        "sig",
        "sign",
        Arc::new(move |args, params| {
            let kp = kp.clone();
            let guard = guard_for_sign.clone();
            Box::pin(async move { FunctionOutcome::Ok(sign(&kp, &*guard, args, &params.init_peer_id)) })
        }),
    );

    let kp = keypair;
    register_fn(
        "sig",
        "verify",
        Arc::new(move |args, _params| {
            let kp = kp.clone();
            Box::pin(async move { FunctionOutcome::Ok(json!(verify(&kp, args))) })
        }),
    );
}

fn sign(kp: &KeyPair, guard: &dyn SecurityGuard, args: Args, init_peer_id: &str) -> serde_json::Value {
    if !guard.allow_sign(&args, init_peer_id) {
        return json!({"success": false, "error": "forbidden", "signature": []});
    }

    let result: Result<Vec<u8>, JError> = (|| {
        let mut it = args.function_args.into_iter();
        let data: Vec<u8> = Args::next("data", &mut it)?;
        kp.sign(&data)
            .map(|s| s.to_vec())
            .map_err(|e| JError::new(e.to_string()))
    })();

    match result {
        Ok(signature) => json!({"success": true, "error": [], "signature": vec![signature]}),
        Err(e) => json!({"success": false, "error": vec![e.to_string()], "signature": []}),
    }
}

fn verify(kp: &KeyPair, args: Args) -> bool {
    let mut it = args.function_args.into_iter();
    let signature: Vec<u8> = match Args::next("signature", &mut it) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let data: Vec<u8> = match Args::next("data", &mut it) {
        Ok(d) => d,
        Err(_) => return false,
    };

    let signature = Signature::from_bytes(kp.public().get_key_format(), signature);
    kp.public().verify(&data, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_execution::ParticleParams;
    use particle_protocol::SecurityTetraplet;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn params(init_peer_id: &str) -> ParticleParams {
        ParticleParams {
            id: "p1".to_string(),
            init_peer_id: init_peer_id.to_string(),
            timestamp: 0,
            ttl: 7000,
            signature: vec![],
            tetraplets: vec![],
        }
    }

    #[async_std::test]
    async fn foreign_init_peer_is_denied() {
        let kp = KeyPair::generate_ed25519();
        let guard = Arc::new(DefaultSecurityGuard {
            local_peer_id: kp.get_peer_id().to_base58(),
        });

        let fns: Mutex<HashMap<(String, String), ServiceFunction>> = Mutex::new(HashMap::new());
        register(
            |s, f, h| {
                fns.lock().unwrap().insert((s.to_string(), f.to_string()), h);
            },
            kp.clone(),
            guard,
        );

        let sign_fn = fns
            .lock()
            .unwrap()
            .get(&("sig".to_string(), "sign".to_string()))
            .unwrap()
            .clone();

        let args = Args {
            service_id: "sig".to_string(),
            function_name: "sign".to_string(),
            function_args: vec![json!(vec![1u8, 2, 3])],
            tetraplets: vec![vec![SecurityTetraplet::new("other", "svc", "f", "")]],
        };

        let outcome = sign_fn(args, params("someone-else")).await;
        match outcome {
            FunctionOutcome::Ok(v) => assert_eq!(v["success"], json!(false)),
            _ => panic!("expected Ok outcome carrying success:false"),
        }
    }
}
