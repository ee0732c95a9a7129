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

use std::time::Duration;

use aquamarine::CallFunctionError;
use connected_client::TestPeer;
use marine_host::done;
use particle_protocol::PeerId;
use serde_json::json;

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..50 {
        if check() {
            return;
        }
        async_std::task::sleep(Duration::from_millis(10)).await;
    }
    assert!(check(), "condition never became true");
}

#[async_std::test]
async fn response_call_resolves_awaiter_with_the_scripted_value() {
    let peer = TestPeer::new(
        "relay",
        vec![
            Box::new(|_| {
                let mut call_requests = std::collections::HashMap::new();
                call_requests.insert(
                    0,
                    marine_host::CallRequestParams {
                        service_id: "callbackSrv".to_string(),
                        function_name: "response".to_string(),
                        arguments: vec![json!("hello")],
                        tetraplets: vec![],
                    },
                );
                marine_host::InterpreterOutcome {
                    ret_code: 0,
                    error_message: String::new(),
                    data: Vec::new(),
                    next_peer_pks: Vec::new(),
                    call_requests,
                }
            }),
            Box::new(|_| done(Vec::new())),
        ],
    );
    peer.start().await;

    let result = peer.call_script("(null)").await.unwrap();
    assert_eq!(result, json!("hello"));

    peer.stop().await;
}

#[async_std::test]
async fn literal_arg_is_threaded_back_through_getdatasrv() {
    let peer = TestPeer::new(
        "relay",
        vec![
            Box::new(|_| {
                let mut call_requests = std::collections::HashMap::new();
                call_requests.insert(
                    0,
                    marine_host::CallRequestParams {
                        service_id: "getDataSrv".to_string(),
                        function_name: "x".to_string(),
                        arguments: vec![],
                        tetraplets: vec![],
                    },
                );
                marine_host::InterpreterOutcome {
                    ret_code: 0,
                    error_message: String::new(),
                    data: Vec::new(),
                    next_peer_pks: Vec::new(),
                    call_requests,
                }
            }),
            Box::new(|args| {
                let echoed = args
                    .call_results
                    .get(&0)
                    .map(|r| r.result.clone())
                    .unwrap_or(serde_json::Value::Null);
                marine_host::InterpreterOutcome {
                    ret_code: 0,
                    error_message: String::new(),
                    data: serde_json::to_vec(&echoed).unwrap(),
                    next_peer_pks: Vec::new(),
                    call_requests: std::collections::HashMap::new(),
                }
            }),
        ],
    );
    peer.start().await;

    let result = peer
        .call(
            aquamarine::CallRequest::new("(null)")
                .with_arg("x", json!(42))
                .fire_and_forget(),
        )
        .await;
    assert!(result.is_ok());
    assert_eq!(peer.marine.invocation_count(), 2);

    peer.stop().await;
}

#[async_std::test]
async fn completed_particle_with_next_hops_is_forwarded_to_the_relay() {
    let peer = TestPeer::new(
        "relay",
        vec![Box::new(|_| marine_host::InterpreterOutcome {
            ret_code: 0,
            error_message: String::new(),
            data: b"forwarded".to_vec(),
            next_peer_pks: vec![PeerId::new("relay").as_str().to_string()],
            call_requests: std::collections::HashMap::new(),
        })],
    );
    peer.start().await;

    peer.call_script("(null)").await.unwrap();

    wait_until(|| peer.connection.sent_particles().len() == 1).await;
    let (next_hops, forwarded) = peer.connection.sent_particles().into_iter().next().unwrap();
    assert_eq!(next_hops, vec![peer.relay_peer_id()]);
    assert_eq!(forwarded.data, b"forwarded".to_vec());

    peer.stop().await;
}

/// A particle whose TTL elapses before the AVM invocation returns must
/// resolve the awaiter with an expiration error rather than hang or
/// deliver a stale result, and its per-particle service scope must not
/// survive the particle.
#[async_std::test]
async fn stalled_invocation_past_ttl_resolves_with_expiration_error() {
    let peer = TestPeer::new_with_invoke_delay(
        "relay",
        vec![Box::new(|_| done(Vec::new()))],
        Duration::from_millis(80),
    );
    peer.start().await;

    let result = peer
        .call(aquamarine::CallRequest::new("(null)").with_ttl(20))
        .await;

    assert!(matches!(result, Err(CallFunctionError::Expiration { .. })));

    peer.stop().await;
}
