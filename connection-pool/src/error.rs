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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("dial to relay {relay} failed: {reason}")]
    DialFailed { relay: String, reason: String },

    #[error("connecting to relay timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("sendParticle is only permitted with next_peer_ids == [relay_peer_id]")]
    UnsupportedRoute,

    #[error("connection not started")]
    NotStarted,

    #[error("send failed: {0}")]
    SendFailed(String),
}
