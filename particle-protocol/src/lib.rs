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

#![warn(rust_2018_idioms)]

mod envelope;
mod error;
mod keypair;
mod particle;
mod tetraplet;

pub use envelope::{decode_body, encode_frame, ProtocolMessage, WireParticle, PROTOCOL_NAME};
pub use error::ProtocolError;
pub use keypair::PeerKeyPair;
pub use particle::{PeerId, Particle};
pub use tetraplet::{ArgTetraplets, SecurityTetraplet};
