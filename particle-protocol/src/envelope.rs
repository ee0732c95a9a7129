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

use serde::{Deserialize, Serialize};

use crate::particle::{PeerId, Particle};

/// Protocol spoken on `/fluence/particle/2.0.0`: a length-prefixed UTF-8
/// JSON frame per message. Only one variant exists today, but the
/// `action`-tagged envelope keeps the wire format extensible the way the
/// teacher's `libp2p_protocol::ProtocolMessage` does.
pub const PROTOCOL_NAME: &str = "/fluence/particle/2.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ProtocolMessage {
    Particle(WireParticle),
}

/// On-the-wire shape of a particle: same fields as [`Particle`], named per
/// the spec's `snake_case` wire contract rather than the in-memory
/// `camelCase`-flavoured Rust names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireParticle {
    pub id: String,
    pub init_peer_id: PeerId,
    pub timestamp: u64,
    pub ttl: u32,
    pub script: String,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl From<&Particle> for WireParticle {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id.clone(),
            init_peer_id: p.init_peer_id.clone(),
            timestamp: p.timestamp,
            ttl: p.ttl,
            script: p.script.clone(),
            signature: p.signature.clone(),
            data: p.data.clone(),
        }
    }
}

impl From<WireParticle> for Particle {
    fn from(w: WireParticle) -> Self {
        Particle {
            id: w.id,
            init_peer_id: w.init_peer_id,
            timestamp: w.timestamp,
            ttl: w.ttl,
            script: w.script,
            data: w.data,
            signature: w.signature,
        }
    }
}

impl ProtocolMessage {
    pub fn particle(p: &Particle) -> Self {
        ProtocolMessage::Particle(WireParticle::from(p))
    }

    pub fn into_particle(self) -> Particle {
        match self {
            ProtocolMessage::Particle(w) => w.into(),
        }
    }
}

/// Encodes a message as a length-prefixed (u32 big-endian) JSON frame.
pub fn encode_frame(msg: &ProtocolMessage) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_vec(msg)?;
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Decodes a complete length-prefixed frame (length prefix already
/// stripped by the transport) back into a [`ProtocolMessage`].
pub fn decode_body(body: &[u8]) -> serde_json::Result<ProtocolMessage> {
    serde_json::from_slice(body)
}

mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::PeerKeyPair;

    #[test]
    fn round_trip_through_wire_preserves_fields_and_signature() {
        let kp = PeerKeyPair::generate();
        let p = Particle::create_new("(null)", 7000, &kp).unwrap();

        let msg = ProtocolMessage::particle(&p);
        let frame = encode_frame(&msg).unwrap();

        let len = u32::from_be_bytes(frame[0..4].try_into().unwrap()) as usize;
        let decoded = decode_body(&frame[4..4 + len]).unwrap();
        let p2 = decoded.into_particle();

        assert_eq!(p.id, p2.id);
        assert_eq!(p.init_peer_id, p2.init_peer_id);
        assert_eq!(p.timestamp, p2.timestamp);
        assert_eq!(p.ttl, p2.ttl);
        assert_eq!(p.script, p2.script);
        assert_eq!(p.signature, p2.signature);
        assert!(p2.verify(kp.inner()));
    }
}
