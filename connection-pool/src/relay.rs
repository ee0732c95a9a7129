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

//! A [`Connection`] backed by a real libp2p swarm, dialing exactly one
//! relay and speaking [`ParticleProtocol`] over it via `request-response`.
//! Modeled on the teacher's `connection-pool` purpose note ("Particle
//! source/sink over the relay transport") and the general transport-build
//! shape used workspace-wide (TCP + Noise + Yamux/Mplex, matching the
//! `libp2p` features this workspace enables). The teacher's own
//! `connection-pool` source was not present in the retrieval pack, so the
//! swarm plumbing below is a best-effort rendition of the standard
//! `libp2p` 0.48 `request_response` idiom rather than a line-for-line port.

use std::time::Duration;

use async_std::channel::{self, Receiver, Sender};
use async_std::future::timeout;
use async_std::task::JoinHandle;
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::{FutureExt, StreamExt};
use libp2p::core::upgrade;
use libp2p::core::Transport;
use libp2p::noise;
use libp2p::request_response::{
    ProtocolSupport, RequestResponse, RequestResponseConfig, RequestResponseEvent,
    RequestResponseMessage,
};
use libp2p::swarm::{Swarm, SwarmBuilder, SwarmEvent};
use libp2p::{identity, mplex, yamux, Multiaddr, PeerId as Libp2pPeerId};

use particle_protocol::{Particle, PeerId};

use crate::codec::{ParticleCodec, ParticleProtocol};
use crate::connection::{check_relay_route, Connection};
use crate::error::ConnectionError;

type Behaviour = RequestResponse<ParticleCodec>;

enum Command {
    Send {
        particle: Particle,
        respond_to: oneshot::Sender<Result<(), ConnectionError>>,
    },
}

pub struct RelayConnection {
    relay_peer_id: PeerId,
    relay_peer_id_libp2p: Libp2pPeerId,
    relay_addr: Multiaddr,
    keypair: identity::Keypair,
    dial_timeout: Duration,
    commands: Sender<Command>,
    command_rx: std::sync::Mutex<Option<Receiver<Command>>>,
    particles: Receiver<Particle>,
    particle_tx: Sender<Particle>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RelayConnection {
    pub fn new(keypair: identity::Keypair, relay_addr: Multiaddr, dial_timeout: Duration) -> Self {
        let relay_peer_id_libp2p = extract_peer_id(&relay_addr)
            .unwrap_or_else(|| Libp2pPeerId::from_public_key(&keypair.public()));
        let relay_peer_id = PeerId::new(relay_peer_id_libp2p.to_base58());

        let (commands, command_rx) = channel::unbounded();
        let (particle_tx, particles) = channel::unbounded();

        Self {
            relay_peer_id,
            relay_peer_id_libp2p,
            relay_addr,
            keypair,
            dial_timeout,
            commands,
            command_rx: std::sync::Mutex::new(Some(command_rx)),
            particles,
            particle_tx,
            task: std::sync::Mutex::new(None),
        }
    }

    fn build_swarm(&self) -> Swarm<Behaviour> {
        let transport = {
            let noise_keys = noise::Keypair::<noise::X25519Spec>::new()
                .into_authentic(&self.keypair)
                .expect("signing libp2p-noise static keypair failed");

            libp2p::tcp::TcpTransport::new(libp2p::tcp::GenTcpConfig::default())
                .upgrade(upgrade::Version::V1)
                .authenticate(noise::NoiseConfig::xx(noise_keys).into_authenticated())
                .multiplex(upgrade::SelectUpgrade::new(
                    yamux::YamuxConfig::default(),
                    mplex::MplexConfig::default(),
                ))
                .boxed()
        };

        let behaviour = RequestResponse::new(
            ParticleCodec,
            std::iter::once((ParticleProtocol, ProtocolSupport::Full)),
            RequestResponseConfig::default(),
        );

        let local_peer_id = Libp2pPeerId::from_public_key(&self.keypair.public());
        SwarmBuilder::new(transport, behaviour, local_peer_id)
            .executor(Box::new(|fut| {
                async_std::task::spawn(fut);
            }))
            .build()
    }
}

#[async_trait]
impl Connection for RelayConnection {
    async fn start(&self) -> Result<(), ConnectionError> {
        log::info!("dialing relay {} at {}", self.relay_peer_id, self.relay_addr);

        let mut swarm = self.build_swarm();
        swarm
            .dial(self.relay_addr.clone())
            .map_err(|e| ConnectionError::DialFailed {
                relay: self.relay_addr.to_string(),
                reason: e.to_string(),
            })?;

        let connected = timeout(self.dial_timeout, async {
            loop {
                match swarm.select_next_some().await {
                    SwarmEvent::ConnectionEstablished { peer_id, .. }
                        if peer_id == self.relay_peer_id_libp2p =>
                    {
                        return;
                    }
                    _ => continue,
                }
            }
        })
        .await;

        if connected.is_err() {
            log::warn!(
                "connecting to relay {} timed out after {:?}",
                self.relay_peer_id,
                self.dial_timeout
            );
            return Err(ConnectionError::Timeout(self.dial_timeout));
        }

        log::info!("connected to relay {}", self.relay_peer_id);

        let mut command_rx = self
            .command_rx
            .lock()
            .expect("command_rx mutex poisoned")
            .take()
            .expect("start() called twice");
        let particle_tx = self.particle_tx.clone();
        let relay_peer_id_libp2p = self.relay_peer_id_libp2p;

        let handle = async_std::task::spawn(async move {
            let mut pending: Vec<oneshot::Sender<Result<(), ConnectionError>>> = Vec::new();
            loop {
                futures::select! {
                    cmd = command_rx.next().fuse() => {
                        match cmd {
                            Some(Command::Send { particle, respond_to }) => {
                                swarm.behaviour_mut().send_request(&relay_peer_id_libp2p, particle);
                                pending.push(respond_to);
                            }
                            None => break,
                        }
                    }
                    event = swarm.select_next_some() => {
                        if let SwarmEvent::Behaviour(RequestResponseEvent::Message { message, .. }) = event {
                            match message {
                                RequestResponseMessage::Request { request, channel, .. } => {
                                    let _ = particle_tx.send(request).await;
                                    let _ = swarm.behaviour_mut().send_response(channel, ());
                                }
                                RequestResponseMessage::Response { .. } => {
                                    if let Some(respond_to) = pending.pop() {
                                        let _ = respond_to.send(Ok(()));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        *self.task.lock().expect("task mutex poisoned") = Some(handle);
        Ok(())
    }

    async fn stop(&self) {
        log::info!("disconnecting from relay {}", self.relay_peer_id);
        self.commands.close();
        if let Some(handle) = self.task.lock().expect("task mutex poisoned").take() {
            handle.await;
        }
    }

    fn supports_relay(&self) -> bool {
        true
    }

    fn get_relay_peer_id(&self) -> PeerId {
        self.relay_peer_id.clone()
    }

    async fn send_particle(
        &self,
        next_peer_ids: &[PeerId],
        particle: Particle,
    ) -> Result<(), ConnectionError> {
        check_relay_route(next_peer_ids, &self.relay_peer_id)?;

        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(Command::Send {
                particle,
                respond_to,
            })
            .await
            .map_err(|e| ConnectionError::SendFailed(e.to_string()))?;

        response
            .await
            .map_err(|e| ConnectionError::SendFailed(e.to_string()))?
    }

    fn particle_source(&self) -> Receiver<Particle> {
        self.particles.clone()
    }
}

fn extract_peer_id(addr: &Multiaddr) -> Option<Libp2pPeerId> {
    addr.iter().find_map(|p| match p {
        libp2p::multiaddr::Protocol::P2p(hash) => Libp2pPeerId::from_multihash(hash).ok(),
        _ => None,
    })
}
