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

use std::io;

use async_trait::async_trait;
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use libp2p::core::ProtocolName;
use libp2p::request_response::RequestResponseCodec;

use particle_protocol::{Particle, ProtocolMessage, PROTOCOL_NAME};

/// Names the one wire protocol this crate speaks, `/fluence/particle/2.0.0`.
#[derive(Debug, Clone, Default)]
pub struct ParticleProtocol;

impl ProtocolName for ParticleProtocol {
    fn protocol_name(&self) -> &[u8] {
        PROTOCOL_NAME.as_bytes()
    }
}

/// A request carries one particle; the response is a unit ack confirming
/// delivery to the remote inbound handler, never a particle of its own —
/// particles arriving on an inbound stream are surfaced to
/// [`crate::Connection::particle_source`] independently of any reply.
#[derive(Debug, Clone, Default)]
pub struct ParticleCodec;

#[async_trait]
impl RequestResponseCodec for ParticleCodec {
    type Protocol = ParticleProtocol;
    type Request = Particle;
    type Response = ();

    async fn read_request<T>(
        &mut self,
        _: &Self::Protocol,
        io: &mut T,
    ) -> io::Result<Self::Request>
    where
        T: AsyncRead + Unpin + Send,
    {
        let body = read_frame(io).await?;
        let message = particle_protocol::decode_body(&body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(message.into_particle())
    }

    async fn read_response<T>(
        &mut self,
        _: &Self::Protocol,
        io: &mut T,
    ) -> io::Result<Self::Response>
    where
        T: AsyncRead + Unpin + Send,
    {
        let _ = read_frame(io).await?;
        Ok(())
    }

    async fn write_request<T>(
        &mut self,
        _: &Self::Protocol,
        io: &mut T,
        particle: Self::Request,
    ) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        let message = ProtocolMessage::Particle((&particle).into());
        let frame = particle_protocol::encode_frame(&message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        io.write_all(&frame).await?;
        io.close().await
    }

    async fn write_response<T>(
        &mut self,
        _: &Self::Protocol,
        io: &mut T,
        _: Self::Response,
    ) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        io.write_all(&0u32.to_be_bytes()).await?;
        io.close().await
    }
}

async fn read_frame<T: AsyncRead + Unpin + Send>(io: &mut T) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    io.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    io.read_exact(&mut body).await?;
    Ok(body)
}
