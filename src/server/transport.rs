use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec, LengthDelimitedCodecError};

use crate::common::message::{AgentResponse, RpcError, encode_message};
use crate::handler::context::HandlerContext;
use crate::server::dispatch;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Length-delimited codec with a u32 BE length field, shared by server and client.
pub fn new_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    let mut builder = tokio_util::codec::length_delimited::Builder::new();
    builder.length_field_length(4);
    builder.max_frame_length(max_frame_len);
    builder.new_codec()
}

/// Run the TCP accept loop. For each connection, spawn a task that
/// receives length-delimited frames and forwards them to the dispatcher.
pub async fn serve(listener: TcpListener, handler_ctx: HandlerContext, max_frame_len: usize) -> anyhow::Result<()> {
    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Accept errors are per-connection; keep serving.
                log::error!("Failed to accept connection: {:?}", e);
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };
        log::debug!("Accepted connection from {}", remote);
        let ctx = handler_ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, remote, ctx, max_frame_len).await {
                log::warn!("Connection from {} terminated with error: {:?}", remote, e);
            }
        });
    }
}

/// Handle a single client connection.
async fn handle_connection(stream: TcpStream, remote: SocketAddr, handler_ctx: HandlerContext, max_frame_len: usize) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, new_codec(max_frame_len));

    while let Some(frame) = framed.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) if is_frame_too_long(&e) => {
                log::warn!("Frame from {} exceeds {} bytes, closing", remote, max_frame_len);
                return reject_oversized_frame(framed, max_frame_len).await;
            }
            Err(e) => return Err(e).context("failed to read frame"),
        };
        let response_bytes = dispatch::dispatch_frame(frame.freeze(), &handler_ctx)?;

        log::debug!("Sending response to {}", remote);
        framed.send(response_bytes).await.context("failed to send response")?;
    }
    log::debug!("Client {} disconnected", remote);
    Ok(())
}

fn is_frame_too_long(e: &std::io::Error) -> bool {
    e.get_ref()
        .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>())
}

/// The codec cannot resync past an oversized body, so the connection ends here:
/// answer `InvalidArgument`, half-close, and drain what the peer already sent so
/// the reply is not lost to a reset.
async fn reject_oversized_frame(mut framed: Framed<TcpStream, LengthDelimitedCodec>, max_frame_len: usize) -> anyhow::Result<()> {
    let response = AgentResponse::Error(RpcError::invalid_argument(format!(
        "frame exceeds {} bytes",
        max_frame_len
    )));
    framed
        .send(bytes::Bytes::from(encode_message(&response)?))
        .await
        .context("failed to send response")?;

    let mut stream = framed.into_inner();
    stream.shutdown().await?;
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, tokio::io::copy(&mut stream, &mut tokio::io::sink())).await;
    Ok(())
}
