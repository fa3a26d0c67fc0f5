//! Line-oriented transport to an out-of-process UI runtime.
//!
//! Scripts go out one per line; responses come back one JSON
//! [`ResponseEnvelope`] per line.

use crate::framework::core::ResponseEnvelope;
use crate::framework::runtime::ScriptStream;
use crate::server::intake::Responder;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::StreamExt;

/// Write every script from `scripts` to `writer`, one per line
pub async fn write_scripts<W>(mut scripts: ScriptStream, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(script) = scripts.next().await {
        writer.write_all(script.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Read response envelopes until EOF and deliver them.
///
/// Returns how many responses reached a waiting request.
pub async fn read_responses<R>(reader: R, responder: Responder) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut delivered = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope = match ResponseEnvelope::from_json(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("⚠️  Skipping malformed response line: {}", e);
                continue;
            }
        };

        let (id, record) = envelope.into_parts();
        match responder.respond_record(id, record) {
            Ok(()) => delivered += 1,
            Err(e) => log::warn!("⚠️  {}", e),
        }
    }

    Ok(delivered)
}
