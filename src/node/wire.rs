//! Wire framing: a 12-byte zero-padded ASCII command name followed by a
//! bincode-encoded payload, one message per TCP connection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Decode a bincode-encoded payload body read via [`read_message`].
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let (payload, _) = bincode::serde::decode_from_slice(body, bincode::config::standard())?;
    Ok(payload)
}

pub const COMMAND_LENGTH: usize = 12;

pub fn command_to_bytes(command: &str) -> [u8; COMMAND_LENGTH] {
    let mut bytes = [0u8; COMMAND_LENGTH];
    let name = command.as_bytes();
    let len = name.len().min(COMMAND_LENGTH);
    bytes[..len].copy_from_slice(&name[..len]);
    bytes
}

pub fn bytes_to_command(bytes: &[u8; COMMAND_LENGTH]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(COMMAND_LENGTH);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Write `command`'s 12-byte header followed by `payload` bincode-encoded.
pub async fn write_message<W, T>(stream: &mut W, command: &str, payload: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let header = command_to_bytes(command);
    let body = bincode::serde::encode_to_vec(payload, bincode::config::standard())?;
    stream.write_all(&header).await?;
    stream.write_all(&body).await?;
    stream.flush().await?;
    Ok(())
}

/// Read a command header followed by the remainder of the stream as the
/// payload body. Callers decode the body per the command name.
pub async fn read_message<R>(stream: &mut R) -> Result<(String, Vec<u8>)>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; COMMAND_LENGTH];
    stream.read_exact(&mut header).await.map_err(|e| {
        Error::ProtocolError(format!("failed to read command header: {e}"))
    })?;
    let command = bytes_to_command(&header);

    let mut body = Vec::new();
    stream.read_to_end(&mut body).await?;
    Ok((command, body))
}
