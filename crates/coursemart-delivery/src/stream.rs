//! Chunked emission of a byte span.
//!
//! [`chunk_stream`] seeks an exclusively owned reader to the start of a span
//! and returns a lazy stream of fixed-size chunks that ends exactly after the
//! last byte of the span. The reader lives inside the stream: it is closed
//! when the span is exhausted, when a read fails, or when the consumer drops
//! the stream early (a client hanging up).
//!
//! A read failure is yielded once as an error item and ends the stream. A
//! blob that turns out shorter than announced is a failure too
//! (`UnexpectedEof`); bytes are never silently missing from a body whose
//! length has already been sent.

use std::io::{self, SeekFrom};

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use coursemart_core::{BlobReader, DeliveryError};

use crate::range::ByteSpan;

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

pub type ChunkStream = BoxStream<'static, io::Result<Bytes>>;

struct Transfer {
    reader: Box<dyn BlobReader>,
    remaining: u64,
    chunk_size: usize,
    failed: bool,
}

impl Drop for Transfer {
    fn drop(&mut self) {
        if self.remaining > 0 && !self.failed {
            tracing::debug!(remaining = self.remaining, "transfer dropped before completion");
        }
    }
}

/// Open a stream over `span` of `reader`.
///
/// `None` yields an empty stream without touching the reader, which is what
/// a full-body request for an empty blob needs.
///
/// # Errors
///
/// Fails with [`DeliveryError::Io`] if the initial seek fails; nothing has
/// been emitted at that point.
pub async fn chunk_stream(
    mut reader: Box<dyn BlobReader>,
    span: Option<ByteSpan>,
    chunk_size: usize,
) -> Result<ChunkStream, DeliveryError> {
    let Some(span) = span else {
        return Ok(stream::empty().boxed());
    };

    reader.seek(SeekFrom::Start(span.start)).await?;

    let transfer = Transfer {
        reader,
        remaining: span.len(),
        chunk_size: chunk_size.max(1),
        failed: false,
    };

    Ok(stream::try_unfold(transfer, next_chunk).boxed())
}

async fn next_chunk(mut transfer: Transfer) -> io::Result<Option<(Bytes, Transfer)>> {
    if transfer.remaining == 0 {
        return Ok(None);
    }

    let want = transfer.remaining.min(transfer.chunk_size as u64) as usize;
    let mut buf = vec![0u8; want];

    if let Err(e) = transfer.reader.read_exact(&mut buf).await {
        transfer.failed = true;
        tracing::warn!(
            error = %e,
            remaining = transfer.remaining,
            "content read failed mid-transfer"
        );
        return Err(e);
    }

    transfer.remaining -= want as u64;
    Ok(Some((Bytes::from(buf), transfer)))
}
