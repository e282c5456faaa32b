use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, trace, warn};

use crate::codec::RequestDecoder;
use crate::handler::Handler;
use crate::protocol::{HttpError, Response, SendError};

/// Upper bound on unread request body bytes discarded before closing.
///
/// Closing a socket with unread input makes the kernel send a reset, which
/// can destroy the response still in flight to the client.
pub const MAX_DRAIN_BYTES: u64 = 1024 * 1024;

/// How long a worker waits for unread body bytes once the response is out.
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// A single-exchange HTTP connection.
///
/// [`process`](Self::process) runs the whole exchange:
/// - parse the request, answering `400 Bad Request` if that fails
/// - send `100 Continue` when the client asked for it
/// - call the handler; an error or a panic becomes `500 Internal Server Error`
/// - send the response, shut the writer down, then briefly drain leftover body
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    writer: W,
    decoder: RequestDecoder,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_decoder(reader, writer, RequestDecoder::new())
    }

    pub fn with_decoder(reader: R, writer: W, decoder: RequestDecoder) -> Self {
        Self { reader, writer, decoder }
    }

    pub async fn process<H>(self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let Self { reader, mut writer, decoder } = self;

        let request = match decoder.decode(reader).await {
            Ok(request) => request,
            Err(e) => {
                warn!(cause = %e, "can't parse request");
                Response::bad_request().send(&mut writer).await?;
                close(&mut writer).await?;
                return Err(e.into());
            }
        };

        info!(method = request.method(), path = request.path(), "received request");

        if request.expects_continue() {
            Response::continue_100().send(&mut writer).await?;
            debug!("receive expect request header, sent continue response");
        }

        let body = request.body().clone();

        let response = match AssertUnwindSafe(handler.call(request)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(cause = %e, "handler failed");
                Response::internal_server_error()
            }
            Err(_) => {
                error!("handler panicked");
                Response::internal_server_error()
            }
        };

        let status = response.status();
        response.send(&mut writer).await?;
        info!(status = status.as_u16(), "sent response");

        close(&mut writer).await?;

        // skip body if request handler don't read body; the client has EOF already
        match tokio::time::timeout(DRAIN_TIMEOUT, body.skip(MAX_DRAIN_BYTES)).await {
            Ok(Ok(0)) => {}
            Ok(Ok(skipped)) => trace!(skipped, "drained unread request body"),
            Ok(Err(e)) => debug!(cause = %e, "failed to drain request body"),
            Err(_) => debug!(timeout = ?DRAIN_TIMEOUT, "gave up draining request body"),
        }
        Ok(())
    }
}

async fn close<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), SendError> {
    writer.shutdown().await.map_err(SendError::io)
}
