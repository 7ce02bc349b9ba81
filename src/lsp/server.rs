use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tower_lsp::jsonrpc::{self, Id, Response};
use tracing::{debug, error, info, warn};

use crate::config;
use crate::error::TransportError;
use crate::log::init;
use crate::lsp::client::{Client, Message};
use crate::lsp::context::ServerContext;
use crate::lsp::dispatcher::Dispatcher;
use crate::lsp::transport::{MessageReader, MessageWriter};

/// How long queued outbound messages may take to flush after the loop ends
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs the server on stdio and returns the process exit code
pub async fn run_server(log_file: Option<PathBuf>) -> anyhow::Result<i32> {
    let log_path = log_file.unwrap_or_else(config::log_path);
    let _guard = init(&log_path)?;

    info!("Starting sitter-lsp server");

    let code = serve(tokio::io::stdin(), tokio::io::stdout()).await?;

    info!("sitter-lsp server stopped with exit code {}", code);
    Ok(code)
}

/// Serves one connection until `exit` or end of input
pub async fn serve<I, O>(input: I, output: O) -> anyhow::Result<i32>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_outgoing(MessageWriter::new(output), rx));

    let client = Client::new(tx);
    let mut dispatcher = Dispatcher::new(ServerContext::new(client.clone()));
    let mut reader = MessageReader::new(input);

    loop {
        let body = match reader.read_message().await {
            Ok(Some(body)) => body,
            Ok(None) => {
                info!("Input closed");
                break;
            }
            Err(e @ TransportError::MessageTooLarge { .. }) => {
                warn!("Skipped message: {}", e);
                client.send(Message::Response(Response::from_error(
                    Id::Null,
                    jsonrpc::Error::invalid_request(),
                )));
                continue;
            }
            Err(e) => {
                error!("Failed to read message: {}", e);
                break;
            }
        };

        // invalid UTF-8 fails here like any other malformed JSON
        match serde_json::from_slice::<Message>(&body) {
            Ok(Message::Request(request)) => {
                if let Some(response) = dispatcher.dispatch(request) {
                    client.send(Message::Response(response));
                }
            }
            Ok(Message::Response(response)) => {
                debug!("Ignoring client response {:?}", response.id());
            }
            Err(e) => {
                warn!("Malformed message: {}", e);
                client.send(Message::Response(Response::from_error(
                    Id::Null,
                    jsonrpc::Error::parse_error(),
                )));
            }
        }

        if dispatcher.is_exited() {
            break;
        }
    }

    let code = dispatcher.exit_code();
    drop(dispatcher);
    drop(client);

    // background tasks may still hold a client, so the channel may never close
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        warn!("Outbound writer did not drain in time");
    }

    Ok(code)
}

async fn write_outgoing<W>(mut writer: MessageWriter<W>, mut rx: UnboundedReceiver<Message>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let body = match serde_json::to_string(&message) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to encode outbound message: {}", e);
                continue;
            }
        };
        if let Err(e) = writer.write_message(&body).await {
            error!("Failed to write message: {}", e);
            break;
        }
    }
}
