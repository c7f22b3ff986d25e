use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use http::header::{self, HeaderMap, HeaderValue};
use std::{fmt, io::Write, time::Duration};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    config::Config,
    error::{ApiError, Error, Result},
    http::{authorization, BATCH_PATH, USER_AGENT},
    identity::Identity,
    sink::{
        message::{random_id, Batch, Message},
        Properties, Sink,
    },
};

/// Queues calls and posts them to the batch endpoint from a background task.
///
/// Sink calls never block. A batch is sent once it holds `batch_size`
/// messages or its oldest message has waited `flush_interval`. Use
/// [`BatchSink::shutdown`] to flush whatever is still queued.
pub struct BatchSink {
    tx: mpsc::UnboundedSender<Message>,
    worker: JoinHandle<()>,
    anonymous_id: String,
}

impl fmt::Debug for BatchSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSink")
            .field("anonymous_id", &self.anonymous_id)
            .finish_non_exhaustive()
    }
}

impl BatchSink {
    /// Creates a new sink and spawns its worker on the current tokio runtime.
    pub fn new(config: &Config) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_e| Error::MissingRuntime)?;
        let client = Client::new(config)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run(client, rx, config.batch_size, config.flush_interval));

        Ok(Self {
            tx,
            worker,
            anonymous_id: random_id(),
        })
    }

    /// The id calls are attributed to until a user is identified.
    pub fn anonymous_id(&self) -> &str {
        &self.anonymous_id
    }

    /// Sends everything still queued and stops the worker.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.tx);
        self.worker.await.map_err(Error::JoinError)
    }

    fn enqueue(&self, message: Message) -> Result<()> {
        self.tx.send(message).map_err(|_e| Error::SinkClosed)
    }
}

impl Sink for BatchSink {
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()> {
        self.enqueue(Message::identify(&self.anonymous_id, user_id, traits))
    }

    fn track(&mut self, event: &str, properties: &Properties) -> Result<()> {
        self.enqueue(Message::track(&self.anonymous_id, event, properties))
    }

    fn page(&mut self, name: &str, properties: &Properties) -> Result<()> {
        self.enqueue(Message::page(&self.anonymous_id, name, properties))
    }

    fn reset(&mut self) -> Result<()> {
        self.anonymous_id = random_id();
        Ok(())
    }
}

async fn run(
    client: Client,
    rx: mpsc::UnboundedReceiver<Message>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut chunks = Box::pin(
        UnboundedReceiverStream::new(rx).chunks_timeout(batch_size, flush_interval),
    );
    while let Some(messages) = chunks.next().await {
        let count = messages.len();
        match client.send_batch(&messages).await {
            Ok(()) => debug!(count, "sent batch"),
            Err(e) => warn!(count, error = %e, "dropped batch"),
        }
    }
}

/// Client is a wrapper around `reqwest::Client` which knows the batch URL and
/// sends the credentials with every request.
#[derive(Debug, Clone)]
struct Client {
    batch_url: Url,
    inner: reqwest::Client,
}

impl Client {
    fn new(config: &Config) -> Result<Self> {
        let batch_url = config.url.join(BATCH_PATH).map_err(Error::InvalidUrl)?;

        let mut default_headers = HeaderMap::new();
        let auth_header_value = HeaderValue::from_str(&authorization(&config.write_key))
            .map_err(|_e| Error::InvalidWriteKey)?;
        default_headers.insert(header::AUTHORIZATION, auth_header_value);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .timeout(config.timeout)
            .build()
            .map_err(Error::HttpClientSetup)?;

        Ok(Self {
            batch_url,
            inner: http_client,
        })
    }

    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn send_batch(&self, messages: &[Message]) -> Result<()> {
        let json_payload = serde_json::to_vec(&Batch::new(messages))?;
        let payload = tokio::task::spawn_blocking(move || {
            let mut gzip_payload = GzEncoder::new(Vec::new(), Compression::default());
            gzip_payload.write_all(&json_payload)?;
            gzip_payload.finish()
        })
        .await
        .map_err(Error::JoinError)?
        .map_err(Error::Encoding)?;

        let res = self
            .inner
            .post(self.batch_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_ENCODING, "gzip")
            .body(Bytes::from(payload))
            .send()
            .await
            .map_err(Error::Http)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.ok().filter(|body| !body.is_empty());
            return Err(Error::Api(ApiError::new(
                status.as_u16(),
                self.batch_url.path(),
                body,
            )));
        }
        Ok(())
    }
}
