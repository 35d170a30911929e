//! Asynchronous GPSD client: connection lifecycle and the observable location
//!
//! The client owns one TCP connection to one GPSD endpoint. Inbound bytes
//! are framed into messages, classified by report class, and folded into a
//! single retained [`Location`]. Two usage shapes share that pipeline:
//!
//! - one-shot: [`GpsdClient::connect`] then [`GpsdClient::get_location`],
//!   which resolves with the first reported fix and halts processing
//! - continuous: [`GpsdClient::start`], then read [`GpsdClient::location`]
//!   or follow [`GpsdClient::updates`] until [`GpsdClient::stop`] or
//!   [`GpsdClient::close`]
//!
//! # Example
//!
//! ```no_run
//! # use gpsd_client::client::GpsdClient;
//! # async fn example() -> gpsd_client::Result<()> {
//! let mut client = GpsdClient::new();
//! client.start().await?;
//!
//! if let Some(location) = client.location() {
//!     println!("lat/lon: {:?}/{:?}", location.latitude, location.longitude);
//! }
//!
//! client.close();
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    Result,
    error::GpsdClientError,
    location::{Location, LocationTracker},
    protocol::{GpsdRequestable, framer::LineFramer, response::Message, types::Watch},
};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 2947;

const READ_CHUNK: usize = 4096;

/// Where to reach the daemon. Defaults to `localhost:2947`.
///
/// Each field overrides the default independently of the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    host: String,
    port: u16,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectOptions {
    /// Overrides the daemon host.
    pub fn host<S: AsRef<str>>(mut self, host: S) -> Self {
        self.host = host.as_ref().into();
        self
    }

    /// Overrides the daemon port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Lifecycle of one client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state; entered again when the transport fails
    Disconnected,
    /// Dialing, or dialed with no report framed yet
    Connecting,
    /// At least one complete message has been framed
    Connected,
    /// Processing halted by the caller; the socket may remain open
    Stopped,
    /// The socket is torn down; the instance must not be reused
    Closed,
}

/// Pipeline milestones published to pending lifecycle calls.
///
/// A watch channel of these replaces a repurposed pub/sub listener for the
/// first-fix wake-up: each pending call observes the milestone it cares
/// about exactly once.
#[derive(Debug, Clone, PartialEq)]
enum Progress {
    /// No complete batch of reports processed yet
    Waiting,
    /// The first framed batch carried no TPV report
    FirstBatchWithoutFix,
    /// At least one TPV report has been classified and applied
    FixAcquired,
    /// The transport reached EOF or failed; detail carries the I/O error
    Ended(Option<String>),
}

struct Inner {
    state: ConnectionState,
    tracker: LocationTracker,
}

struct Shared {
    inner: Mutex<Inner>,
    progress: watch::Sender<Progress>,
    updates: watch::Sender<Option<Location>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Records the end of the transport. Silent once the caller has
    /// stopped or closed the client.
    fn finish(&self, error: Option<String>) {
        let mut inner = self.lock();
        if matches!(
            inner.state,
            ConnectionState::Stopped | ConnectionState::Closed
        ) {
            return;
        }
        inner.state = ConnectionState::Disconnected;
        self.progress.send_replace(Progress::Ended(error));
    }
}

/// Asynchronous client for one GPSD endpoint.
///
/// Each instance exclusively owns its socket, its framing buffer, and one
/// retained [`Location`]; instances are independent and may run
/// concurrently within the same program.
pub struct GpsdClient {
    shared: Arc<Shared>,
    reader: Option<tokio::task::JoinHandle<()>>,
}

impl GpsdClient {
    /// Creates a client in the `Disconnected` state.
    pub fn new() -> Self {
        let (progress, _) = watch::channel(Progress::Waiting);
        let (updates, _) = watch::channel(None);

        GpsdClient {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: ConnectionState::Disconnected,
                    tracker: LocationTracker::default(),
                }),
                progress,
                updates,
            }),
            reader: None,
        }
    }

    /// Connects to GPSD at `localhost:2947` and enables JSON watch mode.
    ///
    /// Resolves once the handshake command has been written; report
    /// processing continues in the background. Calling on an instance that
    /// is already connecting or connected succeeds immediately without
    /// re-dialing or repeating the handshake.
    pub async fn connect(&mut self) -> Result<()> {
        self.connect_with(ConnectOptions::default()).await
    }

    /// Connects to GPSD using explicit connect options.
    pub async fn connect_with(&mut self, options: ConnectOptions) -> Result<()> {
        if self.already_attached()? {
            return Ok(());
        }

        info!(host = %options.host, port = options.port, "connecting to gpsd");
        let stream = match tokio::net::TcpStream::connect(options.address()).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.lock().state = ConnectionState::Disconnected;
                return Err(GpsdClientError::IoError(e));
            }
        };

        use tokio_util::compat::TokioAsyncReadCompatExt;
        self.attach(stream.compat()).await
    }

    /// Attaches the client to an already-established transport.
    ///
    /// This is the seam for callers that dial their own connection and for
    /// tests running against an in-memory transport: the watch handshake
    /// is written to `stream` and report processing starts immediately.
    /// Like [`connect`](Self::connect), it is a no-op on an instance that
    /// is already attached.
    pub async fn open<S>(&mut self, stream: S) -> Result<()>
    where
        S: futures_io::AsyncRead + futures_io::AsyncWrite + Send + Unpin + 'static,
    {
        if self.already_attached()? {
            return Ok(());
        }
        self.attach(stream).await
    }

    /// Connects if necessary and waits until the first TPV report has been
    /// folded into the retained location.
    ///
    /// Fails with [`GpsdClientError::StreamEnded`] when the transport ends
    /// before a position report arrives.
    pub async fn start(&mut self) -> Result<()> {
        self.start_with(ConnectOptions::default()).await
    }

    /// [`start`](Self::start) with explicit connect options.
    pub async fn start_with(&mut self, options: ConnectOptions) -> Result<()> {
        self.connect_with(options).await?;

        let mut progress = self.shared.progress.subscribe();
        let ended = {
            let milestone = progress
                .wait_for(|p| matches!(p, Progress::FixAcquired | Progress::Ended(_)))
                .await
                .map_err(|_| GpsdClientError::StreamEnded(None))?;
            match &*milestone {
                Progress::Ended(detail) => Some(detail.clone()),
                _ => None,
            }
        };

        match ended {
            Some(detail) => Err(GpsdClientError::StreamEnded(detail)),
            None => Ok(()),
        }
    }

    /// Resolves with the location derived from the first TPV report.
    ///
    /// This is the one-shot read: it waits for the first framed batch of
    /// reports, resolves with the retained fix if that cycle carried a TPV
    /// message, and halts further processing either way. Fails with
    /// [`GpsdClientError::NoFixData`] when the batch had no TPV report and
    /// with [`GpsdClientError::StreamEnded`] when the transport ends
    /// first. Resolves or fails exactly once per call.
    pub async fn get_location(&mut self) -> Result<Location> {
        let mut progress = self.shared.progress.subscribe();
        {
            let inner = self.shared.lock();
            match inner.state {
                ConnectionState::Closed => return Err(GpsdClientError::ClientClosed),
                ConnectionState::Disconnected
                    if matches!(*progress.borrow(), Progress::Waiting) =>
                {
                    return Err(GpsdClientError::NotConnected);
                }
                _ => {}
            }
        }

        let outcome = progress
            .wait_for(|p| !matches!(p, Progress::Waiting))
            .await
            .map_err(|_| GpsdClientError::StreamEnded(None))?
            .clone();

        let result = match outcome {
            Progress::FixAcquired => Ok(self.shared.lock().tracker.current().clone()),
            Progress::Ended(detail) => Err(GpsdClientError::StreamEnded(detail)),
            // the first framed batch carried no TPV report
            _ => Err(GpsdClientError::NoFixData),
        };

        self.stop();
        result
    }

    /// Halts report processing without closing the transport.
    ///
    /// Bytes may continue to arrive on the socket; they are discarded. No
    /// state mutation or update notification happens after this returns.
    pub fn stop(&mut self) {
        let mut inner = self.shared.lock();
        if matches!(
            inner.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            inner.state = ConnectionState::Stopped;
        }
    }

    /// Tears down the socket unconditionally.
    ///
    /// Safe to call at any point, including before any connect; calls on
    /// an already-closed instance are a no-op.
    pub fn close(&mut self) {
        {
            let mut inner = self.shared.lock();
            if inner.state == ConnectionState::Closed {
                return;
            }
            inner.state = ConnectionState::Closed;
        }
        if let Some(reader) = self.reader.take() {
            // aborting the reader task drops the transport
            reader.abort();
        }
    }

    /// True while the connection is established and processing reports.
    pub fn is_connected(&self) -> bool {
        self.shared.lock().state == ConnectionState::Connected
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    /// Snapshot of the retained location, or `None` while not connected.
    ///
    /// Never blocks and never performs I/O.
    pub fn location(&self) -> Option<Location> {
        let inner = self.shared.lock();
        if inner.state == ConnectionState::Connected {
            Some(inner.tracker.current().clone())
        } else {
            None
        }
    }

    /// Subscribes to location-updated notifications.
    ///
    /// The channel holds the latest notified location; a fresh receiver
    /// starts at `None` until the first observable change. Reports that
    /// change nothing publish nothing.
    pub fn updates(&self) -> watch::Receiver<Option<Location>> {
        self.shared.updates.subscribe()
    }

    fn already_attached(&self) -> Result<bool> {
        let mut inner = self.shared.lock();
        match inner.state {
            ConnectionState::Closed => Err(GpsdClientError::ClientClosed),
            ConnectionState::Disconnected => {
                inner.state = ConnectionState::Connecting;
                Ok(false)
            }
            // connecting, connected, or stopped with the socket still open
            _ => Ok(true),
        }
    }

    async fn attach<S>(&mut self, mut stream: S) -> Result<()>
    where
        S: futures_io::AsyncRead + futures_io::AsyncWrite + Send + Unpin + 'static,
    {
        let command = Watch::json().to_command();
        if let Err(e) = stream.write_all(command.as_bytes()).await {
            self.shared.lock().state = ConnectionState::Disconnected;
            return Err(GpsdClientError::IoError(e));
        }
        if let Err(e) = stream.flush().await {
            self.shared.lock().state = ConnectionState::Disconnected;
            return Err(GpsdClientError::IoError(e));
        }
        debug!(%command, "watch mode enabled");

        self.shared.progress.send_replace(Progress::Waiting);
        let shared = Arc::clone(&self.shared);
        self.reader = Some(tokio::spawn(read_loop(stream, shared)));
        Ok(())
    }
}

impl Default for GpsdClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GpsdClient {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Drives one connection: reads chunks, frames them into messages,
/// classifies each report, and folds TPV messages into the retained
/// location.
async fn read_loop<S>(mut stream: S, shared: Arc<Shared>)
where
    S: futures_io::AsyncRead + Send + Unpin + 'static,
{
    let mut framer = LineFramer::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut first_batch = true;

    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(0) => {
                debug!("gpsd closed the connection");
                shared.finish(None);
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "transport failure");
                shared.finish(Some(e.to_string()));
                return;
            }
        };

        let mut inner = shared.lock();
        match inner.state {
            ConnectionState::Closed => return,
            // detached: the socket stays open, inbound bytes are discarded
            ConnectionState::Stopped => continue,
            _ => {}
        }

        let lines = framer.push(&chunk[..read]);
        if lines.is_empty() {
            continue;
        }
        if inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Connected;
        }

        let mut fixed = false;
        for line in &lines {
            match serde_json::from_str::<Message>(line) {
                Ok(Message::Tpv(report)) => {
                    fixed = true;
                    if inner.tracker.apply(&report) {
                        shared
                            .updates
                            .send_replace(Some(inner.tracker.current().clone()));
                    }
                }
                Ok(Message::Version(version)) => {
                    debug!(release = %version.release, "gpsd version report");
                }
                Ok(_) => {}
                Err(e) => {
                    // skipped; the stream continues with the next message
                    warn!(error = %e, raw = %line, "discarding unparseable report");
                }
            }
        }

        if fixed {
            shared.progress.send_replace(Progress::FixAcquired);
        } else if first_batch {
            shared.progress.send_replace(Progress::FirstBatchWithoutFix);
        }
        first_batch = false;
    }
}
