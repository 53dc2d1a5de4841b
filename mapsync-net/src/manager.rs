//! Connection lifecycle and synchronization glue.
//!
//! One peer link at a time: dialing out or accepting an inbound socket
//! tears down whatever link existed first, reader thread included. A
//! dedicated blocking reader per live connection parses inbound frames;
//! socket writes are serialized so concurrent sends never interleave.

use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use mapsync_core::source::{BeatmapSource, LocalSource, RemoteLink, RemoteSource};
use mapsync_types::{Beatmap, SourceKind};

use crate::error::ConnectError;
use crate::framing::{read_frame, write_frame};
use crate::protocol::{self, IgnorePayload, Message, MessageType};

/// Fixed service port peers listen on.
pub const SERVICE_PORT: u16 = 727;

/// Outbound connection attempts give up after this long.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept-loop poll interval while idle.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Hook consulted with the peer's address for every inbound connection.
pub type ConfirmFn = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// The socket / reader / connected-flag triple. Every read or mutation of
/// it happens under one lock.
struct LinkState {
    connected: bool,
    socket: Option<TcpStream>,
    reader: Option<JoinHandle<()>>,
    /// Stop signal for the current reader; replaced on every install, so
    /// it also identifies the connection generation.
    stop: Arc<AtomicBool>,
}

/// Owns the single peer link, the inbound listener, and the glue that
/// mirrors library changes across the wire.
pub struct NetworkManager {
    local: Arc<LocalSource>,
    remote: Arc<RemoteSource>,
    confirm: ConfirmFn,
    /// Handle to ourselves for spawned reader threads.
    self_weak: Weak<NetworkManager>,
    state: Mutex<LinkState>,
    /// Serializes socket writes, independent of `state`.
    writer: Mutex<Option<TcpStream>>,
    /// Orders connect/accept/disconnect against each other. Never taken
    /// by the reader thread.
    lifecycle: Mutex<()>,
    listener_addr: SocketAddr,
    shutdown: AtomicBool,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkManager {
    /// Bind the listener on the fixed service port and start accepting.
    pub fn start(
        local: Arc<LocalSource>,
        remote: Arc<RemoteSource>,
        confirm: ConfirmFn,
    ) -> io::Result<Arc<Self>> {
        Self::start_on(("0.0.0.0", SERVICE_PORT), local, remote, confirm)
    }

    /// Bind the listener on an explicit address.
    pub fn start_on(
        addr: impl ToSocketAddrs,
        local: Arc<LocalSource>,
        remote: Arc<RemoteSource>,
        confirm: ConfirmFn,
    ) -> io::Result<Arc<Self>> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let listener_addr = listener.local_addr()?;

        let manager = Arc::new_cyclic(|weak| Self {
            local: Arc::clone(&local),
            remote: Arc::clone(&remote),
            confirm,
            self_weak: weak.clone(),
            state: Mutex::new(LinkState {
                connected: false,
                socket: None,
                reader: None,
                stop: Arc::new(AtomicBool::new(false)),
            }),
            writer: Mutex::new(None),
            lifecycle: Mutex::new(()),
            listener_addr,
            shutdown: AtomicBool::new(false),
            accept_thread: Mutex::new(None),
        });

        // Push local changes to the peer as they happen.
        {
            let weak = Arc::downgrade(&manager);
            local.on_refreshed(Box::new(move || {
                if let Some(m) = weak.upgrade() {
                    m.send_local_list();
                }
            }));
        }
        {
            let weak = Arc::downgrade(&manager);
            local.on_ignore_changed(Box::new(move |index, ignored| {
                if let Some(m) = weak.upgrade() {
                    m.send_ignored(SourceKind::Local, index, ignored);
                }
            }));
        }
        {
            let weak = Arc::downgrade(&manager);
            remote.on_ignore_changed(Box::new(move |index, ignored| {
                if let Some(m) = weak.upgrade() {
                    m.send_ignored(SourceKind::Remote, index, ignored);
                }
            }));
        }
        let manager_dyn: Arc<dyn RemoteLink> = manager.clone();
        remote.attach_link(Arc::downgrade(&manager_dyn));

        let weak = Arc::downgrade(&manager);
        let handle = thread::Builder::new()
            .name("mapsync-accept".into())
            .spawn(move || accept_loop(listener, weak))?;
        *manager.accept_thread.lock().unwrap() = Some(handle);

        info!("listening for peers on {listener_addr}");
        Ok(manager)
    }

    /// Tear down any current link, then dial the peer.
    ///
    /// A bare host dials the fixed service port; a `host:port` form is
    /// used as given. Blocks up to the connect timeout; on failure the
    /// link stays down.
    pub fn connect(&self, address: &str) -> Result<(), ConnectError> {
        let _lifecycle = self.lifecycle.lock().unwrap();
        self.teardown();

        let addr = resolve_peer(address)?;
        info!("connecting to {addr}");
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                ConnectError::Timeout
            } else {
                ConnectError::Io(e)
            }
        })?;
        self.install(stream)?;
        Ok(())
    }

    /// Drop the current link, if any. Blocks until the reader thread has
    /// exited, so no inbound dispatch fires after this returns. Safe to
    /// call when already disconnected.
    pub fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock().unwrap();
        self.teardown();
    }

    /// Disconnect and permanently stop accepting inbound connections.
    pub fn close(&self) {
        // Stop the accept loop first so it cannot install a fresh link
        // behind the teardown.
        self.shutdown.store(true, Ordering::SeqCst);
        let handle = self.accept_thread.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        self.disconnect();
    }

    /// Non-blocking connection-state query.
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    /// Address the inbound listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener_addr
    }

    /// Send the current local snapshot as a LIST message.
    pub fn send_local_list(&self) {
        match self.local.snapshot_json() {
            Ok(content) => self.send_message(&Message::new(MessageType::List, content)),
            Err(e) => warn!("could not serialize local list: {e}"),
        }
    }

    /// Send one ignore-flag change, naming the side relative to this peer.
    pub fn send_ignored(&self, source: SourceKind, index: usize, ignored: bool) {
        let payload = IgnorePayload {
            local_side: source == SourceKind::Local,
            index,
            ignored,
        };
        match serde_json::to_string(&payload) {
            Ok(content) => self.send_message(&Message::new(MessageType::Ignore, content)),
            Err(e) => warn!("could not serialize ignore change: {e}"),
        }
    }

    /// Ask the peer for its current library.
    pub fn send_list_request(&self) {
        self.send_message(&Message::request());
    }

    /// Serialize and write one framed message. Dropped silently while
    /// disconnected; sending offline is a normal transient condition.
    fn send_message(&self, msg: &Message) {
        {
            let state = self.state.lock().unwrap();
            if !state.connected {
                debug!("not connected, dropping {:?} message", msg.kind);
                return;
            }
        }
        let mut writer = self.writer.lock().unwrap();
        if let Some(stream) = writer.as_mut() {
            if let Err(e) = write_frame(stream, msg) {
                warn!("failed to send {:?} message: {e}", msg.kind);
            }
        }
    }

    /// Install a freshly connected socket: clone the write half, spawn the
    /// reader, flip to connected. Caller holds `lifecycle` with the
    /// previous link already torn down.
    fn install(&self, stream: TcpStream) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        let read_half = stream.try_clone()?;
        let write_half = stream.try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));

        let mut state = self.state.lock().unwrap();
        let weak = self.self_weak.clone();
        let reader_stop = Arc::clone(&stop);
        let reader = thread::Builder::new()
            .name("mapsync-reader".into())
            .spawn(move || reader_loop(weak, read_half, reader_stop))?;

        state.socket = Some(stream);
        state.reader = Some(reader);
        state.stop = stop;
        state.connected = true;
        *self.writer.lock().unwrap() = Some(write_half);
        info!("peer link established");
        Ok(())
    }

    /// Teardown body shared by connect/accept/disconnect. Caller holds
    /// `lifecycle`; joins the old reader outside the state lock so the
    /// reader's own teardown path can never deadlock against it.
    fn teardown(&self) {
        let reader = {
            let mut state = self.state.lock().unwrap();
            state.stop.store(true, Ordering::SeqCst);
            if let Some(socket) = state.socket.take() {
                let _ = socket.shutdown(Shutdown::Both);
            }
            if state.connected {
                info!("peer link closed");
            }
            state.connected = false;
            *self.writer.lock().unwrap() = None;
            state.reader.take()
        };
        if let Some(handle) = reader {
            let _ = handle.join();
        }
    }

    /// Apply one decoded inbound message.
    fn handle_message(&self, msg: Message) {
        match msg.kind {
            MessageType::List => {
                match serde_json::from_str::<Option<Vec<Beatmap>>>(&msg.content) {
                    Ok(list) => self.remote.replace_all(list),
                    Err(e) => warn!("discarding LIST with bad content: {e}"),
                }
            }
            MessageType::Ignore => match serde_json::from_str::<IgnorePayload>(&msg.content) {
                Ok(payload) => {
                    // The sender labels sides from its own perspective, so
                    // its local library is our remote one.
                    if payload.local_side {
                        self.remote.set_ignored(payload.index, payload.ignored);
                    } else {
                        self.local.set_ignored(payload.index, payload.ignored);
                    }
                }
                Err(e) => warn!("discarding IGNORE with bad content: {e}"),
            },
            MessageType::Request => self.send_local_list(),
        }
    }

    /// Reader-side transition to disconnected after the peer went away.
    /// `stop` identifies the reader's connection generation; a stale
    /// reader must not touch a newer link.
    fn peer_closed(&self, stop: &Arc<AtomicBool>) {
        let mut state = self.state.lock().unwrap();
        if !Arc::ptr_eq(&state.stop, stop) {
            return;
        }
        if let Some(socket) = state.socket.take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        state.connected = false;
        // This thread's own handle; nothing left to join.
        state.reader.take();
        *self.writer.lock().unwrap() = None;
        info!("peer disconnected");
    }
}

impl RemoteLink for NetworkManager {
    fn is_connected(&self) -> bool {
        NetworkManager::is_connected(self)
    }

    fn request_list(&self) {
        self.send_list_request();
    }
}

impl Drop for NetworkManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Ok(state) = self.state.get_mut() {
            state.stop.store(true, Ordering::SeqCst);
            if let Some(socket) = state.socket.take() {
                let _ = socket.shutdown(Shutdown::Both);
            }
        }
    }
}

/// Poll for inbound connections until shut down. Every accepted socket is
/// offered to the confirmation hook before it replaces the current link;
/// a rejected socket is simply dropped.
fn accept_loop(listener: TcpListener, manager: Weak<NetworkManager>) {
    loop {
        let Some(mgr) = manager.upgrade() else { return };
        if mgr.shutdown.load(Ordering::SeqCst) {
            return;
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                let peer = peer.to_string();
                if !(mgr.confirm)(&peer) {
                    info!("rejected inbound connection from {peer}");
                    continue;
                }
                let installed = {
                    let _lifecycle = mgr.lifecycle.lock().unwrap();
                    mgr.teardown();
                    mgr.install(stream)
                };
                match installed {
                    Ok(()) => {
                        info!("accepted inbound connection from {peer}");
                        // Pull the peer's library right away.
                        mgr.send_list_request();
                    }
                    Err(e) => error!("could not set up link with {peer}: {e}"),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                drop(mgr);
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                error!("accept error: {e}");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Blocking read loop, one per live connection. Malformed frames are
/// dropped; end-of-stream and read errors end the loop.
fn reader_loop(manager: Weak<NetworkManager>, stream: TcpStream, stop: Arc<AtomicBool>) {
    let mut reader = BufReader::new(stream);
    loop {
        match read_frame(&mut reader) {
            Ok(Some(frame)) => match protocol::decode(&frame) {
                Ok(msg) => {
                    let Some(mgr) = manager.upgrade() else { break };
                    mgr.handle_message(msg);
                }
                Err(e) => warn!("discarding malformed frame: {e}"),
            },
            Ok(None) => {
                // Peer closed the stream: a normal disconnect.
                if !stop.load(Ordering::SeqCst) {
                    if let Some(mgr) = manager.upgrade() {
                        mgr.peer_closed(&stop);
                    }
                }
                break;
            }
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    error!("read error on peer link: {e}");
                    if let Some(mgr) = manager.upgrade() {
                        mgr.peer_closed(&stop);
                    }
                }
                break;
            }
        }
    }
    debug!("reader thread exiting");
}

/// Resolve a user-entered peer address; a bare host gets the service port.
fn resolve_peer(address: &str) -> Result<SocketAddr, ConnectError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConnectError::InvalidAddress(address.into()));
    }
    let mut candidates = if address.contains(':') {
        address
            .to_socket_addrs()
            .map_err(|_| ConnectError::InvalidAddress(address.into()))?
    } else {
        (address, SERVICE_PORT)
            .to_socket_addrs()
            .map_err(|_| ConnectError::InvalidAddress(address.into()))?
    };
    candidates
        .next()
        .ok_or_else(|| ConnectError::InvalidAddress(address.into()))
}
