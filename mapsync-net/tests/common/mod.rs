#![allow(dead_code)]
//! Test harness utilities for mapsync-net integration tests.

use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mapsync_core::source::{BeatmapSource, LocalSource, RemoteSource};
use mapsync_net::framing::read_frame;
use mapsync_net::manager::{ConfirmFn, NetworkManager};
use mapsync_net::protocol::{decode, Message};

/// One side of a sync pair: sources plus a manager bound to an ephemeral
/// port, with its scanned songs directory kept alive.
pub struct TestPeer {
    pub local: Arc<LocalSource>,
    pub remote: Arc<RemoteSource>,
    pub manager: Arc<NetworkManager>,
    pub songs: tempfile::TempDir,
}

impl TestPeer {
    pub fn addr(&self) -> String {
        self.manager.local_addr().to_string()
    }
}

/// Start a peer whose local library holds the given directory names,
/// accepting every inbound connection.
pub fn start_peer(dirs: &[&str]) -> TestPeer {
    start_peer_with_confirm(dirs, Box::new(|_| true))
}

/// Start a peer with an explicit incoming-connection confirmation hook.
pub fn start_peer_with_confirm(dirs: &[&str], confirm: ConfirmFn) -> TestPeer {
    let songs = tempfile::tempdir().expect("temp songs dir");
    for dir in dirs {
        fs::create_dir(songs.path().join(dir)).expect("create songs subdir");
    }

    let local = Arc::new(LocalSource::with_root(songs.path()));
    assert!(local.refresh());
    let remote = Arc::new(RemoteSource::new());

    let manager = NetworkManager::start_on(
        "127.0.0.1:0",
        Arc::clone(&local),
        Arc::clone(&remote),
        confirm,
    )
    .expect("bind test listener");

    TestPeer {
        local,
        remote,
        manager,
        songs,
    }
}

/// A raw peer speaking framed lines over a plain TCP stream, for
/// protocol-level tests against a real manager.
pub struct RawPeer {
    pub reader: std::io::BufReader<TcpStream>,
    pub stream: TcpStream,
}

impl RawPeer {
    /// Dial a manager's listener.
    pub fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let reader = std::io::BufReader::new(stream.try_clone()?);
        Ok(Self { reader, stream })
    }

    /// Send one framed message.
    pub fn send(&mut self, msg: &Message) -> std::io::Result<()> {
        mapsync_net::framing::write_frame(&mut self.stream, msg)
    }

    /// Send raw bytes, unframed.
    pub fn send_raw(&mut self, text: &str) -> std::io::Result<()> {
        self.stream.write_all(text.as_bytes())?;
        self.stream.flush()
    }

    /// Read and decode the next frame.
    pub fn recv(&mut self) -> std::io::Result<Message> {
        let frame = read_frame(&mut self.reader)?.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "peer closed the stream")
        })?;
        decode(&frame)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// True once the far side has closed the stream.
    pub fn saw_eof(&mut self) -> bool {
        matches!(read_frame(&mut self.reader), Ok(None))
    }
}

/// Spin until `cond` holds, panicking after `timeout`.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while Instant::now().duration_since(start) < timeout {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached within {timeout:?}");
}
