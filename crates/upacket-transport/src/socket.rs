use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportConfig, SENTINEL};

const DISCARD_CHUNK_SIZE: usize = 64;

/// TCP socket transport.
///
/// Sockets have no "read until" primitive, so frames are read one byte at a
/// time: bytes are skipped until a delimiter, then accumulated until the next
/// delimiter that follows at least one body byte. The whole frame is bounded
/// by one deadline derived from [`TransportConfig::timeout`].
pub struct SocketTransport {
    stream: TcpStream,
    config: TransportConfig,
    peer_addr: Option<SocketAddr>,
    closed: bool,
}

impl SocketTransport {
    /// Connect to `addr`, trying every resolved address in turn.
    pub fn connect(addr: &str, connect_timeout: Duration, config: TransportConfig) -> Result<Self> {
        let resolved = addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;

        let mut last_err = None;
        for candidate in resolved {
            match TcpStream::connect_timeout(&candidate, connect_timeout) {
                Ok(stream) => {
                    info!(%candidate, "connected to socket peer");
                    return Self::from_stream(stream, config);
                }
                Err(err) => {
                    debug!(%candidate, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            addr: addr.to_string(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(ErrorKind::NotFound, "address resolved to nothing")
            }),
        })
    }

    /// Wrap an already-connected stream and apply the write timeout.
    pub fn from_stream(stream: TcpStream, config: TransportConfig) -> Result<Self> {
        stream.set_write_timeout(Some(config.timeout))?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok();
        Ok(Self {
            stream,
            config,
            peer_addr,
            closed: false,
        })
    }

    /// Address of the connected peer, if known.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    /// Current transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn read_byte(&mut self, deadline: Instant) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout(self.config.timeout));
            }
            self.stream.set_read_timeout(Some(remaining))?;
            match self.stream.read(&mut byte) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(_) => return Ok(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err, self.config.timeout)),
            }
        }
    }
}

impl Transport for SocketTransport {
    fn read_frame(&mut self) -> Result<BytesMut> {
        self.ensure_open()?;
        let deadline = Instant::now() + self.config.timeout;

        let mut skipped = 0usize;
        while self.read_byte(deadline)? != SENTINEL {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(skipped, "discarded bytes before delimiter");
        }

        let max = self.config.max_body;
        let mut body = BytesMut::with_capacity(max);
        loop {
            let byte = self.read_byte(deadline)?;
            if byte == SENTINEL {
                if body.is_empty() {
                    trace!("empty body between delimiters, treating as opening delimiter");
                    continue;
                }
                return Ok(body);
            }
            if body.len() == max {
                return Err(TransportError::FrameTooLong { max });
            }
            body.put_u8(byte);
        }
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let timeout = self.config.timeout;
        self.stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush())
            .map_err(|err| TransportError::from_io(err, timeout))
    }

    fn data_available(&mut self) -> Result<bool> {
        self.ensure_open()?;
        peek_pending(&self.stream)
            .map(|pending| pending > 0)
            .map_err(|err| TransportError::from_io(err, self.config.timeout))
    }

    fn discard_input(&mut self) -> Result<usize> {
        self.ensure_open()?;
        let mut discarded = 0usize;
        let mut chunk = [0u8; DISCARD_CHUNK_SIZE];
        loop {
            let pending = peek_pending(&self.stream)
                .map_err(|err| TransportError::from_io(err, self.config.timeout))?;
            if pending == 0 {
                break;
            }
            match self.stream.read(&mut chunk[..pending.min(DISCARD_CHUNK_SIZE)]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => discarded += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err, self.config.timeout)),
            }
        }
        if discarded > 0 {
            debug!(discarded, "discarded pending input");
        }
        Ok(discarded)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn transport_name(&self) -> &'static str {
        "tcp-socket"
    }
}

impl std::fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketTransport")
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Count the bytes waiting on a socket without blocking.
///
/// A peer that has closed its side reports [`ErrorKind::UnexpectedEof`].
pub(crate) fn peek_pending(stream: &TcpStream) -> std::io::Result<usize> {
    let mut scratch = [0u8; DISCARD_CHUNK_SIZE];
    stream.set_nonblocking(true)?;
    let result = stream.peek(&mut scratch);
    stream.set_nonblocking(false)?;
    match result {
        Ok(0) => Err(std::io::Error::from(ErrorKind::UnexpectedEof)),
        Ok(n) => Ok(n),
        Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(0),
        Err(err) => Err(err),
    }
}

/// TCP listener handing out [`SocketTransport`]s.
#[derive(Debug)]
pub struct SocketListener {
    listener: TcpListener,
    config: TransportConfig,
}

impl SocketListener {
    /// Bind and listen on `addr`.
    pub fn bind(addr: &str, config: TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        if let Ok(local) = listener.local_addr() {
            info!(%local, "listening on tcp socket");
        }
        Ok(Self { listener, config })
    }

    /// Replace the configuration handed to accepted transports.
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<SocketTransport> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        SocketTransport::from_stream(stream, self.config.clone())
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp-socket"
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn pair(config: TransportConfig) -> (SocketTransport, TcpStream) {
        let listener = SocketListener::bind("127.0.0.1:0", config.clone()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let connector =
            thread::spawn(move || SocketTransport::connect(&addr, Duration::from_secs(1), config));
        let (peer, _) = listener.listener.accept().unwrap();
        (connector.join().unwrap().unwrap(), peer)
    }

    fn short_timeout() -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_millis(50),
            ..TransportConfig::default()
        }
    }

    #[test]
    fn reads_frame_from_peer() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        peer.write_all(b"|abcdefg|").unwrap();

        assert_eq!(transport.read_frame().unwrap().as_ref(), b"abcdefg");
    }

    #[test]
    fn skips_garbage_and_back_to_back_delimiters() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        peer.write_all(b"noise||123456xy|").unwrap();

        assert_eq!(transport.read_frame().unwrap().as_ref(), b"123456xy");
    }

    #[test]
    fn consecutive_frames() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        peer.write_all(b"|first1||second|").unwrap();

        assert_eq!(transport.read_frame().unwrap().as_ref(), b"first1");
        assert_eq!(transport.read_frame().unwrap().as_ref(), b"second");
    }

    #[test]
    fn slow_peer_within_deadline() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        let writer = thread::spawn(move || {
            for byte in b"|slow12|" {
                peer.write_all(&[*byte]).unwrap();
                thread::sleep(Duration::from_millis(2));
            }
            peer
        });

        assert_eq!(transport.read_frame().unwrap().as_ref(), b"slow12");
        let _peer = writer.join().unwrap();
    }

    #[test]
    fn silent_peer_times_out() {
        let (mut transport, _peer) = pair(short_timeout());
        let err = transport.read_frame().unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[test]
    fn closed_peer_disconnects() {
        let (mut transport, peer) = pair(TransportConfig::default());
        drop(peer);
        let err = transport.read_frame().unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }

    #[test]
    fn overlong_body_is_rejected() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        let mut wire = vec![SENTINEL];
        wire.extend_from_slice(&[0x42; 64]);
        wire.push(SENTINEL);
        peer.write_all(&wire).unwrap();

        let err = transport.read_frame().unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLong { max: 38 }));
    }

    #[test]
    fn write_frame_reaches_peer() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        transport.write_frame(b"|hello!|").unwrap();

        let mut buf = [0u8; 8];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"|hello!|");
    }

    #[test]
    fn data_available_and_discard() {
        let (mut transport, mut peer) = pair(TransportConfig::default());
        assert!(!transport.data_available().unwrap());

        peer.write_all(b"stale").unwrap();
        let start = Instant::now();
        while !transport.data_available().unwrap() {
            assert!(start.elapsed() < Duration::from_secs(2), "data never arrived");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(transport.discard_input().unwrap(), 5);
        assert!(!transport.data_available().unwrap());
    }

    #[test]
    fn closed_transport_rejects_operations() {
        let (mut transport, _peer) = pair(TransportConfig::default());
        transport.close().unwrap();
        transport.close().unwrap();
        assert!(matches!(transport.read_frame(), Err(TransportError::Closed)));
    }

    #[test]
    fn connect_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let err = SocketTransport::connect(&addr, Duration::from_secs(1), TransportConfig::default())
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
