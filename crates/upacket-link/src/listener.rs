use std::net::SocketAddr;

use tracing::info;
use upacket_transport::SocketListener;

use crate::config::LinkConfig;
use crate::error::Result;
use crate::link::Link;

/// Listens for and accepts TCP peers.
#[derive(Debug)]
pub struct LinkListener {
    socket: SocketListener,
    config: LinkConfig,
}

impl LinkListener {
    /// Bind to `addr` (`host:port`; port 0 picks a free port).
    pub fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, LinkConfig::default())
    }

    /// Bind with explicit configuration for accepted links.
    pub fn bind_with_config(addr: &str, config: LinkConfig) -> Result<Self> {
        let socket = SocketListener::bind(addr, config.transport_config())?;
        Ok(Self { socket, config })
    }

    /// Override the configuration applied to links accepted from now on.
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.socket = self.socket.with_config(config.transport_config());
        self.config = config;
        self
    }

    /// Accept the next connection.
    pub fn accept(&self) -> Result<Link> {
        let transport = self.socket.accept()?;
        let peer_addr = transport.peer_addr();
        if let Some(peer) = peer_addr {
            info!(%peer, "accepted peer");
        }
        Ok(Link::from_transport(transport, self.config.clone()).with_peer_addr(peer_addr))
    }

    /// Bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use upacket_transport::Status;

    use super::*;
    use crate::connector::connect;

    #[test]
    fn accepts_multiple_sequential_connections() {
        let listener = LinkListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener
            .local_addr()
            .expect("listener should have an address")
            .to_string();

        let server = thread::spawn(move || {
            for _ in 0..2 {
                let mut link = listener.accept().expect("accept should succeed");
                let payload = link.recv().expect("should receive payload");
                link.send(&payload).expect("should echo payload");
            }
        });

        for payload in [&b"ping"[..], &b"pong"[..]] {
            let mut client = connect(&addr).expect("client should connect");
            client.send(payload).expect("send should succeed");
            assert_eq!(client.recv().expect("reply").as_ref(), payload);
        }

        server.join().expect("server thread should finish");
    }

    #[test]
    fn accepted_links_use_listener_config() {
        let config = LinkConfig::default().with_timeout(Duration::from_millis(40));
        let listener = LinkListener::bind("127.0.0.1:0")
            .expect("listener should bind")
            .with_config(config.clone());
        let addr = listener
            .local_addr()
            .expect("listener should have an address")
            .to_string();

        let server = thread::spawn(move || {
            let mut link = listener.accept().expect("accept should succeed");
            assert_eq!(link.config(), &config);
            assert!(link.peer_addr().is_some_and(|addr| addr.ip().is_loopback()));
            assert_eq!(link.recv_status().0, Status::Timeout);
        });

        let _client = connect(&addr).expect("client should connect");
        server.join().expect("server thread should finish");
    }

    #[test]
    fn bind_rejects_address_in_use() {
        let listener = LinkListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener
            .local_addr()
            .expect("listener should have an address")
            .to_string();
        let err = LinkListener::bind(&addr).expect_err("port is taken");
        assert_eq!(err.status(), Status::ConnectFailed);
    }
}
