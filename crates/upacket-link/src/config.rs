use std::time::Duration;

use upacket_frame::MAX_BODY_SIZE;
use upacket_transport::{TransportConfig, DEFAULT_TIMEOUT};

/// Default time allowed for a TCP connection to be established.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause after opening a serial line, while the peer reboots.
pub const DEFAULT_RESET_WAIT: Duration = Duration::from_secs(3);

/// Behavior of a [`Link`](crate::Link), fixed when it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Upper bound on one blocking read or write.
    pub timeout: Duration,
    /// Upper bound on establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Pause after opening a serial line. Many boards reset when the port
    /// opens and emit boot noise before they accept frames.
    pub reset_wait: Duration,
    /// Drop whatever is pending on a serial line once `reset_wait` elapses.
    pub flush_on_connect: bool,
    /// Drop pending input after every successfully received frame, so the
    /// next `recv` sees only frames sent after this one.
    pub drain_after_recv: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reset_wait: DEFAULT_RESET_WAIT,
            flush_on_connect: true,
            drain_after_recv: false,
        }
    }
}

impl LinkConfig {
    /// Override the read/write timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the post-open reset wait.
    pub fn with_reset_wait(mut self, wait: Duration) -> Self {
        self.reset_wait = wait;
        self
    }

    /// Enable or disable the post-open flush.
    pub fn with_flush_on_connect(mut self, flush: bool) -> Self {
        self.flush_on_connect = flush;
        self
    }

    /// Enable or disable draining after each received frame.
    pub fn with_drain_after_recv(mut self, drain: bool) -> Self {
        self.drain_after_recv = drain;
        self
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            max_body: MAX_BODY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.reset_wait, Duration::from_secs(3));
        assert!(config.flush_on_connect);
        assert!(!config.drain_after_recv);
    }

    #[test]
    fn builders_override_fields() {
        let config = LinkConfig::default()
            .with_timeout(Duration::from_millis(250))
            .with_connect_timeout(Duration::from_secs(2))
            .with_reset_wait(Duration::ZERO)
            .with_flush_on_connect(false)
            .with_drain_after_recv(true);

        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.reset_wait, Duration::ZERO);
        assert!(!config.flush_on_connect);
        assert!(config.drain_after_recv);
    }

    #[test]
    fn transport_config_carries_timeout_and_body_limit() {
        let config = LinkConfig::default().with_timeout(Duration::from_millis(40));
        let transport = config.transport_config();
        assert_eq!(transport.timeout, Duration::from_millis(40));
        assert_eq!(transport.max_body, 38);
    }
}
