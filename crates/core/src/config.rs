use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default RTSP version token sent in every request line.
pub const DEFAULT_RTSP_VERSION: &str = "RTSP/1.0";

/// Default transport token advertised in SETUP.
pub const DEFAULT_TRANSPORT: &str = "RTP/UDP";

/// Poll interval of the RTP receive loop. Pause/teardown signals are
/// observed at this cadence.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);

/// Largest datagram the RTP receive loop accepts in one read.
pub const DEFAULT_DATAGRAM_CAPACITY: usize = 20480;

/// Client-level configuration used by the session and both channels.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// RTSP server endpoint (`host:port`) for the control channel.
    pub server_addr: String,
    /// Resource name placed in every request line (e.g. `movie.Mjpeg`).
    pub resource: String,
    /// Local address the RTP socket binds to.
    pub rtp_bind_ip: IpAddr,
    /// Local RTP port, advertised to the server as `client_port`.
    pub rtp_port: u16,
    /// Version token in the request line.
    pub rtsp_version: String,
    /// Transport token in the SETUP `Transport` header.
    pub transport: String,
    /// Bounded wait for each RTP receive.
    pub receive_timeout: Duration,
    /// RTP receive buffer size in bytes.
    pub datagram_capacity: usize,
    /// Upper bound on the TCP connect. `None` blocks for the OS default.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8554".to_string(),
            resource: "movie.Mjpeg".to_string(),
            rtp_bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            rtp_port: 25000,
            rtsp_version: DEFAULT_RTSP_VERSION.to_string(),
            transport: DEFAULT_TRANSPORT.to_string(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            datagram_capacity: DEFAULT_DATAGRAM_CAPACITY,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Socket address the RTP receiver binds to.
    pub fn rtp_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rtp_bind_ip, self.rtp_port)
    }
}
