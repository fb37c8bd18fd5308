/*!
The DMRInfo SSDP client is a *control point*.
It must **not** bind to UDP port 1900.

* A device stack on the same host may already listen on 0.0.0.0:1900, and two
  sockets sharing that port get incoming datagrams load-balanced between them.
* The client only needs to send M-SEARCH and receive the unicast HTTP/200
  replies, which are addressed to the source port of the M-SEARCH.

Therefore the client binds 0.0.0.0:0 and never joins the multicast group.
*/

use super::{SSDP_MULTICAST_ADDR, SSDP_PORT};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Réponse unicast à un M-SEARCH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub st: String,
    pub location: String,
    pub usn: Option<String>,
    pub server: Option<String>,
    pub from: SocketAddr,
}

/// Client SSDP pour envoyer des M-SEARCH et collecter les réponses
pub struct SsdpClient {
    socket: UdpSocket,
    target: SocketAddr,
}

impl SsdpClient {
    /// Crée un client qui interroge le groupe multicast SSDP standard
    pub fn new() -> std::io::Result<Self> {
        Self::with_target(SocketAddr::V4(SocketAddrV4::new(
            SSDP_MULTICAST_ADDR,
            SSDP_PORT,
        )))
    }

    /// Crée un client qui envoie ses M-SEARCH vers `target`.
    ///
    /// Any unicast address works as long as the responder answers to the
    /// source port of the request.
    pub fn with_target(target: SocketAddr) -> std::io::Result<Self> {
        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_reuse_address(true)?;

        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        socket2.bind(&bind_addr.into())?;

        let socket: UdpSocket = socket2.into();
        if let SocketAddr::V4(v4) = target {
            if v4.ip().is_multicast() {
                socket.set_multicast_ttl_v4(4)?;
                socket.set_multicast_loop_v4(true)?; // utile en dev local
            }
        }

        debug!(
            "SSDP client bound on {} (target {})",
            socket.local_addr()?,
            target
        );

        Ok(Self { socket, target })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Envoie un M-SEARCH pour un type donné
    pub fn send_msearch(&self, st: &str, mx: u32) -> std::io::Result<()> {
        let msg = build_msearch(self.target, st, mx);

        match self.socket.send_to(msg.as_bytes(), self.target) {
            Ok(_) => {
                info!("📤 M-SEARCH sent (ST={}, MX={})", st, mx.max(1));
                debug!("📨 M-SEARCH payload\n{}", msg);
                Ok(())
            }
            Err(e) => {
                warn!("❌ Failed to send M-SEARCH: {}", e);
                Err(e)
            }
        }
    }

    /// Sends one M-SEARCH and collects every reply received within `window`.
    ///
    /// MX is the window in whole seconds, clamped to 1 because responders
    /// reject `MX: 0`. A zero window still sends the request and then only
    /// drains the replies already queued on the socket.
    ///
    /// A window too large to be added to the current instant is rejected
    /// with [`ErrorKind::InvalidInput`] before anything is sent.
    pub fn search(&self, st: &str, window: Duration) -> std::io::Result<Vec<SearchResponse>> {
        window_deadline(window)?;
        let mx = u32::try_from(window.as_secs()).unwrap_or(u32::MAX);
        self.send_msearch(st, mx)?;
        self.collect_responses(window)
    }

    /// Lit les réponses jusqu'à l'expiration de la fenêtre
    pub fn collect_responses(&self, window: Duration) -> std::io::Result<Vec<SearchResponse>> {
        let deadline = window_deadline(window)?;
        let mut buf = [0u8; 8192];
        let mut responses = Vec::new();

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.socket.set_read_timeout(Some(deadline - now))?;

            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => self.push_datagram(&buf[..n], from, &mut responses),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue;
                }
                // Windows reports ICMP port-unreachable from a previous send this way
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::ConnectionReset) => {
                    trace!("SSDP recv interrupted: {}", e);
                    continue;
                }
                Err(e) => {
                    warn!("❌ SSDP client read error: {}", e);
                    return Err(e);
                }
            }
        }

        self.drain_pending(&mut buf, &mut responses)?;

        info!(
            "📥 SSDP window closed after {:?}: {} response(s)",
            window,
            responses.len()
        );
        Ok(responses)
    }

    fn drain_pending(
        &self,
        buf: &mut [u8],
        responses: &mut Vec<SearchResponse>,
    ) -> std::io::Result<()> {
        self.socket.set_nonblocking(true)?;
        let result = loop {
            match self.socket.recv_from(buf) {
                Ok((n, from)) => self.push_datagram(&buf[..n], from, responses),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::ConnectionReset) => {
                    continue;
                }
                Err(e) => break Err(e),
            }
        };
        self.socket.set_nonblocking(false)?;
        result
    }

    fn push_datagram(&self, data: &[u8], from: SocketAddr, responses: &mut Vec<SearchResponse>) {
        let data = String::from_utf8_lossy(data);
        if let Some(response) = parse_search_response(&data, from) {
            debug!(
                "📥 SSDP response from {}: st={} location={}",
                from, response.st, response.location
            );
            responses.push(response);
        }
    }
}

fn window_deadline(window: Duration) -> std::io::Result<Instant> {
    Instant::now().checked_add(window).ok_or_else(|| {
        std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("SSDP window of {}s is out of range", window.as_secs()),
        )
    })
}

fn build_msearch(target: SocketAddr, st: &str, mx: u32) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         USER-AGENT: DMRInfo SSDP Client\r\n\
         \r\n",
        target,
        mx.max(1),
        st
    )
}

/// Parse a datagram as an M-SEARCH reply.
///
/// Returns `None` for NOTIFY/M-SEARCH traffic, non-200 replies and replies
/// without `ST` or `LOCATION`. SSDP noise is routine, so nothing here is an error.
pub fn parse_search_response(data: &str, from: SocketAddr) -> Option<SearchResponse> {
    let mut lines = data.lines();
    let first_line = lines.next()?.trim();
    let upper = first_line.to_ascii_uppercase();

    if !(upper.starts_with("HTTP/") && upper.split_whitespace().nth(1) == Some("200")) {
        trace!("Ignoring SSDP message from {}: {}", from, first_line);
        return None;
    }

    let mut headers = parse_headers(lines);

    let Some(st) = headers.remove("ST") else {
        trace!("M-SEARCH response from {} missing ST header, ignoring", from);
        return None;
    };
    let Some(location) = headers.remove("LOCATION") else {
        trace!(
            "M-SEARCH response from {} missing LOCATION header, ignoring",
            from
        );
        return None;
    };

    Some(SearchResponse {
        st,
        location,
        usn: headers.remove("USN"),
        server: headers.remove("SERVER"),
        from,
    })
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();

        if line.is_empty() {
            break;
        }

        // Split on first ':' only (values may contain ':')
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if !name.is_empty() && !value.is_empty() {
                headers.insert(name, value);
            } else {
                trace!("Skipping malformed header: '{}'", line);
            }
        } else {
            trace!("Skipping line without colon: '{}'", line);
        }
    }
    headers
}
