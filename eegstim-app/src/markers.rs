//! Marker outlets: one JSON datagram per marker over UDP, or the log only.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use eegstim_experiment::{MarkerError, MarkerSink};
use serde::Serialize;
use tracing::{info, trace};

#[derive(Debug, Serialize)]
struct Datagram<'a> {
    label: &'a str,
    timestamp: f64,
    seq: u64,
}

/// Sends `{"label", "timestamp", "seq"}` to a fixed target. `seq` counts up from zero so
/// receivers can spot lost datagrams.
pub struct UdpMarkerSink {
    socket: UdpSocket,
    target: SocketAddr,
    seq: u64,
}

impl UdpMarkerSink {
    pub fn connect(target: &str) -> io::Result<Self> {
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{target} resolves to no address"),
            )
        })?;
        let socket = if target.is_ipv4() {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket.set_broadcast(true)?;
            socket
        } else {
            UdpSocket::bind("[::]:0")?
        };
        info!(%target, local = %socket.local_addr()?, "marker outlet ready");
        Ok(Self {
            socket,
            target,
            seq: 0,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl MarkerSink for UdpMarkerSink {
    fn emit(&mut self, label: &str, timestamp: f64) -> Result<(), MarkerError> {
        let datagram = Datagram {
            label,
            timestamp,
            seq: self.seq,
        };
        let bytes = serde_json::to_vec(&datagram).map_err(|source| MarkerError::Encode {
            label: label.to_string(),
            source,
        })?;
        self.socket
            .send_to(&bytes, self.target)
            .map_err(|source| MarkerError::Transport {
                label: label.to_string(),
                source,
            })?;
        trace!(seq = self.seq, bytes = bytes.len(), "marker datagram sent");
        self.seq += 1;
        Ok(())
    }
}

/// For rehearsals without a recording machine.
#[derive(Debug, Default)]
pub struct LogMarkerSink {
    seq: u64,
}

impl MarkerSink for LogMarkerSink {
    fn emit(&mut self, label: &str, timestamp: f64) -> Result<(), MarkerError> {
        info!(target: "eegstim_app::markers", seq = self.seq, label, timestamp, "marker");
        self.seq += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;

    fn receiver() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        socket
    }

    fn recv_json(socket: &UdpSocket) -> Value {
        let mut buf = [0u8; 512];
        let (n, _) = socket.recv_from(&mut buf).unwrap();
        serde_json::from_slice(&buf[..n]).unwrap()
    }

    #[test]
    fn test_datagrams_carry_label_time_and_sequence() {
        let rx = receiver();
        let addr = rx.local_addr().unwrap().to_string();
        let mut sink = UdpMarkerSink::connect(&addr).unwrap();

        sink.emit("focus_start", 1.25).unwrap();
        sink.emit("focus_end", 6.25).unwrap();

        let first = recv_json(&rx);
        assert_eq!(first["label"], "focus_start");
        assert_eq!(first["timestamp"], 1.25);
        assert_eq!(first["seq"], 0);

        let second = recv_json(&rx);
        assert_eq!(second["label"], "focus_end");
        assert_eq!(second["seq"], 1);
    }

    #[test]
    fn test_unresolvable_target_rejected() {
        assert!(UdpMarkerSink::connect("not an address").is_err());
    }

    #[test]
    fn test_log_sink_never_fails() {
        let mut sink = LogMarkerSink::default();
        sink.emit("relaxation_start", 0.0).unwrap();
        sink.emit("relaxation_end", 5.0).unwrap();
        assert_eq!(sink.seq, 2);
    }
}
