//! UDP transport implementation

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use oscine_core::{codec, OscPacket, TimeTag, MAX_DATAGRAM_SIZE};
use oscine_dispatch::PacketDispatcher;

use crate::error::{Result, TransportError};
use crate::traits::{PacketSink, PacketSource};

/// UDP configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Buffer size for receiving
    pub recv_buffer_size: usize,
    /// Payload ceiling for outbound packets
    pub max_packet_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            recv_buffer_size: 65536,
            max_packet_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// A bound UDP socket speaking OSC packets.
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    config: UdpConfig,
}

impl UdpEndpoint {
    /// Bind to a local address.
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, UdpConfig::default()).await
    }

    /// Bind with config.
    pub async fn bind_with_config(addr: &str, config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        info!(addr = %socket.local_addr()?, "udp bound");

        Ok(Self {
            socket: Arc::new(socket),
            config,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Serialize and send one packet to a specific address.
    ///
    /// Fails with `PayloadTooLarge` (wrapped as a codec error) before
    /// anything is written if the packet would exceed the configured
    /// payload ceiling; an oversized packet is never truncated or split.
    pub async fn send_to(&self, packet: &OscPacket, target: SocketAddr) -> Result<()> {
        let bytes = codec::encode(packet, self.config.max_packet_size)?;
        self.socket
            .send_to(&bytes, target)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Create a sender for a specific remote address.
    pub fn sender_to(&self, remote: SocketAddr) -> OscSender {
        OscSender {
            socket: Arc::clone(&self.socket),
            remote,
            max_packet_size: self.config.max_packet_size,
        }
    }

    /// Start receiving packets as a decoded stream.
    ///
    /// Malformed datagrams are logged and skipped. The spawned task exits
    /// when the returned receiver is dropped.
    pub fn packet_stream(&self) -> PacketReceiver {
        let (tx, rx) = mpsc::channel(100);
        let socket = Arc::clone(&self.socket);
        let recv_buffer_size = self.config.recv_buffer_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; recv_buffer_size];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, from)) => {
                        debug!(len, %from, "datagram received");
                        match codec::decode(&buf[..len]) {
                            Ok(packet) => {
                                if tx.send((packet, from)).await.is_err() {
                                    break;
                                }
                            }
                            Err(error) => warn!(%error, %from, "dropping malformed packet"),
                        }
                    }
                    Err(error) => {
                        warn!(%error, "udp receive error");
                    }
                }
            }
        });

        PacketReceiver { rx }
    }

    /// Run the receive loop, handing every decoded packet to `dispatcher`
    /// with the arrival time as its timetag.
    ///
    /// A parse failure affects only the offending datagram. The loop stops
    /// when the returned handle is told to, which also unblocks a pending
    /// receive.
    pub fn serve(&self, dispatcher: Arc<PacketDispatcher>) -> ReceiverHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let socket = Arc::clone(&self.socket);
        let recv_buffer_size = self.config.recv_buffer_size;

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; recv_buffer_size];
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!("receive loop stopped");
                        break;
                    }
                    received = socket.recv_from(&mut buf) => match received {
                        Ok((len, from)) => {
                            debug!(len, %from, "datagram received");
                            match codec::decode(&buf[..len]) {
                                Ok(packet) => {
                                    let report = dispatcher.dispatch(&packet, TimeTag::now());
                                    if !report.is_clean() {
                                        warn!(
                                            failures = report.failures.len(),
                                            %from,
                                            "listener failures during dispatch"
                                        );
                                    }
                                }
                                Err(error) => warn!(%error, %from, "dropping malformed packet"),
                            }
                        }
                        Err(error) => {
                            warn!(%error, "udp receive error");
                        }
                    }
                }
            }
        });

        ReceiverHandle {
            shutdown_tx,
            handle,
        }
    }
}

/// UDP sender to a specific remote.
pub struct OscSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    max_packet_size: usize,
}

impl OscSender {
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Serialize and send one packet, applying the payload ceiling.
    pub async fn send(&self, packet: &OscPacket) -> Result<()> {
        let bytes = codec::encode(packet, self.max_packet_size)?;
        self.socket
            .send_to(&bytes, self.remote)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PacketSink for OscSender {
    async fn send_packet(&self, packet: &OscPacket) -> Result<()> {
        self.send(packet).await
    }

    fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

/// Stream of decoded packets from a [`UdpEndpoint`].
pub struct PacketReceiver {
    rx: mpsc::Receiver<(OscPacket, SocketAddr)>,
}

impl PacketReceiver {
    /// Receive the next packet with its source address.
    pub async fn recv(&mut self) -> Option<(OscPacket, SocketAddr)> {
        self.rx.recv().await
    }
}

#[async_trait]
impl PacketSource for PacketReceiver {
    async fn recv_packet(&mut self) -> Option<(OscPacket, SocketAddr)> {
        self.rx.recv().await
    }
}

/// Handle to a running receive loop.
pub struct ReceiverHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReceiverHandle {
    /// Stop the loop and wait for it to wind down. A receive in flight is
    /// interrupted rather than waited out.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscine_core::{OscArg, OscBundle, OscMessage};
    use oscine_dispatch::DispatcherConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_udp_bind() {
        let endpoint = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        assert!(endpoint.local_addr().unwrap().port() > 0);
    }

    #[tokio::test]
    async fn test_packet_roundtrip_over_socket() {
        let server = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let client = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let mut stream = server.packet_stream();

        let packet = OscPacket::Message(
            OscMessage::new("/s_new", vec![OscArg::Int32(1001), OscArg::Float32(440.0)])
                .unwrap(),
        );
        let sender = client.sender_to(server_addr);
        sender.send(&packet).await.unwrap();

        let (received, from) = stream.recv().await.unwrap();
        assert_eq!(received, packet);
        assert_eq!(from.port(), client.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn test_oversized_packet_refused_before_send() {
        let endpoint = UdpEndpoint::bind_with_config(
            "127.0.0.1:0",
            UdpConfig {
                recv_buffer_size: 65536,
                max_packet_size: 128,
            },
        )
        .await
        .unwrap();

        let oversized = OscPacket::Message(
            OscMessage::new("/blob", vec![OscArg::Blob(vec![0; 4096])]).unwrap(),
        );
        let target = endpoint.local_addr().unwrap();
        match endpoint.send_to(&oversized, target).await {
            Err(TransportError::Codec(oscine_core::Error::PayloadTooLarge { .. })) => {}
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_serve_dispatches_and_survives_garbage() {
        let server = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let client = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let dispatcher = Arc::new(PacketDispatcher::new(DispatcherConfig::default()));
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            dispatcher
                .add_listener("/echo/*", move |_time, _msg: &OscMessage| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let handle = server.serve(Arc::clone(&dispatcher));

        // Garbage datagram first; the loop must keep going.
        client
            .socket
            .send_to(b"not osc at all", server_addr)
            .await
            .unwrap();

        let bundle = OscPacket::Bundle(OscBundle::new(
            TimeTag::Immediate,
            vec![
                OscPacket::Message(OscMessage::bare("/echo/a").unwrap()),
                OscPacket::Message(OscMessage::bare("/echo/b").unwrap()),
            ],
        ));
        client.send_to(&bundle, server_addr).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while hits.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("bundle contents should be dispatched");

        assert!(handle.is_running());
        handle.stop().await;
    }
}
