//! Transport primitives for the syslog output.
//!
//! [`Dialer`] and [`Connection`] form the seam between the connection state
//! machine and the socket library. [`NetDialer`] is the production dialer: it
//! opens TCP (optionally wrapped in TLS), UDP and Unix domain sockets.

use std::{
    io::{self, Write},
    net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

#[cfg(unix)]
use std::os::unix::net::{UnixDatagram, UnixStream};

use super::address::{Address, Endpoint, IpVersion, Network};

/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A live outbound connection.
pub trait Connection {
    /// Deliver one framed message in full.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Tear the connection down.
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Opens new connections to a fixed destination.
pub trait Dialer {
    type Connection: Connection;

    fn dial(&self) -> io::Result<Self::Connection>;

    /// Human readable destination used in errors and logs.
    fn target(&self) -> String;
}

/// TLS connection options.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Active socket connection state.
#[derive(Debug)]
pub enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
    #[cfg(unix)]
    Unixgram(UnixDatagram),
}

fn check_datagram(sent: usize, len: usize) -> io::Result<()> {
    if sent == len {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("datagram truncated: sent {sent} of {len} bytes"),
        ))
    }
}

impl Connection for ActiveConnection {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
            ActiveConnection::Tls(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
            ActiveConnection::Udp(socket) => check_datagram(socket.send(frame)?, frame.len()),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => {
                stream.write_all(frame)?;
                stream.flush()
            }
            #[cfg(unix)]
            ActiveConnection::Unixgram(socket) => {
                check_datagram(socket.send(frame)?, frame.len())
            }
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.shutdown(Shutdown::Both),
            ActiveConnection::Tls(stream) => {
                let tls_result = stream.shutdown();
                stream.get_ref().shutdown(Shutdown::Both)?;
                tls_result
            }
            ActiveConnection::Udp(_) => Ok(()),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            ActiveConnection::Unixgram(_) => Ok(()),
        }
    }
}

/// Dialer for the transports named by an [`Address`].
#[derive(Clone, Debug)]
pub struct NetDialer {
    pub address: Address,
    pub tls: Option<TlsOptions>,
    pub connect_timeout: Duration,
    pub write_timeout: Option<Duration>,
}

impl NetDialer {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            tls: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: None,
        }
    }

    fn socket_addrs(host: &str, port: u16, version: IpVersion) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()?
            .filter(|addr| match version {
                IpVersion::Any => true,
                IpVersion::V4 => addr.is_ipv4(),
                IpVersion::V6 => addr.is_ipv6(),
            })
            .collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no usable address for {host}:{port}"),
            ));
        }
        Ok(addrs)
    }

    fn connect_tcp(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in Self::socket_addrs(host, port, self.address.network.ip_version())? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nonblocking(false)?;
                    stream.set_write_timeout(self.write_timeout)?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("unable to connect to {host}:{port}"),
            )
        }))
    }

    fn connect_tls(&self, stream: TcpStream, tls: &TlsOptions) -> io::Result<ActiveConnection> {
        let connector = tls.connector()?;
        stream.set_read_timeout(Some(self.connect_timeout))?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        let stream = connector
            .connect(&tls.domain, stream)
            .map_err(io::Error::other)?;
        let tcp_ref = stream.get_ref();
        tcp_ref.set_read_timeout(None)?;
        tcp_ref.set_write_timeout(self.write_timeout)?;
        Ok(ActiveConnection::Tls(Box::new(stream)))
    }

    fn connect_udp(&self, host: &str, port: u16) -> io::Result<UdpSocket> {
        let mut last_err = None;
        for addr in Self::socket_addrs(host, port, self.address.network.ip_version())? {
            let local = if addr.is_ipv4() {
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
            } else {
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
            };
            let attempt = UdpSocket::bind(local).and_then(|socket| {
                socket.connect(addr)?;
                socket.set_write_timeout(self.write_timeout)?;
                Ok(socket)
            });
            match attempt {
                Ok(socket) => return Ok(socket),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("unable to open udp socket for {host}:{port}"),
            )
        }))
    }

    #[cfg(unix)]
    fn connect_local(&self, path: &std::path::Path) -> io::Result<ActiveConnection> {
        if self.address.network == Network::Unixgram {
            let socket = UnixDatagram::unbound()?;
            socket.connect(path)?;
            socket.set_write_timeout(self.write_timeout)?;
            Ok(ActiveConnection::Unixgram(socket))
        } else {
            let stream = UnixStream::connect(path)?;
            stream.set_write_timeout(self.write_timeout)?;
            Ok(ActiveConnection::Unix(stream))
        }
    }

    #[cfg(not(unix))]
    fn connect_local(&self, path: &std::path::Path) -> io::Result<ActiveConnection> {
        let _ = path;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix domain sockets are not supported on this platform",
        ))
    }
}

impl Dialer for NetDialer {
    type Connection = ActiveConnection;

    fn dial(&self) -> io::Result<ActiveConnection> {
        match &self.address.endpoint {
            Endpoint::Path(path) => self.connect_local(path),
            Endpoint::Host { host, port } if self.address.network.is_stream() => {
                let stream = self.connect_tcp(host, *port)?;
                match &self.tls {
                    Some(tls) => self.connect_tls(stream, tls),
                    None => Ok(ActiveConnection::PlainTcp(stream)),
                }
            }
            Endpoint::Host { host, port } => {
                Ok(ActiveConnection::Udp(self.connect_udp(host, *port)?))
            }
        }
    }

    fn target(&self) -> String {
        self.address.to_string()
    }
}
