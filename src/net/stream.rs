use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use native_tls::TlsConnector;

use crate::error::{Error, Result};

/// The transport stream a pooled connection owns: plain TCP or TLS over TCP.
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Plain(tcp) => f.debug_tuple("Plain").field(tcp).finish(),
            Stream::Tls(tls) => f.debug_tuple("Tls").field(tls.get_ref()).finish(),
        }
    }
}

impl Stream {
    /// Perform a TLS handshake over an established TCP connection,
    /// verifying the peer against `hostname`.
    pub fn wrap_tls(
        stream: TcpStream,
        connector: &TlsConnector,
        hostname: &str,
    ) -> Result<Stream> {
        tracing::trace!(hostname, "starting TLS handshake");
        let tls = connector
            .connect(hostname, stream)
            .map_err(|e| Error::request(io::Error::other(e.to_string())))?;
        Ok(Stream::Tls(Box::new(tls)))
    }

    /// Shut down both directions, swallowing errors. The peer may have
    /// already closed its side.
    pub fn shutdown(&mut self) {
        match self {
            Stream::Plain(tcp) => {
                let _ = tcp.shutdown(Shutdown::Both);
            }
            Stream::Tls(tls) => {
                let _ = tls.shutdown();
                let _ = tls.get_ref().shutdown(Shutdown::Both);
            }
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(tcp) => tcp.read(buf),
            Stream::Tls(tls) => tls.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(tcp) => tcp.write(buf),
            Stream::Tls(tls) => tls.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(tcp) => tcp.flush(),
            Stream::Tls(tls) => tls.flush(),
        }
    }
}

/// Open a TCP connection with the configured timeout applied to the connect
/// itself and to every subsequent read and write. Nagle's algorithm is
/// disabled so small request writes go out immediately.
pub fn tcp_connect(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no addresses resolved for {host}:{port}"),
        )
    }))
}
