use crate::prometheus::StringRender;
use crate::{ExportError, Result};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::{conn::AddrStream, Server as HyperServer};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Error, Response};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::pin::Pin;

type ServerFuture = Pin<Box<dyn Future<Output = std::result::Result<(), Error>> + Send + 'static>>;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// HTTP endpoint answering every request with the rendered page
pub struct Server {
    listen_address: SocketAddr,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from([0, 0, 0, 0]), 9000)),
        }
    }
}

impl Server {
    pub fn new(listen_address: impl Into<SocketAddr>) -> Self {
        Self {
            listen_address: listen_address.into(),
        }
    }

    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Binds the listener and returns the future serving requests.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(
        self,
        renderer: impl StringRender + Send + Sync + Clone + 'static,
    ) -> Result<ServerFuture> {
        let server = HyperServer::try_bind(&self.listen_address)
            .map_err(|err| ExportError::Http(err.to_string()))?;
        tracing::info!(address = %self.listen_address, "serving monitor stats");
        let exporter = async move {
            let make_svc = make_service_fn(move |_socket: &AddrStream| {
                let renderer = renderer.clone();
                async move {
                    Ok::<_, Error>(service_fn(move |_| {
                        let mut output = String::new();
                        renderer.render(&mut output);
                        let mut response = Response::new(Body::from(output));
                        response
                            .headers_mut()
                            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
                        async move { Ok::<_, Error>(response) }
                    }))
                }
            });
            server.serve(make_svc).await
        };
        Ok(Box::pin(exporter))
    }
}
