//! Transport layer that logs every JSON-RPC request with its method names
//! and how long the node took to answer.

use {
    alloy::{
        rpc::json_rpc::{RequestPacket, ResponsePacket},
        transports::TransportError,
    },
    std::{
        pin::Pin,
        task::{Context, Poll},
        time::Instant,
    },
    tower::{Layer, Service},
};

pub(crate) struct InstrumentationLayer;

impl<S> Layer<S> for InstrumentationLayer {
    type Service = InstrumentedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentedService { inner }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InstrumentedService<S> {
    inner: S,
}

impl<S> Service<RequestPacket> for InstrumentedService<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
{
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = ResponsePacket;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let methods: Vec<String> = req
            .requests()
            .iter()
            .map(|request| request.method().to_string())
            .collect();
        tracing::trace!(?methods, "executing request");
        let start = Instant::now();
        let response = self.inner.call(req);

        Box::pin(async move {
            let result = response.await;
            let elapsed = start.elapsed();
            match &result {
                Ok(_) => tracing::trace!(?methods, ?elapsed, "request finished"),
                Err(err) => tracing::debug!(?methods, ?elapsed, ?err, "request failed"),
            }
            result
        })
    }
}
