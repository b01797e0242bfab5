//! Response body bounded by the request deadline.
//!
//! The deadline that bounds the upstream call also bounds the body copy:
//! once it passes, [`DeadlineBody`] yields a timeout error and ends,
//! which drops the upstream stream. Whatever was already sent to the
//! client stays sent.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::BoxError;
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use tokio::time::{Instant, Sleep};

use crate::error::ProxyError;

pub struct DeadlineBody<B> {
    inner: B,
    deadline: Pin<Box<Sleep>>,
    timeout: Duration,
    expired: bool,
}

impl<B> DeadlineBody<B> {
    pub fn new(inner: B, deadline: Instant, timeout: Duration) -> Self {
        Self {
            inner,
            deadline: Box::pin(tokio::time::sleep_until(deadline)),
            timeout,
            expired: false,
        }
    }
}

impl<B> Body for DeadlineBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.expired {
            return Poll::Ready(None);
        }

        if this.deadline.as_mut().poll(cx).is_ready() {
            this.expired = true;
            return Poll::Ready(Some(Err(Box::new(ProxyError::Timeout(this.timeout)))));
        }

        Pin::new(&mut this.inner)
            .poll_frame(cx)
            .map(|frame| frame.map(|result| result.map_err(Into::into)))
    }

    fn is_end_stream(&self) -> bool {
        self.expired || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body_util::{BodyExt, Full};

    use super::*;

    /// Sends headers, then never produces a byte.
    struct Stalled;

    impl Body for Stalled {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Pending
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_body_times_out() {
        let timeout = Duration::from_millis(500);
        let mut body = DeadlineBody::new(Stalled, Instant::now() + timeout, timeout);

        let err = body.frame().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "upstream request timed out after 500ms");
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn body_within_deadline_passes_through() {
        let timeout = Duration::from_secs(5);
        let body = DeadlineBody::new(
            Full::new(Bytes::from_static(b"object bytes")),
            Instant::now() + timeout,
            timeout,
        );

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"object bytes");
    }

    #[tokio::test]
    async fn size_hint_comes_from_inner() {
        let timeout = Duration::from_secs(1);
        let body = DeadlineBody::new(
            Full::new(Bytes::from_static(b"12345")),
            Instant::now() + timeout,
            timeout,
        );
        assert_eq!(body.size_hint().exact(), Some(5));
    }
}
