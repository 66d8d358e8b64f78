//! Browser timer behind the delay port.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use askdocs_core::ports::DelayPort;

pub struct BrowserDelay;

#[async_trait(?Send)]
impl DelayPort for BrowserDelay {
    async fn delay_ms(&self, ms: u32) {
        TimeoutFuture::new(ms).await;
    }
}
