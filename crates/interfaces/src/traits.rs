use async_trait::async_trait;

/// A bidirectional, frame-oriented channel to one observer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Next inbound frame. `None` once the observer is gone.
    async fn receive(&self) -> Option<String>;
    async fn send(&self, frame: &str);
}
