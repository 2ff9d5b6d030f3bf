//! Hosts driven by completion callbacks can hand any facade future to
//! [`with_callback`]; the callback receives exactly one `Result`.

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;

/// Run `future` on the tokio runtime and pass its outcome to `callback`
///
/// Must be called from within a tokio runtime. The returned handle completes
/// after the callback has run.
pub fn with_callback<T, Fut, F>(future: Fut, callback: F) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    F: FnOnce(Result<T>) + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = future.await;
        debug!("Delivering result to callback, ok={}", outcome.is_ok());
        callback(outcome);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bridge::mock::MockBridge, client::GoogleFit, error::FitError, types::QueryOptions,
    };
    use serde_json::json;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_callback_receives_success() {
        let bridge = MockBridge::new();
        bridge.respond("isAvailable", json!(true));
        let fit = GoogleFit::new(bridge);

        let (tx, rx) = oneshot::channel();
        let handle = with_callback(
            async move { fit.is_available().await },
            move |result| {
                let _ = tx.send(result);
            },
        );

        handle.await.unwrap();
        assert!(rx.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_callback_receives_no_data() {
        let fit = GoogleFit::new(MockBridge::new());

        let (tx, rx) = oneshot::channel();
        with_callback(
            async move { fit.get_height_samples(&QueryOptions::new()).await },
            move |result| {
                let _ = tx.send(result);
            },
        )
        .await
        .unwrap();

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, FitError::NoData { kind: "height" }));
    }
}
