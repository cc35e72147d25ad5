use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl-C, or on SIGTERM where available
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Cancel `token` as soon as `signal` resolves
///
/// Runs beside the HTTP server so in-flight digest runs stop scheduling
/// recipients while the workers are still draining.
pub fn cancel_on<F>(signal: F, token: CancellationToken) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = signal => {
                tracing::info!("Shutdown signal received, cancelling digest runs");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_token_cancelled_when_signal_fires() {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<()>();

        let watcher = cancel_on(
            async move {
                let _ = rx.await;
            },
            token.clone(),
        );
        let child = token.child_token();
        assert!(!child.is_cancelled());

        tx.send(()).unwrap();
        watcher.await.unwrap();

        assert!(token.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_watcher_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let watcher = cancel_on(std::future::pending(), token.clone());

        token.cancel();
        watcher.await.unwrap();
    }
}
