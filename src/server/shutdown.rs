use tokio::signal;
use tokio::sync::watch;

/// Sends `Some(false)` once the process receives `ctrl-c`.
///
pub(super) async fn wait_for_ctrl_c(tx: watch::Sender<Option<bool>>) {
    if signal::ctrl_c().await.is_err() {
        tracing::error!("unable to register the 'ctrl-c' signal");
    } else if tx.send(Some(false)).is_err() {
        tracing::error!("unable to notify connections to shutdown");
    }
}
