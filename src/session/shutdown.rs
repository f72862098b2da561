use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancelation` on Ctrl-C, ending the tracked interval the same way the stop button does.
/// Returns early if the token is cancelled elsewhere.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Received interrupt, stopping session");
                cancelation.cancel();
            }
            Err(e) => error!("Failed to listen for interrupt {e:?}"),
        },
        _ = cancelation.cancelled() => (),
    };
}
