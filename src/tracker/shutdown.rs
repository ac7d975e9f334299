use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancelation` on Ctrl-C. Returns early if the token gets cancelled some other way.
///
/// On Windows detached processes can't detect signals sent to them, so there the console `stop`
/// command is the reliable way out.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Received Ctrl-C, stopping"),
                Err(e) => error!("Failed to listen for Ctrl-C {e:?}"),
            }
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
