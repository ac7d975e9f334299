use std::time::Duration;

use anyhow::Result;
use timetally::{cli::run_cli, utils::runtime::multi_thread_runtime};
use tracing::error;

// Reading stdin parks a blocking thread that never returns on its own.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let runtime = multi_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}
