use anyhow::Result;

/// Collector backends poll on their own threads, so a single threaded runtime is enough for the
/// session flow and timers.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
