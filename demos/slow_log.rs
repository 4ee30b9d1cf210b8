//! # Example: slow_log
//!
//! A request loop that logs through a deliberately slow handler without ever
//! waiting for it.
//!
//! Demonstrates how to:
//! - Bind a blocking closure with [`Supervisor::blocking`].
//! - Bind an async closure through the builder and call it via [`Supervisor::proxy`].
//! - Let the process drain everything on exit with [`offload::drain_all`].
//!
//! ## Flow
//! ```text
//! for i in 0..N:
//!     println!(i)                ─► immediate
//!     slow_log.submit(msg)       ─► queued, worker (re)spawned if idle
//!     slow_log_async(msg)        ─► queued on a second supervisor
//!
//! drain_all()                    ─► waits for both queues, joins both workers
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=offload=debug cargo run --example slow_log
//! ```

use std::time::Duration;

use offload::{HandlerFn, Supervisor, TaskError};
use tracing_subscriber::EnvFilter;

const REQUESTS: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let slow_log = Supervisor::blocking(|msg: String| {
        std::thread::sleep(Duration::from_millis(100));
        println!("{msg}");
        Ok::<(), TaskError>(())
    })?;

    let slow_log_async = Supervisor::builder(HandlerFn::arc(|msg: String| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("{msg}");
        Ok::<(), TaskError>(())
    }))
    .with_name("slow_log_async")
    .with_idle_timeout(Duration::from_millis(500))
    .build()?
    .proxy();

    for i in 0..REQUESTS {
        println!("{i}");
        slow_log.submit(format!("async slowlog: {i}"))?;
        slow_log_async(format!("async slowlog dec: {i}"));
    }

    println!("main done, draining");
    for report in offload::drain_all().await {
        println!(
            "{}: {} completed, {} failed, {} worker(s)",
            report.supervisor,
            report.stats.completed,
            report.stats.failed,
            report.stats.workers_spawned
        );
    }
    Ok(())
}
