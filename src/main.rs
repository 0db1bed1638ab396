use anyhow::Result;
use termwl::core::keymap::keymap_bytes;
use termwl::core::server::FRAME_INTERVAL;
use termwl::{Server, ServerConfig};

fn main() -> Result<()> {
    // Initialize logging
    // Set default log level to info
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,termwl=debug");
    }
    // Initialize logging with standardized format
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_ansi(false)
        .init();

    let config = ServerConfig::from_env();
    let mut server = Server::bind(config, keymap_bytes())?;
    tracing::info!(
        "termwl up, socket {}",
        server.socket_path().display()
    );

    let started = std::time::Instant::now();
    let mut last_revisions = 0u64;
    loop {
        server.poll_accept()?;
        server.frame_tick(started.elapsed().as_millis() as u32);

        // The scene feed is what a frontend renders; headless we just
        // watch it advance.
        let revisions: u64 = server.scenes().iter().map(|s| s.revision).sum();
        if revisions != last_revisions {
            tracing::debug!(
                "scene updated: {} connection(s), revision sum {}",
                server.connection_count(),
                revisions
            );
            last_revisions = revisions;
        }

        std::thread::sleep(FRAME_INTERVAL);
    }
}
