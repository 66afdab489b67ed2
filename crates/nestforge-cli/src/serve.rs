//! Serve command implementation for nestforge CLI.

use std::path::PathBuf;

use nestforge_server::ServerConfig;

use crate::colors;

/// Start the HTTP server.
pub async fn execute(
    host: String,
    port: u16,
    modules_root: PathBuf,
    generator: String,
) -> anyhow::Result<()> {
    let config = ServerConfig {
        host,
        port,
        modules_root,
        generator,
    };

    println!("\n{}nestforge server{}", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Modules:{} {}",
        colors::CYAN,
        colors::RESET,
        config.modules_root.display()
    );
    println!(
        "{}  ◆ Generator:{} {}",
        colors::CYAN,
        colors::RESET,
        config.generator
    );
    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    nestforge_server::serve(config).await?;

    Ok(())
}
