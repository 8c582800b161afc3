//! Example watching a mesh configuration file and printing it as it changes.
//!
//! Edit the file while this runs; valid edits show up within a moment, broken
//! ones are logged and the previous configuration stays in place.
//!
//! Run with: cargo run --example watch_mesh -- /path/to/mesh.yaml
//! Set `RUST_LOG=meshconfig_cache=debug` to see every reload.

use meshconfig_cache::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mesh.yaml".to_string());
    println!("=== Watching {} ===\n", path);

    let cache = FsCache::from_file(&path).await?;
    print_mesh(&cache.get());

    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    ticker.tick().await;
    let mut last = cache.get();

    for _ in 0..30 {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }

        let current = cache.get();
        if *current != *last {
            println!("--- Configuration changed ---");
            print_mesh(&current);
            last = current;
        }
    }

    let stats = cache.stats();
    println!(
        "\nReloads: {} attempted, {} applied, {} rejected",
        stats.attempts, stats.successes, stats.failures
    );

    cache.close()?;
    cache.stopped().await;
    println!("Stopped watching; last value still available: {}", cache.get().ingress_service);

    Ok(())
}

fn print_mesh(mesh: &MeshConfig) {
    println!("  ingressService:   {}", mesh.ingress_service);
    println!("  ingressClass:     {}", mesh.ingress_class);
    println!("  trustDomain:      {}", mesh.trust_domain);
    println!("  aliases:          {:?}", mesh.trust_domain_aliases);
    println!("  connectTimeout:   {:?}", mesh.connect_timeout);
    println!("  enableTracing:    {}", mesh.enable_tracing);
    println!("  outbound policy:  {:?}", mesh.outbound_traffic_policy.mode);
    println!();
}
