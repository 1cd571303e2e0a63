//! Synthetic load-test client for the balancer's data channel.
//!
//! Fires a fixed number of requests from concurrent workers with a
//! random pause between calls, then prints a success/failure tally.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::Rng;

#[derive(Parser)]
#[command(name = "loadgen")]
#[command(about = "Synthetic load generator for the balancer", long_about = None)]
struct Args {
    /// URL to hit through the balancer.
    #[arg(long, default_value = "http://127.0.0.1:8080/ping")]
    url: String,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 25)]
    concurrency: u32,

    /// Total number of requests across all workers.
    #[arg(long, default_value_t = 1000)]
    requests: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let success = Arc::new(AtomicU32::new(0));
    let failed = Arc::new(AtomicU32::new(0));

    let client = reqwest::Client::new();
    let per_worker = args.requests / args.concurrency.max(1);

    let mut workers = Vec::with_capacity(args.concurrency as usize);
    for i in 0..args.concurrency {
        let client = client.clone();
        let url = args.url.clone();
        let success = success.clone();
        let failed = failed.clone();

        workers.push(tokio::spawn(async move {
            println!("starting worker #{i}");
            for _ in 0..per_worker {
                let pause = rand::thread_rng().gen_range(0..100);
                tokio::time::sleep(Duration::from_millis(pause)).await;

                match client.post(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        success.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(_) | Err(_) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            println!("stopping worker #{i}");
        }));
    }

    for worker in workers {
        worker.await?;
    }

    println!("requests done: {}", args.requests);
    println!("success: {}", success.load(Ordering::Relaxed));
    println!("failed: {}", failed.load(Ordering::Relaxed));

    Ok(())
}
