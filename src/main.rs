// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use lightwire::backends::ReplayTransport;
use lightwire::config::load_and_validate_config;
use lightwire::observability::init_tracing;
use lightwire::{Client, RequestDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 4 {
        eprintln!("Usage: {} <config.yaml> <responses.yaml> <request-json>", args[0]);
        eprintln!(
            "Example: {} configs/mainnet.yaml recordings/block.yaml '{{\"method\":\"eth_blockNumber\",\"params\":[]}}'",
            args[0]
        );
        std::process::exit(1);
    }

    init_tracing("lightwire=info");

    let config = load_and_validate_config(&args[1])?;
    let transport = Arc::new(ReplayTransport::load(&args[2])?);
    let client = Client::builder(config).build()?;
    let driver = RequestDriver::for_client(transport, &client);

    let start = Instant::now();
    let outcome = driver.send(&client, &args[3]).await;
    let elapsed = start.elapsed();
    client.shutdown();

    let response = outcome?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    eprintln!("⏱️  {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}
