use bwproxy_client::client::Client;
use bwproxy_client::error::Result;
use bwproxy_client::rpc::{PublishParams, QueryParams, SubscribeParams};
use clap::Parser;
use serde_json::json;

/// Simple program to exercise the gateway client: query, publish, subscribe.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The URL of the gateway (e.g., http://localhost:2222)
    #[arg(short, long)]
    url: String,

    /// The API key to stamp envelopes with
    #[arg(short, long)]
    key: String,

    /// Resource URI to query, publish on, and subscribe to
    #[arg(long, default_value = "scratch/demo")]
    uri: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let client = Client::new(args.url.as_str(), args.key.as_str())?;

    // Query current values on the URI.
    let result = client.query(QueryParams::new(args.uri.as_str())).await?;
    println!("query result: {:#}", result);

    // Publish a demo payload.
    client
        .publish(PublishParams::new(
            args.uri.as_str(),
            "2.0.0.0",
            json!({"msg": "hello from bwproxy-client"}),
        ))
        .await?;
    println!("published.");

    // Subscribe and print pushed messages for ten seconds.
    let mut sub = client.subscribe(SubscribeParams::new(args.uri.as_str())).await?;
    println!("subscribed with id {}", sub.id());

    let deadline = tokio::time::sleep(std::time::Duration::from_secs(10));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = &mut deadline => break,
            msg = sub.next() => match msg {
                Some(Ok(value)) => println!("message: {}", value),
                Some(Err(err)) => eprintln!("stream error: {}", err),
                None => break,
            }
        }
    }
    sub.close();

    Ok(())
}
