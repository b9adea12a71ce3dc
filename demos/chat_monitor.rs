//! Connect to a local dedicated server, enable callbacks and print
//! chat lines as they arrive.
//!
//! ```sh
//! cargo run --example chat_monitor -- 127.0.0.1 5000
//! ```

use gbxremote::{GbxClient, Value};

#[tokio::main]
async fn main() -> gbxremote::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gbxremote=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let client = GbxClient::new();

    client.subscribe_callback(|call| async move {
        if call.name == "ManiaPlanet.PlayerChat" || call.name == "TrackMania.PlayerChat" {
            let login = call.params.get(1).and_then(Value::as_str).unwrap_or("?");
            let text = call.params.get(2).and_then(Value::as_str).unwrap_or("");
            println!("[{login}] {text}");
        } else {
            println!("callback: {}", call.name);
        }
        Ok(())
    });

    client.subscribe_disconnected(|| async {
        println!("connection lost");
    });

    client.connect(&host, port).await?;

    let methods = client.call("system.listMethods", vec![]).await?;
    if let Some(list) = methods.as_array() {
        println!("server exposes {} methods", list.len());
    }

    client
        .call("EnableCallbacks", vec![Value::from(true)])
        .await?;

    // Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(gbxremote::GbxError::Io)?;
    client.disconnect().await
}
