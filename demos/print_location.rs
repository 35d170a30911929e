use clap::Parser;

use gpsd_client::client::{ConnectOptions, GpsdClient};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(short, long, default_value = "2947")]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut client = GpsdClient::new();
    let options = ConnectOptions::default().host(&args.host).port(args.port);

    if let Err(e) = client.connect_with(options).await {
        eprintln!("Failed to connect: {e}");
        return;
    }

    match client.get_location().await {
        Ok(location) => match (location.latitude, location.longitude) {
            (Some(lat), Some(lon)) => {
                println!("Current position: lat {lat:.6}, lon {lon:.6} ({:?})", location.fix);
            }
            _ => println!("No position yet ({:?})", location.fix),
        },
        Err(e) => eprintln!("Error reading location: {e}"),
    }

    client.close();
}
