use clap::{Parser, Subcommand};
use pricing_sdk::{PricingClient, SdkError};

#[derive(Parser)]
#[command(name = "pricing-cli")]
#[command(about = "Query a pricing gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retail total for a product and quantity
    Retail {
        code: String,
        qty: i64,
    },
    /// Wholesale total for a partner, product and quantity
    Wholesale {
        partner: String,
        code: String,
        qty: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = PricingClient::new(&cli.url);

    let result = match &cli.command {
        Commands::Retail { code, qty } => client.retail_total(code, *qty).await,
        Commands::Wholesale { partner, code, qty } => {
            client.wholesale_total(partner, code, *qty).await
        }
    };

    match result {
        Ok(total) => println!("{:.2}", total),
        Err(SdkError::Pricing(msg)) => {
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
