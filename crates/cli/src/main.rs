use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(err) = strike_cli::run(strike_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
