use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = api_template::cli::Cli::parse();
    if let Err(e) = api_template::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
