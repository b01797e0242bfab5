use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = gcs_helper::cli::Cli::parse();
    if let Err(e) = gcs_helper::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
