use console::style;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    plexi::logging::init();

    if let Err(err) = plexi::run().await {
        eprintln!("{} {err:#}", style("✗ Error:").red().bold());
        std::process::exit(1);
    }
}
