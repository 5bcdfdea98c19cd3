#[tokio::main]
async fn main() {
    if let Err(e) = hepatica_lib::run().await {
        eprintln!("hepatica: {e}");
        std::process::exit(1);
    }
}
