mod args;
mod chain;
mod run;

#[tokio::main]
async fn main() {
    if let Err(e) = run::run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
