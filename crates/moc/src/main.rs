#[tokio::main]
async fn main() {
    moc::start(std::env::args()).await;
}
