#[tokio::main]
async fn main() {
    afisha_backend::run().await;
}
