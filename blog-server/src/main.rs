use blog_server::infrastructure::bootstrap;
use blog_server::presentation::server::start_rest_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap(None)?;
    start_rest_server(config).await
}
