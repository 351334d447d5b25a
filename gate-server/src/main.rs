use gate_server::{Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Work dir must exist before the file logger can write into it
    config.ensure_work_dir_structure()?;
    let log_dir = config.log_dir();
    gate_server::init_logger_with_file(Some(&config.log_level), log_dir.to_str());

    tracing::info!("Gate server starting...");

    let server = Server::new(config);
    server.run().await
}
