use pipeline_demo::{logger, Config, Server, ServerError};

fn main() -> Result<(), ServerError> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging)?;

    // Build the Tokio runtime, sized by the workers setting when present
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|&n| n > 0) {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async {
        let server = Server::bind(&cfg).inspect_err(|e| {
            logger::log_error(&format!("Failed to start server: {e}"));
        })?;
        server.run().await
    })
}
