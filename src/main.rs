use std::{process::ExitCode, sync::Arc};

fn main() -> ExitCode {
    let subscriber = tracing_subscriber::fmt().with_ansi(false).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting up logging: {e:?}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Building runtime {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(update())
}

async fn update() -> ExitCode {
    let config = match southseas::Config::embedded() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Loading config {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "Updating {} items from {} into {:?}",
        config.items.len(),
        config.endpoint,
        config.output
    );

    let transport = match southseas::transport::from_config(
        &config.transport,
        config.timeout(),
        |item| config.item_url(item),
    )
    .await
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Setting up transport {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let metrics = match southseas::Metrics::new() {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Registering metrics {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = Arc::new(southseas::Client::new(
        transport,
        config.endpoint.clone(),
        config.retry.clone(),
    ));

    let snapshot = southseas::run_batch(client, &config.items, config.concurrency, &metrics).await;

    tracing::info!(
        "{} priced, {} without data, {} failed",
        metrics.count(southseas::Outcome::Priced),
        metrics.count(southseas::Outcome::NoData),
        metrics.count(southseas::Outcome::Failed)
    );
    match metrics.encode() {
        Ok(text) => tracing::debug!("Metrics\n{}", text),
        Err(e) => tracing::error!("Encoding Metrics {:?}", e),
    }

    if let Err(e) = snapshot.write(&config.output).await {
        tracing::error!("Writing {:?} {}", config.output, e);
        return ExitCode::FAILURE;
    }

    tracing::info!("Wrote {:?}", config.output);

    ExitCode::SUCCESS
}
