use std::sync::Arc;

use chrono::NaiveDate;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::Instrument;

use crate::{
    api::Client,
    metrics::{Metrics, Outcome},
    select::select_price,
    snapshot::Snapshot,
    ItemId,
};

/// Fetches and prices every item, using today's local date for the price selection
pub async fn run_batch(
    client: Arc<Client>,
    items: &[ItemId],
    concurrency: usize,
    metrics: &Metrics,
) -> Snapshot {
    let today = chrono::Local::now().date_naive();

    run_batch_on(client, items, concurrency, today, metrics).await
}

/// Fetches and prices every item with at most `concurrency` requests in flight. A failing item
/// gets a price of 0 and never stops the others.
#[tracing::instrument(skip(client, items, metrics), fields(total_items = items.len()))]
pub async fn run_batch_on(
    client: Arc<Client>,
    items: &[ItemId],
    concurrency: usize,
    today: NaiveDate,
    metrics: &Metrics,
) -> Snapshot {
    let items = {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        items
            .iter()
            .copied()
            .filter(|item| seen.insert(*item))
            .collect::<Vec<_>>()
    };

    let start_time = std::time::Instant::now();

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (slot, item) in items.iter().copied().enumerate() {
        let client = client.clone();
        let permits = permits.clone();

        let task = async move {
            let _permit = permits.acquire_owned().await.ok();

            let (price, outcome) = match client.try_fetch_series(item).await {
                Ok(series) => match select_price(&series, today) {
                    0 => (0, Outcome::NoData),
                    price => (price, Outcome::Priced),
                },
                Err(e) => {
                    tracing::warn!("Loading series {:?}", e);
                    (0, Outcome::Failed)
                }
            };

            match outcome {
                Outcome::Priced => tracing::info!("{} copper", price),
                Outcome::NoData | Outcome::Failed => tracing::info!("No data"),
            }

            (slot, price, outcome)
        }
        .instrument(tracing::info_span!(
            "Updating Item",
            item,
            current = slot + 1,
            total_items = items.len()
        ));

        tasks.spawn(task);
    }

    // Every slot belongs to exactly one item and is only written once its task finished
    let mut slots: Vec<Option<u64>> = vec![None; items.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, price, outcome)) => {
                metrics.record(items[slot], price, outcome);
                slots[slot] = Some(price);
            }
            Err(e) => {
                tracing::error!("Item task failed {:?}", e);
            }
        }
    }

    let prices = items
        .iter()
        .zip(slots)
        .map(|(item, slot)| {
            let price = slot.unwrap_or_else(|| {
                metrics.record(*item, 0, Outcome::Failed);
                0
            });

            (*item, price)
        })
        .collect::<Vec<_>>();

    let last_update = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics.set_last_update(last_update);

    tracing::info!("Updating prices took {:?}", start_time.elapsed());

    Snapshot::new(prices, last_update)
}
