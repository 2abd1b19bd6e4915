use crate::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A usable price was found
    Priced,
    /// The series was loaded but had no usable price
    NoData,
    /// The series could not be loaded
    Failed,
}

impl From<Outcome> for &'static str {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Priced => "priced",
            Outcome::NoData => "no_data",
            Outcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Metrics {
    registry: prometheus::Registry,
    prices: prometheus::GaugeVec,
    outcomes: prometheus::IntCounterVec,
    last_update: prometheus::Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = prometheus::Registry::new();

        let prices = prometheus::GaugeVec::new(
            prometheus::Opts::new("item_price", "The selected minimum buyout (in copper)"),
            &["item"],
        )?;
        registry.register(Box::new(prices.clone()))?;

        let outcomes = prometheus::IntCounterVec::new(
            prometheus::Opts::new("item_outcomes", "The number of items per update outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(outcomes.clone()))?;

        let last_update =
            prometheus::Gauge::new("last_updated", "The Unix Timestamp of the last update")?;
        registry.register(Box::new(last_update.clone()))?;

        Ok(Self {
            registry,
            prices,
            outcomes,
            last_update,
        })
    }

    pub fn record(&self, item: ItemId, price: u64, outcome: Outcome) {
        self.prices
            .with_label_values(&[&item.to_string()])
            .set(price as f64);
        let outcome: &str = outcome.into();
        self.outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn set_last_update(&self, timestamp: f64) {
        self.last_update.set(timestamp);
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        let outcome: &str = outcome.into();
        self.outcomes.with_label_values(&[outcome]).get()
    }

    /// The metrics in the prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = prometheus::TextEncoder::new();
        encoder.encode_to_string(&self.registry.gather())
    }
}
