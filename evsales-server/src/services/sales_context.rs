use std::path::PathBuf;

use anyhow::Context;

use evsales_analyser::dataset::load_first;
use evsales_analyser::encoder::CategoricalEncoding;
use evsales_analyser::features::derive_features;
use evsales_analyser::forecast::{ForecastWindow, ManufacturerMetric, forecast};
use evsales_analyser::insights::{BrandSeries, InsightError, Insights, brand_yearly, insights};
use evsales_analyser::record::VehicleRecord;
use evsales_analyser::trainer::{FEATURE_NAMES, FeatureFrame, train_full};

use crate::configs::{Model, Settings};

/// Everything the handlers read, computed once before the server listens.
#[derive(Debug)]
pub struct SalesContext {
    pub source: Option<PathBuf>,
    pub records: Vec<VehicleRecord>,
    pub metrics: Vec<ManufacturerMetric>,
}

impl SalesContext {
    /// Loads the configured dataset, fits the serving forest and forecasts
    /// every manufacturer. Blocking; run it off the async runtime.
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        let dataset = load_first(&settings.dataset.candidates())?;
        tracing::info!("using dataset {}", dataset.path.display());

        let mut context = Self::from_records(dataset.records, &settings.model, &settings.forecast)?;
        context.source = Some(dataset.path);

        Ok(context)
    }

    pub fn from_records(
        mut records: Vec<VehicleRecord>,
        model: &Model,
        window: &ForecastWindow,
    ) -> anyhow::Result<Self> {
        derive_features(&mut records);

        let encoding = match &model.encoding_path {
            Some(path) => CategoricalEncoding::load(path).with_context(|| format!("loading encoding {path}"))?,
            None => CategoricalEncoding::fit(&records),
        };

        let frame = FeatureFrame::build(&records, &encoding)?;
        for (name, fill) in FEATURE_NAMES.iter().zip(frame.fills()) {
            tracing::debug!("undefined {name} values fill with {fill}");
        }

        let regressor = train_full(&frame, &model.forest())?;
        let metrics = forecast(&regressor, &frame, &records, window);
        tracing::info!("forecast ready for {} manufacturers", metrics.len());

        Ok(Self {
            source: None,
            records,
            metrics,
        })
    }

    /// Distinct manufacturer names, sorted.
    pub fn manufacturers(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.manufacturer.as_str())
    }

    pub fn metric(&self, manufacturer: &str) -> Option<&ManufacturerMetric> {
        self.metrics
            .binary_search_by(|m| m.manufacturer.as_str().cmp(manufacturer))
            .ok()
            .map(|i| &self.metrics[i])
    }

    pub fn insights(&self) -> Result<Insights, InsightError> {
        insights(&self.records)
    }

    pub fn brand(&self, manufacturer: &str) -> Option<BrandSeries> {
        brand_yearly(&self.records, manufacturer)
    }
}
