use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Router;

use evsales_analyser::cleaner::clean;
use evsales_analyser::dataset::read_raw;
use evsales_analyser::forecast::ForecastWindow;
use evsales_server::app::create_router;
use evsales_server::configs::{Dataset, Logger, Model, Server, Settings};
use evsales_server::services::SalesContext;

pub const FIXTURE: &str = "../evsales-analyser/datasets/tests/ev_raw.csv";

pub struct MockApp {
    pub context: Arc<SalesContext>,
    pub router: Router,
}

impl MockApp {
    pub fn new() -> Self {
        let (records, _) = clean(read_raw(FIXTURE).unwrap()).unwrap();
        let context = Arc::new(
            SalesContext::from_records(records, &test_model(), &ForecastWindow::default()).unwrap(),
        );

        Self::with_context(context)
    }

    pub fn with_context(context: Arc<SalesContext>) -> Self {
        let router = create_router(context.clone());

        Self { context, router }
    }
}

pub fn test_model() -> Model {
    Model {
        trees: NonZeroUsize::new(10).unwrap(),
        parallel: false,
        ..Model::default()
    }
}

pub fn test_settings(path: &str, fallback_paths: &[&str]) -> Settings {
    Settings {
        server: Server {
            host: String::from("127.0.0.1"),
            port: 0,
        },
        logger: Logger {
            level: String::from("debug"),
        },
        dataset: Dataset {
            path: path.to_string(),
            fallback_paths: fallback_paths.iter().map(|p| p.to_string()).collect(),
        },
        model: test_model(),
        forecast: ForecastWindow::default(),
    }
}
