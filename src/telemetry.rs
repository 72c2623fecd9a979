use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::collections::HashSet;

pub struct Metrics {
    request_counter: IntCounterVec,
    prediction_duration: HistogramVec,
    prediction_errors: IntCounterVec,
    predicted_levels: IntCounterVec,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("focus_prediction".into()), None)?;

        let request_counter = IntCounterVec::new(
            Opts::new("requests_total", "Total number of requests"),
            &["route"],
        )?;

        let boundaries = generate_boundaries((5, 25, 50, 250, 1000));

        let prediction_duration = HistogramVec::new(
            HistogramOpts::new(
                "prediction_duration_ms",
                "Duration of focus classification in milliseconds",
            )
            .buckets(boundaries),
            &["route"],
        )?;

        let prediction_errors = IntCounterVec::new(
            Opts::new(
                "prediction_errors_total",
                "Failed classifications by error kind",
            ),
            &["kind"],
        )?;

        let predicted_levels = IntCounterVec::new(
            Opts::new(
                "predicted_level_total",
                "Classifications by predicted focus level",
            ),
            &["level"],
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(prediction_duration.clone()))?;
        registry.register(Box::new(prediction_errors.clone()))?;
        registry.register(Box::new(predicted_levels.clone()))?;

        Ok(Metrics {
            request_counter,
            prediction_duration,
            prediction_errors,
            predicted_levels,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        self.request_counter.with_label_values(&[route]).inc();
    }

    pub fn record_prediction_duration(&self, duration_ms: u64, route: &str) {
        self.prediction_duration
            .with_label_values(&[route])
            .observe(duration_ms as f64);
    }

    pub fn record_prediction_error(&self, kind: &str) {
        self.prediction_errors.with_label_values(&[kind]).inc();
    }

    pub fn record_predicted_level(&self, level: usize) {
        let level = level.to_string();
        self.predicted_levels
            .with_label_values(&[level.as_str()])
            .inc();
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 5;
    let middle_step: usize = 5;
    let end_step: usize = 50;
    let tail_step: usize = 250;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_generate_boundaries() {
        let get = generate_boundaries((5, 25, 50, 250, 1000));
        let expected = vec![
            5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 100.0, 150.0, 200.0, 250.0,
            500.0, 750.0, 1000.0,
        ];

        assert_eq!(get, expected);
    }

    #[test]
    fn test_metrics_are_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("/predict");
        metrics.record_prediction_duration(12, "/predict");
        metrics.record_prediction_error("decode");
        metrics.record_predicted_level(3);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metrics.registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("focus_prediction_requests_total{route=\"/predict\"} 1"));
        assert!(text.contains("focus_prediction_prediction_errors_total{kind=\"decode\"} 1"));
        assert!(text.contains("focus_prediction_predicted_level_total{level=\"3\"} 1"));
    }
}
