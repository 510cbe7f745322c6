use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Number of handled form requests. Tagged with outcome.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with outcome.",
};

pub const DOWNSTREAM_DURATION: MetricDef = MetricDef {
    name: "downstream.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of the case submission to the downstream API in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, REQUEST_DURATION, DOWNSTREAM_DURATION];
