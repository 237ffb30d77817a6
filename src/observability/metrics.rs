use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounterVec,
    pub claims_total: IntCounterVec,
    pub pin_verifications_total: IntCounterVec,
    pub fraud_alerts_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders placed, by kind"),
            &["kind"],
        )
        .expect("valid orders_created_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let pin_verifications_total = IntCounterVec::new(
            Opts::new("pin_verifications_total", "PIN checks by outcome"),
            &["outcome"],
        )
        .expect("valid pin_verifications_total metric");

        let fraud_alerts_total =
            IntCounter::new("fraud_alerts_total", "Fraud alerts raised on PIN lockout")
                .expect("valid fraud_alerts_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(pin_verifications_total.clone()))
            .expect("register pin_verifications_total");
        registry
            .register(Box::new(fraud_alerts_total.clone()))
            .expect("register fraud_alerts_total");

        Self {
            registry,
            orders_created_total,
            claims_total,
            pin_verifications_total,
            fraud_alerts_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
