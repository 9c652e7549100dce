use std::time::Duration;

/// Default upper bound for a single call to the payment provider.
pub const DEFAULT_CHARGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings of a billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingConfig {
    /// How long a charge attempt may take before it counts as a network failure.
    pub charge_timeout: Duration,
}

impl BillingConfig {
    pub fn with_charge_timeout(charge_timeout: Duration) -> Self {
        Self { charge_timeout }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            charge_timeout: DEFAULT_CHARGE_TIMEOUT,
        }
    }
}
