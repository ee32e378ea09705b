pub mod mercado_pago;

use async_trait::async_trait;

use crate::models::ServiceSnapshot;

/// Opaque handle returned by the provider: the preference id to reconcile
/// webhook callbacks against, plus the checkout URL for the customer.
pub struct PaymentPreference {
    pub reference: String,
    pub checkout_url: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// False when no credentials are configured; bookings then skip the
    /// online-payment step entirely.
    fn is_configured(&self) -> bool;

    async fn create_preference(
        &self,
        external_reference: &str,
        payer_name: &str,
        items: &[ServiceSnapshot],
    ) -> anyhow::Result<PaymentPreference>;
}
