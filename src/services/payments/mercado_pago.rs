use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentPreference, PaymentProvider};
use crate::models::ServiceSnapshot;

pub struct MercadoPagoProvider {
    access_token: String,
    client: reqwest::Client,
}

impl MercadoPagoProvider {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct PreferenceResponse {
    id: String,
    init_point: String,
}

#[async_trait]
impl PaymentProvider for MercadoPagoProvider {
    fn is_configured(&self) -> bool {
        !self.access_token.is_empty()
    }

    async fn create_preference(
        &self,
        external_reference: &str,
        payer_name: &str,
        items: &[ServiceSnapshot],
    ) -> anyhow::Result<PaymentPreference> {
        let items: Vec<serde_json::Value> = items
            .iter()
            .map(|s| {
                serde_json::json!({
                    "title": s.name,
                    "quantity": 1,
                    "unit_price": s.price_cents as f64 / 100.0,
                })
            })
            .collect();

        let body = serde_json::json!({
            "items": items,
            "payer": { "name": payer_name },
            "external_reference": external_reference,
        });

        let response: PreferenceResponse = self
            .client
            .post("https://api.mercadopago.com/checkout/preferences")
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("failed to reach Mercado Pago")?
            .error_for_status()
            .context("Mercado Pago API returned error")?
            .json()
            .await
            .context("failed to decode Mercado Pago response")?;

        Ok(PaymentPreference {
            reference: response.id,
            checkout_url: response.init_point,
        })
    }
}
