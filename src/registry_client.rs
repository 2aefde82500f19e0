use crate::circuit_breaker::{create_registry_circuit_breaker, RegistryCircuitBreaker};
use crate::errors::AppError;
use crate::models::FinancialStatement;
use std::time::Duration;

/// Source of parsed financial statements for a company.
///
/// The production implementation talks to the document gateway fronting
/// the government registry SOAP service; tests substitute fixtures. The
/// returned list is in external listing order, which is NOT guaranteed
/// chronological; callers must run it through
/// [`crate::risk::select_statements`] before picking a "latest".
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    async fn fetch_statements(
        &self,
        firmenbuchnummer: &str,
    ) -> Result<Vec<FinancialStatement>, AppError>;
}

/// Client for the registry document gateway.
///
/// The gateway handles the SOAP/WSDL binding and XML field extraction;
/// this client only sees parsed statements as JSON. A circuit breaker
/// fails fast while the gateway is down instead of tying up handlers on
/// timeouts.
#[derive(Clone)]
pub struct RegistryGatewayClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    breaker: RegistryCircuitBreaker,
}

impl RegistryGatewayClient {
    /// Creates a new `RegistryGatewayClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the document gateway.
    /// * `api_key` - The API key for authentication.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create gateway client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            breaker: create_registry_circuit_breaker(),
        })
    }
}

impl DocumentSource for RegistryGatewayClient {
    /// Fetches all parsed balance-sheet documents filed for a company.
    ///
    /// A company without any filed documents is an empty list, not an
    /// error; the risk engine degrades gracefully on it.
    async fn fetch_statements(
        &self,
        firmenbuchnummer: &str,
    ) -> Result<Vec<FinancialStatement>, AppError> {
        use failsafe::futures::CircuitBreaker;

        let url = format!("{}/urkunden/{}/bilanzen", self.base_url, firmenbuchnummer);
        tracing::info!("Fetching statements for {} from {}", firmenbuchnummer, url);

        let request = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send();

        let response = self.breaker.call(request).await.map_err(|e| match e {
            failsafe::Error::Inner(e) => {
                AppError::ExternalApiError(format!("Registry gateway request failed: {}", e))
            }
            failsafe::Error::Rejected => AppError::ExternalApiError(
                "Registry gateway circuit open, request rejected".to_string(),
            ),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!("No documents found for {}", firmenbuchnummer);
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Registry gateway returned {}: {}",
                status, error_text
            )));
        }

        let statements: Vec<FinancialStatement> = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse gateway response: {}", e))
        })?;

        tracing::info!(
            "Fetched {} statement(s) for {}",
            statements.len(),
            firmenbuchnummer
        );
        Ok(statements)
    }
}
