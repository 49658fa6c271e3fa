use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailRequest {
    pub code: String,
    pub qty: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholesaleRequest {
    pub partner: String,
    pub code: String,
    pub qty: i64,
}

/// `{total, err}` payload. An `Invalid Request` answer carries only `err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResponse {
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

#[derive(Debug)]
pub enum SdkError {
    Http(reqwest::Error),
    Status(u16, String),
    Decode(serde_json::Error),
    /// The gateway answered with an error message.
    Pricing(String),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::Http(e) => write!(f, "HTTP error: {}", e),
            SdkError::Status(status, body) => write!(f, "Gateway returned status {}: {}", status, body),
            SdkError::Decode(e) => write!(f, "Decode error: {}", e),
            SdkError::Pricing(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SdkError {}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::Http(e)
    }
}

pub struct PricingClient {
    client: Client,
    gateway_url: String,
}

impl PricingClient {
    pub fn new(gateway_url: &str) -> Self {
        Self::with_client(Client::new(), gateway_url)
    }

    pub fn with_client(client: Client, gateway_url: &str) -> Self {
        Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// Retail total, or the gateway's error message.
    pub async fn retail_total(&self, code: &str, qty: i64) -> Result<f64, SdkError> {
        let req = RetailRequest {
            code: code.to_string(),
            qty,
        };
        into_total(self.post("/retail", &req).await?)
    }

    /// Wholesale total, or the gateway's error message.
    pub async fn wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> Result<f64, SdkError> {
        let req = WholesaleRequest {
            partner: partner.to_string(),
            code: code.to_string(),
            qty,
        };
        into_total(self.post("/wholesale", &req).await?)
    }

    /// Send an arbitrary body and return the decoded payload as-is.
    pub async fn post_raw(&self, path: &str, body: String) -> Result<PricingResponse, SdkError> {
        let resp = self
            .client
            .post(format!("{}{}", self.gateway_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn post<T: Serialize>(&self, path: &str, req: &T) -> Result<PricingResponse, SdkError> {
        let resp = self
            .client
            .post(format!("{}{}", self.gateway_url, path))
            .json(req)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode(resp: reqwest::Response) -> Result<PricingResponse, SdkError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(SdkError::Status(status.as_u16(), text));
    }

    serde_json::from_str(&text).map_err(SdkError::Decode)
}

fn into_total(resp: PricingResponse) -> Result<f64, SdkError> {
    match resp.err {
        Some(msg) if !msg.is_empty() => Err(SdkError::Pricing(msg)),
        _ => Ok(resp.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_totals_and_errors() {
        let url = serve(
            Router::new()
                .route(
                    "/retail",
                    post(|Json(req): Json<RetailRequest>| async move {
                        Json(PricingResponse {
                            total: 12.99 * req.qty as f64,
                            err: None,
                        })
                    }),
                )
                .route(
                    "/wholesale",
                    post(|| async {
                        Json(PricingResponse {
                            total: 0.0,
                            err: Some("Partner Not Found".into()),
                        })
                    }),
                ),
        )
        .await;

        let client = PricingClient::new(&url);
        assert_eq!(client.retail_total("aaa111", 2).await.unwrap(), 25.98);

        let err = client.wholesale_total("nobody", "aaa111", 1).await.unwrap_err();
        assert!(matches!(err, SdkError::Pricing(ref msg) if msg == "Partner Not Found"));
    }
}
