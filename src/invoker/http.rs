use super::{InvokeError, Invoker, Outcome, ResponseBody};
use reqwest::{header::CONTENT_TYPE, Client, Response};

/// reqwest-backed invoker. No retry and no explicit timeout: the client's
/// transport defaults apply.
#[derive(Clone)]
pub struct HttpInvoker {
    client: Client,
}

impl HttpInvoker {
    pub fn new() -> Result<Self, InvokeError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InvokeError::ClientBuild)?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Outcome, InvokeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| InvokeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status_code = response.status().as_u16();
        let body = read_body(url, response).await?;

        Ok(Outcome::Success { status_code, body })
    }
}

#[async_trait::async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(&self, url: &str) -> Outcome {
        match self.fetch(url).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failure(e),
        }
    }
}

async fn read_body(url: &str, response: Response) -> Result<ResponseBody, InvokeError> {
    let structured = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_structured);

    let decode = |source| InvokeError::Decode {
        url: url.to_string(),
        source,
    };

    if structured {
        response.json().await.map(ResponseBody::Json).map_err(decode)
    } else {
        response.text().await.map(ResponseBody::Text).map_err(decode)
    }
}

/// `application/json` or any `+json` media type, parameters ignored.
fn is_structured(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
