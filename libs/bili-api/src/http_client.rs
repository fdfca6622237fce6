use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};

use crate::BiliApiError;

pub struct ApiClient {
    client: reqwest::Client,
    header: HeaderMap,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(
        user_agent: &str,
        cookies: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BiliApiError> {
        let mut header = HeaderMap::new();
        header.insert(USER_AGENT, parse_header("user-agent", user_agent)?);
        if let Some(cookies) = cookies.filter(|c| !c.is_empty()) {
            header.insert(COOKIE, parse_header("cookie", cookies)?);
        }

        let client = reqwest::Client::builder().gzip(true).deflate(true).build()?;

        Ok(Self {
            client,
            header,
            timeout,
        })
    }

    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<reqwest::Response, BiliApiError> {
        let mut headers = self.header.clone();
        if let Some(referer) = referer {
            headers.insert(REFERER, parse_header("referer", referer)?);
        }

        let resp = self
            .client
            .get(url)
            .query(query)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp)
    }

    pub fn user_agent(&self) -> &str {
        self.header
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

fn parse_header(name: &'static str, value: &str) -> Result<HeaderValue, BiliApiError> {
    HeaderValue::from_str(value).map_err(|_| BiliApiError::InvalidHeader { name })
}
