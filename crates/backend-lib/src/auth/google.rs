// ============================
// luxe-backend-lib/src/auth/google.rs
// ============================
//! Google sign-in via the OpenID Connect authorization-code flow.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::federation::{ExternalIdentity, FederationError, IdentityProvider};
use crate::config::GoogleSettings;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid profile email";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

/// Google as an [`IdentityProvider`]
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    settings: GoogleSettings,
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
}

impl GoogleProvider {
    pub fn new(settings: GoogleSettings) -> Result<Self, FederationError> {
        let parse = |raw: &str| Url::parse(raw).map_err(|e| FederationError::Provider(e.to_string()));
        Self::with_endpoints(
            settings,
            parse(AUTHORIZATION_ENDPOINT)?,
            parse(TOKEN_ENDPOINT)?,
            parse(USERINFO_ENDPOINT)?,
        )
    }

    /// Same provider against other endpoints, e.g. a local stand-in
    pub fn with_endpoints(
        settings: GoogleSettings,
        authorization_endpoint: Url,
        token_endpoint: Url,
        userinfo_endpoint: Url,
    ) -> Result<Self, FederationError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FederationError::Provider(e.to_string()))?;
        Ok(Self {
            http,
            settings,
            authorization_endpoint,
            token_endpoint,
            userinfo_endpoint,
        })
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, FederationError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.expose()),
            ("redirect_uri", self.settings.redirect_url.as_str()),
        ];
        let response = self
            .http
            .post(self.token_endpoint.clone())
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FederationError::Provider(format!("token exchange: {e}")))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FederationError::Provider(format!("token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, FederationError> {
        self.http
            .get(self.userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FederationError::Provider(format!("userinfo: {e}")))?
            .json()
            .await
            .map_err(|e| FederationError::Provider(format!("userinfo response: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", self.settings.redirect_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state)
            .append_pair("prompt", "select_account");
        url
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, FederationError> {
        let access_token = self.fetch_access_token(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        let email = info.email.ok_or(FederationError::MissingField("email"))?;
        if !info.email_verified {
            return Err(FederationError::UnverifiedEmail);
        }
        let name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(ExternalIdentity {
            subject: info.sub,
            email,
            name,
        })
    }
}
