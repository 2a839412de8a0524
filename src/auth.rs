use std::collections::HashMap;
use std::fmt::Display;

use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

pub static AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub static TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub static DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Scopes the activity collector needs from the refresh token
pub static REQUIRED_SCOPES: [&str; 2] = ["user-read-recently-played", "user-top-read"];

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub(crate) id: String,
    pub(crate) secret: String,
}

impl ClientCredentials {
    /// Create credentials from a client ID and a client secret
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            id: client_id.trim().to_string(),
            secret: client_secret.trim().to_string(),
        }
    }
}

/// Base64 `id:secret` for the `Authorization: Basic` header
impl Display for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = format!("{}:{}", self.id, self.secret);
        write!(f, "{}", base64::engine::general_purpose::STANDARD.encode(auth.as_bytes()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space separated list of granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Required scopes the token was not granted
    pub fn missing_scopes(&self) -> Vec<&'static str> {
        let granted = self.scopes();
        REQUIRED_SCOPES
            .iter()
            .copied()
            .filter(|scope| !granted.contains(scope))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Authorization code flow where the user pastes the redirect URL back in
#[derive(Debug, Clone)]
pub struct AuthCodeFlow {
    credentials: ClientCredentials,
    redirect_uri: String,
    state: Uuid,
    token_url: String,
}

impl AuthCodeFlow {
    pub fn new(credentials: ClientCredentials, redirect_uri: &str) -> Self {
        let redirect_uri = match redirect_uri.trim() {
            "" => DEFAULT_REDIRECT_URI,
            uri => uri,
        };
        Self {
            credentials,
            redirect_uri: redirect_uri.to_string(),
            state: Uuid::new_v4(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url<S: Into<String>>(mut self, token_url: S) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn state(&self) -> String {
        self.state.to_string()
    }

    /// URL the user opens to grant access. Always shows the consent dialog.
    pub fn authorization_url(&self) -> Result<String> {
        Ok(format!(
            "{AUTHORIZE_URL}?{}",
            serde_urlencoded::to_string([
                ("client_id", self.credentials.id.clone()),
                ("response_type", "code".to_string()),
                ("redirect_uri", self.redirect_uri.clone()),
                ("scope", REQUIRED_SCOPES.join(" ")),
                ("state", self.state.to_string()),
                ("show_dialog", "true".to_string()),
            ])?
        ))
    }

    /// Pull the authorization code out of the URL spotify redirected to
    pub fn parse_redirect(&self, redirected: &str) -> Result<String> {
        let url = reqwest::Url::parse(redirected.trim())
            .map_err(|err| Error::custom(format!("not a valid URL: {err}")))?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            return Err(Error::custom(format!("authorization was denied: {error}")));
        }
        if params.get("state").map(String::as_str) != Some(self.state().as_str()) {
            return Err(Error::custom("state parameter does not match this authorization request"));
        }

        params
            .get("code")
            .filter(|code| !code.is_empty())
            .cloned()
            .ok_or_else(|| Error::custom("no code parameter in the redirect URL"))
    }

    /// Exchange an authorization code for an access and refresh token
    pub async fn request_token(&self, client: &reqwest::Client, code: &str) -> Result<TokenResponse> {
        let body = serde_urlencoded::to_string([
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])?;

        let response = client
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Authorization", format!("Basic {}", self.credentials))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = match serde_json::from_str::<AuthError>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(Error::Auth {
                code: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        if token.refresh_token.as_deref().unwrap_or_default().is_empty() {
            return Err(Error::custom("the token response did not include a refresh token"));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn flow() -> AuthCodeFlow {
        AuthCodeFlow::new(ClientCredentials::new("client", "secret"), "")
    }

    #[test]
    fn basic_auth_header() {
        assert_eq!(ClientCredentials::new("client", "secret").to_string(), "Y2xpZW50OnNlY3JldA==");
    }

    #[test]
    fn authorization_url_has_every_parameter() {
        let flow = flow();
        let url = reqwest::Url::parse(&flow.authorization_url().unwrap()).unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(params["client_id"], "client");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], DEFAULT_REDIRECT_URI);
        assert_eq!(params["scope"], "user-read-recently-played user-top-read");
        assert_eq!(params["state"], flow.state());
        assert_eq!(params["show_dialog"], "true");
    }

    #[test]
    fn extracts_code() {
        let flow = flow();
        let redirected = format!("http://localhost:8888/callback?code=AQBx123&state={}", flow.state());
        assert_eq!(flow.parse_redirect(&redirected).unwrap(), "AQBx123");
    }

    #[test]
    fn rejects_bad_redirects() {
        let flow = flow();
        let state = flow.state();

        assert!(flow.parse_redirect("not a url").is_err());
        assert!(flow.parse_redirect(&format!("http://localhost:8888/callback?state={state}")).is_err());
        assert!(flow
            .parse_redirect(&format!("http://localhost:8888/callback?error=access_denied&state={state}"))
            .is_err());
        assert!(flow
            .parse_redirect("http://localhost:8888/callback?code=abc&state=someone-else")
            .is_err());
    }

    #[test]
    fn scope_check() {
        let token = TokenResponse {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            expires_in: Some(3600),
            refresh_token: Some("r".into()),
            scope: Some("user-top-read playlist-read-private".into()),
        };
        assert_eq!(token.missing_scopes(), vec!["user-read-recently-played"]);

        let none = TokenResponse { scope: None, ..token };
        assert_eq!(none.missing_scopes().len(), 2);
    }
}
