/// OAuth 2.0 federation service
///
/// Supports OAuth providers:
/// - Google (OAuth 2.0)
/// - GitHub (OAuth 2.0)
/// - Microsoft (Azure AD v2, common tenant)
///
/// Each provider implements [`ProviderAdapter`]: building the provider's
/// authorization URL and turning an authorization code into a normalized
/// `(display name, email)` pair. Adding a provider means adding an
/// implementation, not branching through the service.
///
/// Every remote call is fallible and boundary-exposed: the HTTP client
/// carries a hard timeout, non-2xx responses are rejected, and exchange,
/// profile-fetch, and profile-parse failures are distinct error kinds.
use crate::config::{ClientSettings, Mode, OAuthSettings, ProviderCredentials};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Hard ceiling on every outbound provider call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_SCOPES: &str =
    "https://www.googleapis.com/auth/userinfo.profile https://www.googleapis.com/auth/userinfo.email";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";
const GITHUB_SCOPES: &str = "read:user user:email";

const MICROSOFT_AUTH_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const MICROSOFT_ME_URL: &str = "https://graph.microsoft.com/v1.0/me";
const MICROSOFT_SCOPES: &str = "User.Read";

/// OAuth provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
    Microsoft,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Microsoft => "microsoft",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Self::Google),
            "github" => Some(Self::Github),
            "microsoft" => Some(Self::Microsoft),
            _ => None,
        }
    }

    fn adapter(&self) -> &'static dyn ProviderAdapter {
        match self {
            Self::Google => &GoogleAdapter,
            Self::Github => &GithubAdapter,
            Self::Microsoft => &MicrosoftAdapter,
        }
    }
}

/// Normalized identity produced by the federation exchange.
///
/// Provider-specific payloads are reduced to this pair before anything
/// crosses into session issuance; the raw profiles are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    pub name: String,
    pub email: String,
}

/// Per-provider protocol surface.
#[async_trait]
pub trait ProviderAdapter: Sync {
    /// The provider's authorization endpoint URL with client id, scopes,
    /// redirect URI, and CSRF state.
    fn authorize_url(
        &self,
        creds: &ProviderCredentials,
        redirect_uri: &str,
        state: &str,
    ) -> String;

    /// Exchange the authorization code and fetch the normalized profile.
    async fn fetch_profile(
        &self,
        http: &Client,
        creds: &ProviderCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FederatedProfile>;
}

/// OAuth service for social authentication
#[derive(Clone)]
pub struct OAuthService {
    settings: OAuthSettings,
    mode: Mode,
    client_url: String,
    client_port: String,
    http: Client,
}

impl OAuthService {
    pub fn new(settings: OAuthSettings, mode: Mode, client: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            // GitHub's API rejects requests without a User-Agent.
            .user_agent("refina-auth-service")
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            settings,
            mode,
            client_url: client.url.clone(),
            client_port: client.port.clone(),
            http,
        })
    }

    /// Authorization endpoint URL for the provider, carrying `state`.
    pub fn authorization_url(&self, provider: OAuthProvider, state: &str) -> Result<String> {
        let creds = self.credentials(provider)?;
        Ok(provider
            .adapter()
            .authorize_url(creds, &self.redirect_uri(provider), state))
    }

    /// Run the code-for-profile exchange against the provider.
    pub async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
    ) -> Result<FederatedProfile> {
        let creds = self.credentials(provider)?;
        provider
            .adapter()
            .fetch_profile(&self.http, creds, code, &self.redirect_uri(provider))
            .await
    }

    /// Frontend base URL the callback handlers redirect back to.
    pub fn client_redirect_base(&self) -> &str {
        &self.client_url
    }

    /// Whether the deployment serves a public base URL.
    pub fn is_public(&self) -> bool {
        self.mode.is_public()
    }

    fn credentials(&self, provider: OAuthProvider) -> Result<&ProviderCredentials> {
        let creds = match provider {
            OAuthProvider::Google => &self.settings.google,
            OAuthProvider::Github => &self.settings.github,
            OAuthProvider::Microsoft => &self.settings.microsoft,
        };

        if !creds.is_configured() {
            return Err(AuthError::Internal(format!(
                "{} OAuth credentials not configured",
                provider.as_str()
            )));
        }

        Ok(creds)
    }

    /// Callback URL registered with the provider: loopback with the client
    /// port in development, the public client URL in staging/production.
    fn redirect_uri(&self, provider: OAuthProvider) -> String {
        if self.mode.is_public() {
            format!("{}/v1/auth/callback/{}", self.client_url, provider.as_str())
        } else {
            format!(
                "http://localhost:{}/v1/auth/callback/{}",
                self.client_port,
                provider.as_str()
            )
        }
    }
}

// ===== Provider Implementations =====

struct GoogleAdapter;

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn authorize_url(
        &self,
        creds: &ProviderCredentials,
        redirect_uri: &str,
        state: &str,
    ) -> String {
        format!(
            "{GOOGLE_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}",
            creds.client_id.as_deref().unwrap_or(""),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(GOOGLE_SCOPES),
            state
        )
    }

    async fn fetch_profile(
        &self,
        http: &Client,
        creds: &ProviderCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FederatedProfile> {
        let token = exchange_token(http, GOOGLE_TOKEN_URL, creds, code, redirect_uri, None).await?;

        let user: GoogleUserInfo =
            fetch_json(http.get(GOOGLE_USERINFO_URL).bearer_auth(&token.access_token)).await?;

        Ok(FederatedProfile {
            name: user.name,
            email: user.email,
        })
    }
}

struct GithubAdapter;

#[async_trait]
impl ProviderAdapter for GithubAdapter {
    fn authorize_url(
        &self,
        creds: &ProviderCredentials,
        redirect_uri: &str,
        state: &str,
    ) -> String {
        format!(
            "{GITHUB_AUTH_URL}?client_id={}&redirect_uri={}&scope={}&state={}",
            creds.client_id.as_deref().unwrap_or(""),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(GITHUB_SCOPES),
            state
        )
    }

    async fn fetch_profile(
        &self,
        http: &Client,
        creds: &ProviderCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FederatedProfile> {
        let token = exchange_token(http, GITHUB_TOKEN_URL, creds, code, redirect_uri, None).await?;

        let user: GithubUser =
            fetch_json(http.get(GITHUB_USER_URL).bearer_auth(&token.access_token)).await?;

        // The primary profile omits private addresses; a second call lists
        // every address with its primary flag.
        let emails: Vec<GithubEmail> =
            fetch_json(http.get(GITHUB_EMAILS_URL).bearer_auth(&token.access_token)).await?;
        let email = primary_email(emails)?;

        let name = user
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(user.login);

        Ok(FederatedProfile { name, email })
    }
}

struct MicrosoftAdapter;

#[async_trait]
impl ProviderAdapter for MicrosoftAdapter {
    fn authorize_url(
        &self,
        creds: &ProviderCredentials,
        redirect_uri: &str,
        state: &str,
    ) -> String {
        format!(
            "{MICROSOFT_AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            creds.client_id.as_deref().unwrap_or(""),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(MICROSOFT_SCOPES),
            state
        )
    }

    async fn fetch_profile(
        &self,
        http: &Client,
        creds: &ProviderCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FederatedProfile> {
        let token = exchange_token(
            http,
            MICROSOFT_TOKEN_URL,
            creds,
            code,
            redirect_uri,
            Some(MICROSOFT_SCOPES),
        )
        .await?;

        let user: MicrosoftUser =
            fetch_json(http.get(MICROSOFT_ME_URL).bearer_auth(&token.access_token)).await?;

        // `mail` is unset for accounts without a mailbox; the principal
        // name is the sign-in address.
        let email = user
            .mail
            .or(user.user_principal_name)
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                AuthError::OAuthProfileParse("no email on Microsoft account".to_string())
            })?;

        let name = user
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(FederatedProfile { name, email })
    }
}

// ===== Shared Exchange Helpers =====

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

/// POST the authorization code to the provider's token endpoint.
async fn exchange_token(
    http: &Client,
    token_url: &str,
    creds: &ProviderCredentials,
    code: &str,
    redirect_uri: &str,
    scope: Option<&str>,
) -> Result<AccessTokenResponse> {
    let mut form = vec![
        ("code", code),
        ("client_id", creds.client_id.as_deref().unwrap_or_default()),
        (
            "client_secret",
            creds.client_secret.as_deref().unwrap_or_default(),
        ),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    if let Some(scope) = scope {
        form.push(("scope", scope));
    }

    let response = http
        .post(token_url)
        // GitHub answers with urlencoded bodies unless JSON is requested.
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::OAuthExchange(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AuthError::OAuthExchange(format!(
            "token endpoint returned {}",
            response.status()
        )));
    }

    response
        .json::<AccessTokenResponse>()
        .await
        .map_err(|e| AuthError::OAuthExchange(format!("invalid token response: {e}")))
}

/// Issue an authenticated userinfo request and decode the JSON body.
async fn fetch_json<T: serde::de::DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| AuthError::OAuthProfileFetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AuthError::OAuthProfileFetch(format!(
            "userinfo endpoint returned {}",
            response.status()
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AuthError::OAuthProfileParse(e.to_string()))
}

/// Select the address flagged primary; fail rather than guess when the
/// account has none.
fn primary_email(emails: Vec<GithubEmail>) -> Result<String> {
    emails
        .into_iter()
        .find(|e| e.primary)
        .map(|e| e.email)
        .ok_or_else(|| AuthError::OAuthProfileParse("no primary email on GitHub account".to_string()))
}

// ===== Provider Response Types =====

#[derive(Deserialize)]
struct GoogleUserInfo {
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct GithubUser {
    name: Option<String>,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MicrosoftUser {
    display_name: Option<String>,
    mail: Option<String>,
    user_principal_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientSettings, Mode, OAuthSettings, ProviderCredentials};

    fn settings() -> OAuthSettings {
        let creds = ProviderCredentials {
            client_id: Some("client-id".to_string()),
            client_secret: Some("client-secret".to_string()),
        };
        OAuthSettings {
            google: creds.clone(),
            github: creds.clone(),
            microsoft: creds,
        }
    }

    fn service(mode: Mode) -> OAuthService {
        OAuthService::new(
            settings(),
            mode,
            &ClientSettings {
                url: "https://app.refina.dev".to_string(),
                port: "3000".to_string(),
            },
        )
        .expect("should build service")
    }

    #[test]
    fn test_provider_round_trip() {
        for provider in [
            OAuthProvider::Google,
            OAuthProvider::Github,
            OAuthProvider::Microsoft,
        ] {
            assert_eq!(OAuthProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(OAuthProvider::from_str("gitlab"), None);
    }

    #[test]
    fn test_authorization_url_carries_client_id_state_and_scopes() {
        let service = service(Mode::Development);
        let url = service
            .authorization_url(OAuthProvider::Google, "xyz")
            .unwrap();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains(&*urlencoding::encode(GOOGLE_SCOPES)));
    }

    #[test]
    fn test_development_redirect_is_loopback_with_client_port() {
        let service = service(Mode::Development);
        let url = service
            .authorization_url(OAuthProvider::Github, "xyz")
            .unwrap();

        let redirect =
            urlencoding::encode("http://localhost:3000/v1/auth/callback/github").into_owned();
        assert!(url.contains(&redirect));
    }

    #[test]
    fn test_production_redirect_uses_public_base_url() {
        let service = service(Mode::Production);
        let url = service
            .authorization_url(OAuthProvider::Microsoft, "xyz")
            .unwrap();

        let redirect =
            urlencoding::encode("https://app.refina.dev/v1/auth/callback/microsoft").into_owned();
        assert!(url.contains(&redirect));
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let service = OAuthService::new(
            OAuthSettings::default(),
            Mode::Development,
            &ClientSettings {
                url: "http://localhost:3000".to_string(),
                port: "3000".to_string(),
            },
        )
        .unwrap();

        assert!(service
            .authorization_url(OAuthProvider::Google, "xyz")
            .is_err());
    }

    #[test]
    fn test_primary_email_selection() {
        let emails = vec![
            GithubEmail {
                email: "secondary@x.com".to_string(),
                primary: false,
            },
            GithubEmail {
                email: "primary@x.com".to_string(),
                primary: true,
            },
        ];
        assert_eq!(primary_email(emails).unwrap(), "primary@x.com");
    }

    #[test]
    fn test_no_primary_email_fails_rather_than_guessing() {
        let emails = vec![GithubEmail {
            email: "secondary@x.com".to_string(),
            primary: false,
        }];
        assert!(matches!(
            primary_email(emails),
            Err(AuthError::OAuthProfileParse(_))
        ));
    }

    #[test]
    fn test_github_user_deserializes_null_name() {
        let user: GithubUser =
            serde_json::from_str(r#"{"login": "octocat", "name": null}"#).unwrap();
        assert!(user.name.is_none());
        assert_eq!(user.login, "octocat");
    }

    #[test]
    fn test_microsoft_user_deserializes_graph_fields() {
        let user: MicrosoftUser = serde_json::from_str(
            r#"{"displayName": "Ann", "mail": null, "userPrincipalName": "ann@contoso.com"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert!(user.mail.is_none());
        assert_eq!(user.user_principal_name.as_deref(), Some("ann@contoso.com"));
    }
}
