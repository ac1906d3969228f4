use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}.")]
    Missing(&'static str),

    #[error("Unable to resolve the public base URL of the service.")]
    UnresolvedBaseUrl,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Explicit public URL of the deployment; wins over forwarded headers.
    pub public_url: Option<String>,
    pub store: StoreSettings,
    pub github: GitHubSettings,
    pub mercadopago: MercadoPagoSettings,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub name: String,
    pub currency: String,
    /// Address that receives a copy of every paid order.
    pub notification_email: Option<String>,
    pub orders_dir: String,
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: String,
    pub api_url: String,
}

/// A fully resolved repository target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct MercadoPagoSettings {
    pub access_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let public_url = ["PUBLIC_URL", "URL", "DEPLOY_PRIME_URL", "DEPLOY_URL"]
            .into_iter()
            .find_map(optional);

        let store = StoreSettings {
            name: optional("STORE_NAME").unwrap_or_else(|| "nude".to_string()),
            currency: optional("STORE_CURRENCY").unwrap_or_else(|| "EUR".to_string()),
            notification_email: optional("STORE_EMAIL"),
            orders_dir: optional("ORDERS_DIR").unwrap_or_else(|| "orders".to_string()),
        };

        let github = GitHubSettings {
            token: optional("GITHUB_TOKEN"),
            owner: optional("GITHUB_OWNER"),
            repo: optional("GITHUB_REPO"),
            branch: optional("GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
            api_url: optional("GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
        };

        let mercadopago = MercadoPagoSettings {
            access_token: optional("MP_ACCESS_TOKEN"),
            webhook_secret: optional("MP_WEBHOOK_SECRET"),
            api_url: optional("MP_API_URL")
                .unwrap_or_else(|| "https://api.mercadopago.com".to_string()),
        };

        let smtp = SmtpSettings {
            host: optional("EMAIL_SMTP_HOST"),
            port: optional("EMAIL_SMTP_PORT").and_then(|p| p.parse::<u16>().ok()),
            username: optional("EMAIL_SMTP_USER"),
            password: optional("EMAIL_SMTP_PASS"),
            from: optional("EMAIL_SMTP_FROM"),
        };

        Ok(Self {
            host,
            port,
            public_url,
            store,
            github,
            mercadopago,
            smtp,
        })
    }
}

impl GitHubSettings {
    /// Resolves the repository to write orders into.
    ///
    /// `GITHUB_REPO` may carry the full `owner/repo` slug, in which case
    /// `GITHUB_OWNER` is ignored.
    pub fn resolve(&self) -> Result<RepoTarget, ConfigError> {
        let token = self
            .token
            .clone()
            .ok_or(ConfigError::Missing("GITHUB_TOKEN for order storage"))?;

        let missing = ConfigError::Missing("GITHUB_OWNER/GITHUB_REPO for order storage");

        if let Some(slug) = self.repo.as_deref().filter(|r| r.contains('/')) {
            return match slug.split_once('/') {
                Some((owner, repo))
                    if !owner.trim().is_empty()
                        && !repo.trim().is_empty()
                        && !repo.contains('/') =>
                {
                    Ok(RepoTarget {
                        token,
                        owner: owner.trim().to_string(),
                        repo: repo.trim().to_string(),
                        branch: self.branch.clone(),
                    })
                }
                _ => Err(missing),
            };
        }

        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Ok(RepoTarget {
                token,
                owner: owner.clone(),
                repo: repo.clone(),
                branch: self.branch.clone(),
            }),
            _ => Err(missing),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: "nude".to_string(),
            currency: "EUR".to_string(),
            notification_email: None,
            orders_dir: "orders".to_string(),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }
}

impl Default for MercadoPagoSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            webhook_secret: None,
            api_url: "https://api.mercadopago.com".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_url: None,
            store: StoreSettings::default(),
            github: GitHubSettings::default(),
            mercadopago: MercadoPagoSettings::default(),
            smtp: SmtpSettings::default(),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(owner: Option<&str>, repo: Option<&str>) -> GitHubSettings {
        GitHubSettings {
            token: Some("ghp_test".into()),
            owner: owner.map(Into::into),
            repo: repo.map(Into::into),
            ..GitHubSettings::default()
        }
    }

    #[test]
    fn repo_slug_overrides_owner() {
        let target = settings(Some("ignored"), Some("acme/shop")).resolve().unwrap();
        assert_eq!(target.owner, "acme");
        assert_eq!(target.repo, "shop");
        assert_eq!(target.branch, "main");
    }

    #[test]
    fn separate_owner_and_repo() {
        let target = settings(Some("acme"), Some("shop")).resolve().unwrap();
        assert_eq!((target.owner.as_str(), target.repo.as_str()), ("acme", "shop"));
    }

    #[test]
    fn missing_owner_is_a_config_error() {
        let err = settings(None, Some("shop")).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn slug_with_an_empty_half_is_a_config_error() {
        for slug in ["acme/", "/shop", " / ", "acme/shop/extra"] {
            let err = settings(Some("acme"), Some(slug)).resolve().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Missing GITHUB_OWNER/GITHUB_REPO for order storage.",
                "slug {slug:?} resolved"
            );
        }
    }

    #[test]
    fn missing_token_is_checked_first() {
        let mut github = settings(Some("acme"), Some("shop"));
        github.token = None;
        let err = github.resolve().unwrap_err();
        assert_eq!(err.to_string(), "Missing GITHUB_TOKEN for order storage.");
    }
}
