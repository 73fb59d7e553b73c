//! Short link creation.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_custom_code};

/// Attempts made to find a free generated code before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Input for [`LinkService::create_short_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub target_url: String,
    pub custom_code: Option<String>,
    pub expires_in: Option<Duration>,
    pub owner: Option<String>,
}

/// Allocates short codes and persists new links.
///
/// The store's unique constraint on `code` is the only uniqueness guarantee.
/// Existence checks made here are a fast path and can race with concurrent
/// inserts, which surface as [`AppError::DuplicateCode`] from the repository.
pub struct LinkService {
    link_repository: Arc<dyn LinkRepository>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// `base_url` is the public origin used to build short URLs.
    pub fn new(link_repository: Arc<dyn LinkRepository>, base_url: impl Into<String>) -> Self {
        Self {
            link_repository,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a short link for `input.target_url`.
    ///
    /// # Code selection
    ///
    /// - With `custom_code`: validated, then used verbatim
    /// - Otherwise: a random 6-character code, retried on collision up to
    ///   [`MAX_GENERATION_ATTEMPTS`] times
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL, custom code or expiry is invalid.
    ///
    /// Returns [`AppError::DuplicateCode`] if the custom code is taken.
    ///
    /// Returns [`AppError::GenerationExhausted`] if no free code was found.
    pub async fn create_short_link(&self, input: CreateLink) -> Result<ShortLink, AppError> {
        validate_target_url(&input.target_url)?;

        let expires_at = match input.expires_in {
            Some(d) if d <= Duration::zero() => {
                return Err(AppError::bad_request(
                    "Expiry must be in the future",
                    json!({ "expires_in_seconds": d.num_seconds() }),
                ));
            }
            Some(d) => Some(Utc::now() + d),
            None => None,
        };

        let link = match input.custom_code {
            Some(code) => {
                validate_custom_code(&code)?;

                if self.link_repository.code_exists(&code).await? {
                    return Err(AppError::duplicate_code(code));
                }

                self.link_repository
                    .insert(NewShortLink {
                        code,
                        target_url: input.target_url,
                        owner: input.owner,
                        expires_at,
                    })
                    .await?
            }
            None => {
                self.insert_with_generated_code(input.target_url, input.owner, expires_at)
                    .await?
            }
        };

        info!(code = %link.code, owner = ?link.owner, "Short link created");
        Ok(link)
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    async fn insert_with_generated_code(
        &self,
        target_url: String,
        owner: Option<String>,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = generate_code()?;

            if self.link_repository.code_exists(&code).await? {
                debug!(%code, attempt, "Generated code already taken");
                continue;
            }

            let new_link = NewShortLink {
                code,
                target_url: target_url.clone(),
                owner: owner.clone(),
                expires_at,
            };

            match self.link_repository.insert(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::DuplicateCode { code }) => {
                    debug!(%code, attempt, "Generated code lost insert race");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Short code generation exhausted"
        );
        Err(AppError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}

/// Accepts absolute `http` and `https` URLs with a host.
fn validate_target_url(raw: &str) -> Result<(), AppError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Only http and https URLs can be shortened",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::bad_request(
            "URL must have a host",
            json!({ "url": raw }),
        ));
    }

    Ok(())
}
