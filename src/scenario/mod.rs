pub mod iteration;
pub mod setup;

pub use setup::acquire_token;

use anyhow::{Context, Result};
use url::Url;

pub const SIGNIN_PATH: &str = "/v1/auth/signin";
pub const HEALTH_PATH: &str = "/health";
pub const RECOMMENDATION_PATH: &str = "/v1/recommendation/posts?user_id=test";
pub const POSTS_PATH: &str = "/v1/posts/";

/// Output of the setup phase, handed read-only to every virtual user.
///
/// The token is never refreshed or rotated; after setup nothing writes it.
#[derive(Debug, Clone)]
pub struct SetupData {
    pub token: Option<String>,
}

/// The fixed endpoint set of the scenario, resolved against one base URL.
///
/// Paths are appended to the base as-is, so a base of `…/api` keeps its
/// prefix (URL-join semantics would drop it).
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub signin: Url,
    pub health: Url,
    pub recommendation: Url,
    pub posts: Url,
}

impl Endpoints {
    pub fn for_base(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let parse = |path: &str| {
            Url::parse(&format!("{base}{path}"))
                .with_context(|| format!("Invalid endpoint URL: {base}{path}"))
        };

        Ok(Self {
            signin: parse(SIGNIN_PATH)?,
            health: parse(HEALTH_PATH)?,
            recommendation: parse(RECOMMENDATION_PATH)?,
            posts: parse(POSTS_PATH)?,
        })
    }
}
