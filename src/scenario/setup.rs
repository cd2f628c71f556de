use crate::config::Credentials;
use crate::error::RunError;
use crate::scenario::Endpoints;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SigninRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    token: String,
}

/// Sign in with the pre-provisioned test account and return the bearer token
/// shared by every virtual user.
///
/// Runs exactly once per test run, before any iteration. A non-200 response
/// is fatal for the whole run; no retry is attempted.
pub async fn acquire_token(
    client: &Client,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<String> {
    let response = client
        .post(endpoints.signin.clone())
        .json(&SigninRequest {
            email: &credentials.email,
            password: &credentials.password,
        })
        .send()
        .await
        .context("Signin request could not be sent")?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(RunError::SigninRejected {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let body: SigninResponse = response
        .json()
        .await
        .context("Signin response did not contain a token field")?;

    Ok(body.token)
}
