//! OAuth2 authorization code + PKCE flow for Keka, and token refresh

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;
use url::Url;

use super::{pkce, AuthConfig, Credential};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::store::{Backend, CredentialStore, FileStore};

/// Authorization URL to open in a browser, plus the verifier the exchange needs.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub verifier: String,
}

/// Token endpoint response (only the fields we use)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// Build the authorize URL with a fresh PKCE pair.
pub fn authorization_request(auth: &AuthConfig) -> Result<AuthorizationRequest> {
    let pair = pkce::generate();
    let url = Url::parse_with_params(
        &auth.authorize_url(),
        &[
            ("client_id", auth.client_id.as_str()),
            ("redirect_uri", auth.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", auth.scope.as_str()),
            ("code_challenge", pair.challenge.as_str()),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| Error::Config(format!("auth_base '{}': {}", auth.auth_base, e)))?;

    Ok(AuthorizationRequest {
        url,
        verifier: pair.verifier,
    })
}

/// POST a form to the token endpoint and parse the token response.
async fn token_request(
    ctx: &Context,
    context: &'static str,
    params: &[(&str, &str)],
) -> Result<TokenResponse> {
    let url = ctx.settings.auth.token_url();
    tracing::debug!("{} POST {}", context, url);

    let resp = ctx
        .http
        .post(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(params)
        .send()
        .await
        .map_err(|source| Error::Http { context, source })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            context,
            status: status.as_u16(),
            body,
        });
    }

    resp.json::<TokenResponse>()
        .await
        .map_err(Error::TokenResponse)
}

/// Exchange a one-time authorization code for a credential and persist it.
/// Not retried: the code is single-use.
pub async fn exchange(ctx: &Context, code: &str, verifier: &str) -> Result<Credential> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::MissingAuthorizationCode);
    }

    let auth = &ctx.settings.auth;
    tracing::info!("Exchanging authorization code...");
    let token = token_request(
        ctx,
        "Token exchange",
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", auth.redirect_uri.as_str()),
            ("code_verifier", verifier),
            ("client_id", auth.client_id.as_str()),
            ("client_secret", ""),
        ],
    )
    .await?;

    let credential = Credential::new(token.access_token, token.refresh_token);
    if credential.expiry().is_none() {
        tracing::warn!("Could not read expiry from access token; it will be refreshed on next use");
    }
    ctx.store.save(&credential).await?;
    Ok(credential)
}

/// Refresh the access token in place and persist the result.
pub async fn refresh(ctx: &Context, credential: &mut Credential) -> Result<()> {
    let refresh_token = credential
        .refresh_token()
        .ok_or(Error::MissingRefreshToken)?
        .to_string();

    tracing::info!("Refreshing access token...");
    let token = token_request(
        ctx,
        "Token refresh",
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", ctx.settings.auth.client_id.as_str()),
        ],
    )
    .await?;

    credential.update(token.access_token, token.refresh_token);
    ctx.store.save(credential).await?;
    tracing::info!("Token refreshed successfully");
    Ok(())
}

/// Load the stored credential, refreshing it first if it is (nearly) expired.
pub async fn ensure_fresh(ctx: &Context) -> Result<Credential> {
    let mut credential = ctx.store.load().await.ok_or(Error::NotAuthenticated)?;
    if credential.is_expired_at(ctx.now().timestamp()) {
        tracing::info!("Token expired, refreshing...");
        refresh(ctx, &mut credential).await?;
    }
    Ok(credential)
}

/// Interactive first-time setup: print the authorize URL, read the pasted code.
pub async fn setup(ctx: &Context) -> anyhow::Result<()> {
    let request = authorization_request(&ctx.settings.auth)?;

    println!();
    println!("=== Keka Attendance Setup ===");
    println!();
    println!("1. Open this URL in your browser:");
    println!();
    println!("{}", request.url);
    println!();
    println!("2. Log in, then copy the 'code' parameter from the address bar.");
    print!("\nPaste the code here: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin()
        .lock()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;

    let credential = exchange(ctx, &code, &request.verifier)
        .await
        .inspect_err(|e| tracing::error!("Token exchange failed: {}", e))
        .context("Setup failed")?;

    match write_local_backup(ctx, &credential).await? {
        Some(path) => {
            println!("Setup successful. Tokens saved to the key-value store.");
            println!("Tokens also saved to local file '{}'.", path.display());
        }
        None => {
            println!(
                "Setup successful. Tokens saved to '{}'.",
                ctx.settings.token_file.display()
            );
        }
    }
    Ok(())
}

/// With the key-value backend active, also write the credential to the token
/// file so it can be inspected or moved. Returns the file written, if any.
async fn write_local_backup(
    ctx: &Context,
    credential: &Credential,
) -> anyhow::Result<Option<PathBuf>> {
    if ctx.store.backend() != Backend::KeyValue {
        return Ok(None);
    }
    let file = FileStore::new(ctx.settings.token_file.clone());
    file.save(credential)
        .await
        .context("Failed to write local token backup")?;
    Ok(Some(file.path().to_path_buf()))
}

/// Display current credential status
pub async fn status(ctx: &Context) -> anyhow::Result<()> {
    let backend = match ctx.store.backend() {
        Backend::KeyValue => "key-value store",
        Backend::File => "file",
    };
    println!("Storage:     {}", backend);

    let Some(credential) = ctx.store.load().await else {
        println!("Access token: none");
        println!("\nRun 'keka-clock setup' to authenticate.");
        return Ok(());
    };

    let now = ctx.now();
    match credential.expiry() {
        Some(exp) if !credential.is_expired_at(now.timestamp()) => {
            println!("Access token: valid");
            println!("  expires_at: {}", format_expiry(exp, ctx));
        }
        Some(exp) => {
            println!("Access token: expired (refresh due)");
            println!("  expires_at: {}", format_expiry(exp, ctx));
        }
        None => println!("Access token: expiry unknown (will refresh)"),
    }

    match credential.refresh_token() {
        Some(_) => println!("Refresh tok: present"),
        None => println!("Refresh tok: none (run 'keka-clock setup')"),
    }
    Ok(())
}

fn format_expiry(exp: i64, ctx: &Context) -> String {
    chrono::DateTime::from_timestamp(exp, 0)
        .map(|t| {
            t.with_timezone(&ctx.settings.timezone)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string()
        })
        .unwrap_or_else(|| exp.to_string())
}
