//! HTTP trigger for external schedulers (Vercel cron, cron-job.org, ...)
//!
//! `GET /api/cron?action=in|out` always answers 200 with a plain-text status.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::Router;

use crate::api::{self, Direction};
use crate::context::Context;

pub fn router(ctx: Arc<Context>) -> Router {
    Router::new()
        .route("/api/cron", get(cron))
        .with_state(ctx)
}

/// First `action` value in the query string, if any.
fn action_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.into_owned())
}

// Raw query so a malformed or repeated parameter still gets a 200 reply.
async fn cron(State(ctx): State<Arc<Context>>, RawQuery(query): RawQuery) -> String {
    let direction = query
        .as_deref()
        .and_then(action_param)
        .and_then(|a| a.parse::<Direction>().ok());

    let Some(direction) = direction else {
        return "No action specified: Failed/Skipped".to_string();
    };

    let success = match api::perform(&ctx, direction).await {
        Ok(outcome) => outcome.is_success(),
        Err(e) => {
            tracing::error!("Clock {} failed: {}", direction, e);
            false
        }
    };

    let message = match direction {
        Direction::In => "Clock In Attempted",
        Direction::Out => "Clock Out Attempted",
    };
    let status = if success { "Success" } else { "Failed/Skipped" };
    format!("{}: {}", message, status)
}

pub async fn serve(ctx: Context) -> Result<()> {
    let addr = ctx.settings.listen;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(Arc::new(ctx)))
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::jwt_with_exp;
    use crate::auth::Credential;
    use crate::config::Settings;
    use crate::store::FileStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, TimeZone, Utc};
    use tower::ServiceExt;

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 4, 0, 0).unwrap()
    }

    fn sunday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 14, 4, 0, 0).unwrap()
    }

    fn test_context(
        server: &mockito::Server,
        dir: &tempfile::TempDir,
        clock: fn() -> DateTime<Utc>,
    ) -> Arc<Context> {
        let settings = Settings {
            api_base: server.url(),
            token_file: dir.path().join("tokens.json"),
            ..Settings::default()
        };
        let store = Box::new(FileStore::new(settings.token_file.clone()));
        let mut ctx = Context::new(settings, store).unwrap();
        ctx.clock = clock;
        Arc::new(ctx)
    }

    async fn call(ctx: &Arc<Context>, action: Option<&str>) -> String {
        let query = action.map(|a| format!("action={}", a));
        cron(State(Arc::clone(ctx)), RawQuery(query)).await
    }

    async fn get_via_router(ctx: &Arc<Context>, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router(Arc::clone(ctx)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_action_param() {
        assert_eq!(action_param("action=in"), Some("in".to_string()));
        assert_eq!(
            action_param("x=1&action=out&action=in"),
            Some("out".to_string())
        );
        assert_eq!(action_param("action"), Some(String::new()));
        assert_eq!(action_param(""), None);
        assert_eq!(action_param("%ZZ=%%"), None);
    }

    #[tokio::test]
    async fn test_repeated_action_still_answers_ok() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, wednesday);

        let (status, body) = get_via_router(&ctx, "/api/cron?action=in&action=out").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Clock In Attempted: Failed/Skipped");
    }

    #[tokio::test]
    async fn test_garbled_query_answers_ok() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, wednesday);

        for uri in ["/api/cron", "/api/cron?action=%FF%FE", "/api/cron?&&=&"] {
            let (status, body) = get_via_router(&ctx, uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, "No action specified: Failed/Skipped", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_no_action() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, wednesday);
        assert_eq!(call(&ctx, None).await, "No action specified: Failed/Skipped");
        assert_eq!(
            call(&ctx, Some("lunch")).await,
            "No action specified: Failed/Skipped"
        );
    }

    #[tokio::test]
    async fn test_clock_in_success() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, wednesday);
        let credential = Credential::new(
            jwt_with_exp(wednesday().timestamp() + 3600),
            Some("rt".into()),
        );
        ctx.store.save(&credential).await.unwrap();

        let punch = server
            .mock("POST", "/k/attendance/api/mytime/attendance/remoteclockin")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        assert_eq!(call(&ctx, Some("in")).await, "Clock In Attempted: Success");
        punch.assert_async().await;
    }

    #[tokio::test]
    async fn test_clock_out_without_credential() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, wednesday);
        assert_eq!(
            call(&ctx, Some("out")).await,
            "Clock Out Attempted: Failed/Skipped"
        );
    }

    #[tokio::test]
    async fn test_weekend_reports_skipped() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(&server, &dir, sunday);
        assert_eq!(
            call(&ctx, Some("in")).await,
            "Clock In Attempted: Failed/Skipped"
        );
    }
}
