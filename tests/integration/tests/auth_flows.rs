//! Authentication flow integration tests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};

use crate::common::{ADMIN, DIRECTORY_USER, TestEnv};

#[tokio::test]
async fn heartbeat_answers() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let response = env.send(Method::GET, "/api/v1/heartbeat", None, None).await?;
    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn memory_admin_logs_in_with_form_data() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/authenticate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", ADMIN.0, ADMIN.1)))?;

    let response = env.dispatch(request).await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["username"], ADMIN.0);
    assert_eq!(response.body["user"]["realm"], "MEMORY");
    assert_eq!(response.body["user"]["role"], "ADMIN");
    assert_eq!(response.body["token"]["tokenType"], "Bearer");
    assert!(response.body["user"].get("password").is_none());

    let token = response.body["token"]["token"].as_str().unwrap_or_default();
    let authorization = response.headers[header::AUTHORIZATION].to_str()?;
    assert_eq!(authorization, format!("Bearer {token}"));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;

    for (username, password) in [("bob", "nope"), ("nobody", "nope"), (ADMIN.0, "nope")] {
        let response = env
            .send(
                Method::POST,
                "/api/v1/authenticate",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await?;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"], "unauthorized");
        assert_eq!(
            response.body["error_description"],
            "Authentication required: invalid credentials"
        );
    }
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let response = env
        .send(
            Method::POST,
            "/api/v1/authenticate",
            None,
            Some(serde_json::json!({ "username": "bob" })),
        )
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn local_user_checks_own_token() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;
    let token = env.login("bob", "bob-password").await?;

    let response = env
        .send(Method::GET, "/api/v1/authenticate/check", Some(&token), None)
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["username"], "bob");
    assert_eq!(response.body["user"]["realm"], "LOCAL");
    assert_eq!(response.body["user"]["role"], "DEFAULT");
    assert_eq!(response.body["token"]["token"], token.as_str());
    Ok(())
}

#[tokio::test]
async fn check_without_token_is_unauthorized() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let missing = env.send(Method::GET, "/api/v1/authenticate/check", None, None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers[header::WWW_AUTHENTICATE], "Bearer");

    let forged = env
        .send(Method::GET, "/api/v1/authenticate/check", Some("forged.token.value"), None)
        .await?;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn verify_reports_token_owner() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let token = env.admin_token().await?;

    let response = env
        .send(Method::GET, &format!("/api/v1/authenticate/verify?jwtToken={token}"), None, None)
        .await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["username"], ADMIN.0);

    let rejected = env
        .send(Method::GET, "/api/v1/authenticate/verify?jwtToken=garbage", None, None)
        .await?;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn directory_user_is_stored_on_first_login() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    assert!(env.store.is_empty());

    let token = env.login(DIRECTORY_USER.0, DIRECTORY_USER.1).await?;
    assert_eq!(env.store.len(), 1);

    let check = env
        .send(Method::GET, "/api/v1/authenticate/check", Some(&token), None)
        .await?;
    assert_eq!(check.body["user"]["realm"], "LDAP");

    env.login(DIRECTORY_USER.0, DIRECTORY_USER.1).await?;
    assert_eq!(env.store.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deactivated_user_cannot_log_in() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;
    let admin = env.admin_token().await?;

    let edit = env
        .send(
            Method::PATCH,
            "/api/v1/users",
            Some(&admin),
            Some(serde_json::json!({ "username": "bob", "realm": "LOCAL", "active": false })),
        )
        .await?;
    assert_eq!(edit.status, StatusCode::OK);

    let response = env
        .send(
            Method::POST,
            "/api/v1/authenticate",
            None,
            Some(serde_json::json!({ "username": "bob", "password": "bob-password" })),
        )
        .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
