//! User management integration tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{DIRECTORY_USER, TestEnv};

#[tokio::test]
async fn admin_creates_and_lists_users() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let created = env.create_local_user("carol", "carol-password", Some("SERVICE")).await?;
    assert_eq!(created["username"], "carol");
    assert_eq!(created["realm"], "LOCAL");
    assert_eq!(created["role"], "SERVICE");
    assert_eq!(created["active"], true);

    env.login(DIRECTORY_USER.0, DIRECTORY_USER.1).await?;
    let admin = env.admin_token().await?;

    let all = env.send(Method::GET, "/api/v1/users", Some(&admin), None).await?;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().map(Vec::len), Some(2));

    let ldap = env.send(Method::GET, "/api/v1/users/ldap", Some(&admin), None).await?;
    assert_eq!(ldap.status, StatusCode::OK);
    assert_eq!(ldap.body[0]["username"], DIRECTORY_USER.0);
    Ok(())
}

#[tokio::test]
async fn duplicate_user_conflicts() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("carol", "carol-password", None).await?;
    let admin = env.admin_token().await?;

    let response = env
        .send(
            Method::PUT,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "username": "carol", "password": "other-password" })),
        )
        .await?;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "conflict");
    Ok(())
}

#[tokio::test]
async fn default_user_cannot_administer() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;
    let bob = env.login("bob", "bob-password").await?;

    let create = env
        .send(
            Method::PUT,
            "/api/v1/users",
            Some(&bob),
            Some(json!({ "username": "eve", "password": "eve-password" })),
        )
        .await?;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let list = env.send(Method::GET, "/api/v1/users", Some(&bob), None).await?;
    assert_eq!(list.status, StatusCode::FORBIDDEN);

    let delete = env
        .send(Method::DELETE, "/api/v1/users/local/bob", Some(&bob), None)
        .await?;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn user_edits_own_settings_and_password() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;
    let bob = env.login("bob", "bob-password").await?;

    let response = env
        .send(
            Method::PATCH,
            "/api/v1/users",
            Some(&bob),
            Some(json!({
                "username": "bob",
                "realm": "LOCAL",
                "role": "ADMIN",
                "settings": { "emailAddress": "bob@example.org", "emailReceive": true },
                "password": { "currentPassword": "bob-password", "newPassword": "new-password" }
            })),
        )
        .await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "DEFAULT");
    assert_eq!(response.body["settings"]["emailAddress"], "bob@example.org");
    assert_eq!(response.body["settings"]["emailReceive"], true);

    env.login("bob", "new-password").await?;
    assert!(env.login("bob", "bob-password").await.is_err());
    Ok(())
}

#[tokio::test]
async fn user_cannot_edit_others() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("bob", "bob-password", None).await?;
    env.create_local_user("carol", "carol-password", None).await?;
    let bob = env.login("bob", "bob-password").await?;

    let response = env
        .send(
            Method::PATCH,
            "/api/v1/users",
            Some(&bob),
            Some(json!({ "username": "carol", "realm": "LOCAL", "active": false })),
        )
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let other = env
        .send(Method::GET, "/api/v1/users/local/carol", Some(&bob), None)
        .await?;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let own = env.send(Method::GET, "/api/v1/users/local/bob", Some(&bob), None).await?;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["username"], "bob");
    Ok(())
}

#[tokio::test]
async fn edit_without_identity_is_bad_request() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let admin = env.admin_token().await?;

    let response = env
        .send(Method::PATCH, "/api/v1/users", Some(&admin), Some(json!({ "username": "bob" })))
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_targets_are_not_found() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let admin = env.admin_token().await?;

    let edit = env
        .send(
            Method::PATCH,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "username": "ghost", "realm": "LOCAL", "active": false })),
        )
        .await?;
    assert_eq!(edit.status, StatusCode::NOT_FOUND);

    let get = env.send(Method::GET, "/api/v1/users/local/ghost", Some(&admin), None).await?;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let realm = env.send(Method::GET, "/api/v1/users/nowhere", Some(&admin), None).await?;
    assert_eq!(realm.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_deletes_user() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.create_local_user("carol", "carol-password", None).await?;
    let admin = env.admin_token().await?;

    let first = env
        .send(Method::DELETE, "/api/v1/users/LOCAL/carol", Some(&admin), None)
        .await?;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert!(env.store.is_empty());

    let second = env
        .send(Method::DELETE, "/api/v1/users/LOCAL/carol", Some(&admin), None)
        .await?;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn storage_outage_is_service_unavailable() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let admin = env.admin_token().await?;
    env.store.set_available(false);

    let response = env.send(Method::GET, "/api/v1/users", Some(&admin), None).await?;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
