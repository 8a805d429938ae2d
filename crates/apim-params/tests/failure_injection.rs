//! Integration tests for collaborator failures.
//!
//! Store and lookup failures must reach the caller; none of them may be
//! replaced by a default value.

use std::sync::Arc;

use apim_core::ScopeType;
use apim_params::{MemoryEnvironmentDirectory, ParamError, keys};
use apim_test_utils::{FailingEnvironmentLookup, ORG_ID, ServiceFixture, assert_no_writes};

#[tokio::test]
async fn test_store_failure_is_never_defaulted() {
    let fx = ServiceFixture::new();
    fx.store.inject_failure("find");
    let mut ctx = fx.env_context();

    let err = fx
        .service
        .resolve(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ParamError::StoreUnavailable { operation: "find", .. }));
    assert!(err.is_collaborator_failure());
    assert_eq!(ctx.memoized_len(), 0);
}

#[tokio::test]
async fn test_unreachable_directory_is_a_collaborator_failure() {
    let lookup = Arc::new(FailingEnvironmentLookup::new());
    let fx = ServiceFixture::builder()
        .record("company.name", ORG_ID, ScopeType::Organization, "Acme")
        .environments(lookup.clone())
        .build();
    let mut ctx = fx.env_context();

    let err = fx
        .service
        .resolve(&keys::COMPANY_NAME, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ParamError::StoreUnavailable {
            operation: "organization_id_of",
            ..
        }
    ));
    assert!(err.is_collaborator_failure());
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn test_environment_without_organization_is_unknown_scope() {
    let fx = ServiceFixture::builder()
        .record("company.name", ORG_ID, ScopeType::Organization, "Acme")
        .environments(Arc::new(MemoryEnvironmentDirectory::new()))
        .build();
    let mut ctx = fx.env_context();

    let err = fx
        .service
        .resolve(&keys::COMPANY_NAME, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ParamError::UnknownScope { ref environment_id, .. } if environment_id == "env-1"));

    let err = fx
        .service
        .resolve_many(&[keys::COMPANY_NAME], None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ParamError::UnknownScope { .. }));
}

#[tokio::test]
async fn test_environment_only_key_needs_no_lookup() {
    let lookup = Arc::new(FailingEnvironmentLookup::new());
    let fx = ServiceFixture::builder().environments(lookup.clone()).build();
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();

    assert_eq!(value, "false");
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_batch_lookup_failure_propagates() {
    let lookup = Arc::new(FailingEnvironmentLookup::new());
    let fx = ServiceFixture::builder().environments(lookup).build();
    let mut ctx = fx.env_context();

    let err = fx
        .service
        .resolve_many(&[keys::COMPANY_NAME], None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ParamError::StoreUnavailable {
            operation: "organization_id_of",
            ..
        }
    ));
}

#[tokio::test]
async fn test_batch_store_failure_is_never_defaulted() {
    let fx = ServiceFixture::new();
    fx.store.inject_failure("find_by_keys");
    let mut ctx = fx.org_context();

    let err = fx
        .service
        .resolve_many(&[keys::EMAIL_HOST], None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ParamError::StoreUnavailable {
            operation: "find_by_keys",
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_create_is_not_audited() {
    let fx = ServiceFixture::new();
    fx.store.inject_failure("create");
    let mut ctx = fx.org_context();

    let err = fx
        .service
        .save(&keys::EMAIL_HOST, Some("smtp.acme.io"), None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ParamError::StoreUnavailable { operation: "create", .. }));
    assert!(fx.audit.is_empty());
    assert!(fx.store.records().is_empty());
}

#[tokio::test]
async fn test_failed_lookup_before_save_writes_nothing() {
    let fx = ServiceFixture::new();
    fx.store.inject_failure("find");
    let mut ctx = fx.org_context();

    let err = fx
        .service
        .save(&keys::EMAIL_HOST, Some("smtp.acme.io"), None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ParamError::StoreUnavailable { operation: "find", .. }));
    assert_no_writes(&fx.store);
}
