//! Integration tests for the resolution cascade.
//!
//! Each test checks which stage answers and which store calls were made.

use std::sync::Arc;

use apim_core::ScopeType;
use apim_params::{
    EnvOverrideSource, KeyRegistry, MapOverrideSource, MemoryEnvironmentDirectory,
    MemoryParameterStore, ParamError, ParameterService, ParameterServiceConfig, ResolutionSource,
    keys,
};
use apim_test_utils::{
    ENV_ID, ORG_ID, ServiceFixture, StoreOp, assert_no_writes, assert_store_untouched,
    init_test_logging,
};

fn find(key: &str, scope_id: &str, scope_type: ScopeType) -> StoreOp {
    StoreOp::Find {
        key: key.to_string(),
        scope_id: scope_id.to_string(),
        scope_type,
    }
}

#[tokio::test]
async fn test_every_builtin_key_defaults_at_every_scope() {
    let fx = ServiceFixture::new();

    for key in KeyRegistry::builtin().iter() {
        for &scope_type in key.scopes() {
            let mut ctx = fx.env_context();
            let resolution = fx
                .service
                .resolve_with_source(key, None, scope_type, &mut ctx)
                .await
                .unwrap();
            assert_eq!(resolution.value, key.default_value(), "{key} at {scope_type}");
            assert_eq!(resolution.source, ResolutionSource::Default, "{key} at {scope_type}");

            let mut ctx = fx.env_context();
            let values = fx
                .service
                .resolve_many(std::slice::from_ref(key), None, scope_type, &mut ctx)
                .await
                .unwrap();
            assert_eq!(values[key.name()], key.default_value(), "{key} at {scope_type} (batch)");
        }
    }

    assert_eq!(keys::CORS_MAX_AGE.default_value(), "1728000");
    assert_eq!(keys::EMAIL_PORT.default_value(), "587");
    assert_eq!(keys::EMAIL_FROM.default_value(), "noreply@my.domain");
    assert_no_writes(&fx.store);
}

#[tokio::test]
async fn test_unset_key_resolves_to_default() {
    init_test_logging();
    let fx = ServiceFixture::new();
    let mut ctx = fx.env_context();

    let resolution = fx
        .service
        .resolve_with_source(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(resolution.value, "false");
    assert_eq!(resolution.source, ResolutionSource::Default);

    // environment-only key: no organization fallback
    assert_eq!(
        fx.store.operations(),
        vec![find("portal.rating.enabled", ENV_ID, ScopeType::Environment)]
    );
}

#[tokio::test]
async fn test_find_as_boolean_defaults_to_false() {
    let fx = ServiceFixture::new();
    let mut ctx = fx.env_context();

    let enabled = fx
        .service
        .find_as_boolean(&keys::PORTAL_RATING_ENABLED, Some(ENV_ID), ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert!(!enabled);
}

#[tokio::test]
async fn test_find_as_boolean_ignores_case() {
    let fx = ServiceFixture::builder()
        .record("portal.rating.enabled", ENV_ID, ScopeType::Environment, "TRUE")
        .build();
    let mut ctx = fx.env_context();

    assert!(fx
        .service
        .find_as_boolean(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_override_wins_without_store_access() {
    let fx = ServiceFixture::with_overrides(
        MapOverrideSource::new().with("portal.rating.enabled", "true"),
    );
    let mut ctx = fx.env_context();

    let resolution = fx
        .service
        .resolve_with_source(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(resolution.value, "true");
    assert_eq!(resolution.source, ResolutionSource::Override);
    assert_store_untouched(&fx.store);
}

#[tokio::test]
async fn test_override_beats_stored_value() {
    let fx = ServiceFixture::builder()
        .record("http.cors.max-age", ENV_ID, ScopeType::Environment, "60")
        .overrides(MapOverrideSource::new().with("http.cors.max-age", "3600"))
        .build();
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(value, "3600");
}

#[tokio::test]
async fn test_list_override_commas_become_separators() {
    let fx = ServiceFixture::with_overrides(
        MapOverrideSource::new().with("http.cors.allow-origin", "https://a.io,https://b.io"),
    );
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::CORS_ALLOW_ORIGIN, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(value, "https://a.io;https://b.io");
}

#[tokio::test]
async fn test_non_overridable_key_ignores_override() {
    let fx = ServiceFixture::builder()
        .record("portal.top-apis", ENV_ID, ScopeType::Environment, "api-1;api-2")
        .overrides(MapOverrideSource::new().with("portal.top-apis", "api-9"))
        .build();
    let mut ctx = fx.env_context();

    let top = fx
        .service
        .find_as_list(&keys::PORTAL_TOP_APIS, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(top, vec!["api-1", "api-2"]);
}

#[tokio::test]
async fn test_environment_value_beats_organization_value() {
    let fx = ServiceFixture::builder()
        .record("company.name", ORG_ID, ScopeType::Organization, "Acme")
        .record("company.name", ENV_ID, ScopeType::Environment, "Acme EU")
        .build();
    let mut ctx = fx.env_context();

    let resolution = fx
        .service
        .resolve_with_source(&keys::COMPANY_NAME, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(resolution.value, "Acme EU");
    assert_eq!(resolution.source, ResolutionSource::Scope);
    assert_eq!(fx.store.operations_named("find").len(), 1);
}

#[tokio::test]
async fn test_environment_falls_back_to_owning_organization() {
    let fx = ServiceFixture::builder()
        .record("company.name", ORG_ID, ScopeType::Organization, "x")
        .build();
    let mut ctx = fx.env_context();

    let resolution = fx
        .service
        .resolve_with_source(&keys::COMPANY_NAME, Some(ENV_ID), ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(resolution.value, "x");
    assert_eq!(resolution.source, ResolutionSource::ParentScope);
    assert_eq!(
        fx.store.operations(),
        vec![
            find("company.name", ENV_ID, ScopeType::Environment),
            find("company.name", ORG_ID, ScopeType::Organization),
        ]
    );
}

#[tokio::test]
async fn test_fallback_uses_the_environments_own_organization() {
    let fx = ServiceFixture::builder()
        .record("company.name", ORG_ID, ScopeType::Organization, "Acme")
        .record("company.name", "org-2", ScopeType::Organization, "Globex")
        .build();
    fx.register_environment("env-2", "org-2");
    // caller's context belongs to org-1; env-2 still resolves through org-2
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::COMPANY_NAME, Some("env-2"), ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(value, "Globex");
}

#[tokio::test]
async fn test_environment_only_key_never_reads_organization() {
    let fx = ServiceFixture::builder()
        .record("portal.rating.enabled", ORG_ID, ScopeType::Organization, "true")
        .build();
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(value, "false");
    assert_eq!(fx.store.operations().len(), 1);
}

#[tokio::test]
async fn test_organization_only_key_never_sees_environment_data() {
    let fx = ServiceFixture::builder()
        .record("email.host", ENV_ID, ScopeType::Environment, "leaked")
        .build();
    let mut ctx = fx.env_context();

    let value = fx
        .service
        .resolve(&keys::EMAIL_HOST, None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap();
    assert_eq!(value, "smtp.my.domain");
}

#[tokio::test]
async fn test_invalid_scope_is_rejected_before_store_access() {
    let fx = ServiceFixture::new();
    let mut ctx = fx.env_context();

    let err = fx
        .service
        .resolve(&keys::EMAIL_HOST, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ParamError::InvalidKeyScope {
            scope_type: ScopeType::Environment,
            ..
        }
    ));
    assert_store_untouched(&fx.store);
}

#[tokio::test]
async fn test_missing_environment_in_context() {
    let fx = ServiceFixture::new();
    let mut ctx = fx.org_context();

    let err = fx
        .service
        .resolve(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ParamError::MissingScopeId { .. }));
    assert_store_untouched(&fx.store);
}

#[tokio::test]
async fn test_memoization_avoids_second_store_call() {
    let fx = ServiceFixture::builder()
        .record("http.cors.max-age", ORG_ID, ScopeType::Organization, "60")
        .build();
    let mut ctx = fx.env_context();

    for _ in 0..3 {
        let value = fx
            .service
            .resolve(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        assert_eq!(value, "60");
    }
    assert_eq!(fx.store.operations().len(), 2);

    // a new context starts cold
    let mut fresh = fx.env_context();
    let resolution = fx
        .service
        .resolve_with_source(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut fresh)
        .await
        .unwrap();
    assert_eq!(resolution.source, ResolutionSource::ParentScope);
    assert_eq!(fx.store.operations().len(), 4);
}

#[tokio::test]
async fn test_memoization_disabled_reads_every_time() {
    let fx = ServiceFixture::builder()
        .config(ParameterServiceConfig {
            memoize: false,
            ..ParameterServiceConfig::default()
        })
        .build();
    let mut ctx = fx.env_context();

    for _ in 0..2 {
        fx.service
            .resolve(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
    }
    assert_eq!(fx.store.operations().len(), 2);
    assert_eq!(ctx.memoized_len(), 0);
}

#[tokio::test]
async fn test_save_invalidates_memoized_fallback() {
    let fx = ServiceFixture::new();
    let mut ctx = fx.env_context();

    let before = fx
        .service
        .resolve(&keys::COMPANY_NAME, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(before, "");

    fx.service
        .save(&keys::COMPANY_NAME, Some("Acme"), None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap();

    let after = fx
        .service
        .resolve_with_source(&keys::COMPANY_NAME, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(after.value, "Acme");
    assert_eq!(after.source, ResolutionSource::ParentScope);
}

#[tokio::test]
async fn test_typed_accessors() {
    let fx = ServiceFixture::builder()
        .record("portal.top-apis", ENV_ID, ScopeType::Environment, "api-1;;deprecated-2;api-3")
        .build();
    let mut ctx = fx.env_context();

    let top = fx
        .service
        .find_as_list_filtered(
            &keys::PORTAL_TOP_APIS,
            |item| !item.is_empty() && !item.starts_with("deprecated"),
            None,
            ScopeType::Environment,
            &mut ctx,
        )
        .await
        .unwrap();
    assert_eq!(top, vec!["api-1", "api-3"]);

    let properties = fx
        .service
        .find_as_map(&keys::EMAIL_PROPERTIES, None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap();
    assert_eq!(
        properties,
        vec![
            ("auth".to_string(), "true".to_string()),
            ("starttls.enable".to_string(), "false".to_string()),
        ]
    );

    let max_age = fx
        .service
        .find_as_i64(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(max_age, 1_728_000);

    let empty = fx
        .service
        .find_as_list(&keys::API_LABELS_DICTIONARY, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_environment_variable_overrides() {
    let directory = MemoryEnvironmentDirectory::new();
    let overrides = EnvOverrideSource::from_vars(
        Some("APIM"),
        [
            ("APIM_PORTAL_RATING_ENABLED", "true"),
            ("APIM_HTTP_CORS_ALLOW_METHODS", "GET,POST"),
        ],
    );
    let service = ParameterService::new(Arc::new(MemoryParameterStore::new()), Arc::new(directory))
        .with_overrides(Arc::new(overrides));
    let fx = ServiceFixture::new();
    let mut ctx = fx.env_context();

    assert!(service
        .find_as_boolean(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap());
    let methods = service
        .find_as_list(&keys::CORS_ALLOW_METHODS, None, ScopeType::Environment, &mut ctx)
        .await
        .unwrap();
    assert_eq!(methods, vec!["GET", "POST"]);
}

#[tokio::test]
async fn test_from_config_without_env_overrides() {
    let config = ParameterServiceConfig {
        env_overrides: false,
        ..ParameterServiceConfig::default()
    };
    let service = ParameterService::from_config(
        config.clone(),
        Arc::new(MemoryParameterStore::new()),
        Arc::new(MemoryEnvironmentDirectory::new()),
    );
    assert_eq!(service.config(), &config);

    let fx = ServiceFixture::new();
    let mut ctx = fx.org_context();
    let resolution = service
        .resolve_with_source(&keys::MANAGEMENT_TITLE, None, ScopeType::Organization, &mut ctx)
        .await
        .unwrap();
    assert_eq!(resolution.source, ResolutionSource::Default);
    assert_eq!(resolution.value, "API Management");
}
