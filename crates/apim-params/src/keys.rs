//! Built-in management plane keys.
//!
//! List defaults use the stored `;` encoding.

use apim_core::ScopeType;

use crate::key::Key;

const ORG: &[ScopeType] = &[ScopeType::Organization];
const ENV: &[ScopeType] = &[ScopeType::Environment];
const ORG_ENV: &[ScopeType] = &[ScopeType::Organization, ScopeType::Environment];

// Company / portal

/// Company name displayed in the portal.
pub const COMPANY_NAME: Key = Key::scalar("COMPANY_NAME", "company.name", "", ORG_ENV);
/// Public portal URL.
pub const PORTAL_ENTRYPOINT: Key = Key::scalar(
    "PORTAL_ENTRYPOINT",
    "portal.entrypoint",
    "https://api.company.com",
    ORG_ENV,
);
/// Header carrying API keys on gateway calls.
pub const PORTAL_APIKEY_HEADER: Key = Key::scalar(
    "PORTAL_APIKEY_HEADER",
    "portal.apikey.header",
    "X-Api-Key",
    ORG_ENV,
);
/// APIs pinned to the portal home page, in display order.
pub const PORTAL_TOP_APIS: Key =
    Key::list("PORTAL_TOP_APIS", "portal.top-apis", "", ENV).not_overridable();
/// Whether consumers may rate APIs.
pub const PORTAL_RATING_ENABLED: Key =
    Key::scalar("PORTAL_RATING_ENABLED", "portal.rating.enabled", "false", ENV);
/// Whether a rating must carry a comment.
pub const PORTAL_RATING_COMMENT_MANDATORY: Key = Key::scalar(
    "PORTAL_RATING_COMMENT_MANDATORY",
    "portal.rating.comment.mandatory",
    "false",
    ORG_ENV,
);
/// Whether the support ticket form is shown.
pub const PORTAL_SUPPORT_ENABLED: Key =
    Key::scalar("PORTAL_SUPPORT_ENABLED", "portal.support.enabled", "true", ORG_ENV);
/// Whether visitors may register accounts.
pub const PORTAL_USER_CREATION_ENABLED: Key = Key::scalar(
    "PORTAL_USER_CREATION_ENABLED",
    "portal.userCreation.enabled",
    "true",
    ORG_ENV,
);
/// Whether portal analytics are collected.
pub const PORTAL_ANALYTICS_ENABLED: Key = Key::scalar(
    "PORTAL_ANALYTICS_ENABLED",
    "portal.analytics.enabled",
    "false",
    ENV,
);

// Console / management

/// Title of the management console.
pub const MANAGEMENT_TITLE: Key =
    Key::scalar("MANAGEMENT_TITLE", "management.title", "API Management", ORG);
/// Public URL of the management console.
pub const MANAGEMENT_URL: Key = Key::scalar("MANAGEMENT_URL", "management.url", "", ORG);
/// Polling interval of console notifications, in seconds.
pub const CONSOLE_SCHEDULER_NOTIFICATIONS: Key = Key::scalar(
    "CONSOLE_SCHEDULER_NOTIFICATIONS",
    "console.scheduler.notifications",
    "10",
    ORG,
);
/// Whether the platform is in maintenance mode.
pub const MAINTENANCE_MODE_ENABLED: Key =
    Key::scalar("MAINTENANCE_MODE_ENABLED", "maintenance.enabled", "false", ORG);
/// Whether username/password login is offered.
pub const AUTHENTICATION_LOCAL_LOGIN_ENABLED: Key = Key::scalar(
    "AUTHENTICATION_LOCAL_LOGIN_ENABLED",
    "authentication.localLogin.enabled",
    "true",
    ORG_ENV,
);
/// Whether alerting is available.
pub const ALERT_ENABLED: Key = Key::scalar("ALERT_ENABLED", "alert.enabled", "true", ORG_ENV);

// APIs and plans

/// Labels proposed when editing an API.
pub const API_LABELS_DICTIONARY: Key =
    Key::list("API_LABELS_DICTIONARY", "api.labelsDictionary", "", ORG_ENV).not_overridable();
/// Who may become an API primary owner: USER, GROUP or HYBRID.
pub const API_PRIMARY_OWNER_MODE: Key = Key::scalar(
    "API_PRIMARY_OWNER_MODE",
    "api.primary.owner.mode",
    "HYBRID",
    ORG_ENV,
);
/// Whether API quality metrics are computed.
pub const API_QUALITY_METRICS_ENABLED: Key = Key::scalar(
    "API_QUALITY_METRICS_ENABLED",
    "api.quality.metrics.enabled",
    "false",
    ENV,
);
/// Whether API-key plans may be created.
pub const PLAN_SECURITY_APIKEY_ENABLED: Key = Key::scalar(
    "PLAN_SECURITY_APIKEY_ENABLED",
    "plan.security.apikey.enabled",
    "true",
    ORG_ENV,
);
/// Whether keyless plans may be created.
pub const PLAN_SECURITY_KEYLESS_ENABLED: Key = Key::scalar(
    "PLAN_SECURITY_KEYLESS_ENABLED",
    "plan.security.keyless.enabled",
    "true",
    ORG_ENV,
);

// CORS

/// Origins allowed to call the portal API.
pub const CORS_ALLOW_ORIGIN: Key =
    Key::list("CORS_ALLOW_ORIGIN", "http.cors.allow-origin", "*", ORG_ENV);
/// Headers allowed on cross-origin calls.
pub const CORS_ALLOW_HEADERS: Key = Key::list(
    "CORS_ALLOW_HEADERS",
    "http.cors.allow-headers",
    "Cache-Control;Pragma;Origin;Authorization;Content-Type;X-Requested-With;If-Match;X-Xsrf-Token",
    ORG_ENV,
);
/// Methods allowed on cross-origin calls.
pub const CORS_ALLOW_METHODS: Key = Key::list(
    "CORS_ALLOW_METHODS",
    "http.cors.allow-methods",
    "OPTIONS;GET;POST;PUT;DELETE;PATCH",
    ORG_ENV,
);
/// Preflight cache duration in seconds.
pub const CORS_MAX_AGE: Key = Key::scalar("CORS_MAX_AGE", "http.cors.max-age", "1728000", ORG_ENV);

// Email

/// Whether outgoing email is enabled.
pub const EMAIL_ENABLED: Key = Key::scalar("EMAIL_ENABLED", "email.enabled", "false", ORG);
/// SMTP host.
pub const EMAIL_HOST: Key = Key::scalar("EMAIL_HOST", "email.host", "smtp.my.domain", ORG);
/// SMTP port.
pub const EMAIL_PORT: Key = Key::scalar("EMAIL_PORT", "email.port", "587", ORG);
/// SMTP sender address.
pub const EMAIL_FROM: Key = Key::scalar("EMAIL_FROM", "email.from", "noreply@my.domain", ORG);
/// Extra transport properties, as `name@value` pairs.
pub const EMAIL_PROPERTIES: Key = Key::map(
    "EMAIL_PROPERTIES",
    "email.properties",
    "auth@true;starttls.enable@false",
    ORG,
);

/// Every built-in key, in declaration order.
pub const BUILTIN_KEYS: &[Key] = &[
    COMPANY_NAME,
    PORTAL_ENTRYPOINT,
    PORTAL_APIKEY_HEADER,
    PORTAL_TOP_APIS,
    PORTAL_RATING_ENABLED,
    PORTAL_RATING_COMMENT_MANDATORY,
    PORTAL_SUPPORT_ENABLED,
    PORTAL_USER_CREATION_ENABLED,
    PORTAL_ANALYTICS_ENABLED,
    MANAGEMENT_TITLE,
    MANAGEMENT_URL,
    CONSOLE_SCHEDULER_NOTIFICATIONS,
    MAINTENANCE_MODE_ENABLED,
    AUTHENTICATION_LOCAL_LOGIN_ENABLED,
    ALERT_ENABLED,
    API_LABELS_DICTIONARY,
    API_PRIMARY_OWNER_MODE,
    API_QUALITY_METRICS_ENABLED,
    PLAN_SECURITY_APIKEY_ENABLED,
    PLAN_SECURITY_KEYLESS_ENABLED,
    CORS_ALLOW_ORIGIN,
    CORS_ALLOW_HEADERS,
    CORS_ALLOW_METHODS,
    CORS_MAX_AGE,
    EMAIL_ENABLED,
    EMAIL_HOST,
    EMAIL_PORT,
    EMAIL_FROM,
    EMAIL_PROPERTIES,
];
