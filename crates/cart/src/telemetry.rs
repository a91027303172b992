//! Sentry context for cart activity.
//!
//! Store failures are absorbed, so Sentry is how they surface: the active
//! identity is attached as the Sentry user and every cart mutation leaves a
//! breadcrumb. All functions are no-ops when Sentry is not initialised.

use horno_core::Identity;

/// Associate subsequent Sentry events with the shopper.
pub fn set_sentry_user(identity: &Identity) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(identity.id.to_string()),
            email: Some(identity.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Called on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a cart action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", &[("product_id", product_id.to_string())]);
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String(value.clone()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
