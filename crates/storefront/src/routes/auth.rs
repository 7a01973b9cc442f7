//! Authentication route handlers.
//!
//! Consumers and producers share one set of handlers, instantiated per role
//! through the [`RequiredRole`] marker. Form posts follow POST-redirect-GET:
//! failures land back on the role's login page with an `?error=` code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{error, instrument, warn};

use twin_gain_core::{Email, Identity, Role};

use super::NavView;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CurrentClient, RequiredRole};
use crate::services::{AuthError, SignUpOutcome};

// =============================================================================
// Forms
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for status messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login and registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub role_label: &'static str,
    pub login_path: &'static str,
    pub register_path: String,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

// =============================================================================
// Status Codes
// =============================================================================

/// Query-string code for a failed login or registration.
const fn error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::InvalidCredentials | AuthError::NotSignedIn => "credentials",
        AuthError::UserAlreadyExists => "exists",
        AuthError::WeakPassword(_) => "weak_password",
        AuthError::InvalidEmail(_) => "invalid_email",
        AuthError::MissingRole => "no_role",
        AuthError::Backend(_) => "unavailable",
    }
}

fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "credentials" => Some("Invalid email or password."),
        "exists" => Some("An account with this email already exists. Please sign in."),
        "weak_password" => Some("Password must be at least 6 characters."),
        "invalid_email" => Some("Please enter a valid email address."),
        "no_role" => Some("This account is not set up as a producer or consumer."),
        "password_mismatch" => Some("Passwords do not match."),
        "unavailable" => Some("Sign-in is temporarily unavailable. Please try again."),
        "session" => Some("We couldn't start your session. Please try again."),
        _ => None,
    }
}

fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "confirm_email" => Some("Account created. Check your email to confirm it, then sign in."),
        _ => None,
    }
}

fn failed<R: RequiredRole>(code: &str) -> Response {
    Redirect::to(&format!("{}?error={code}", R::ROLE.login_path())).into_response()
}

/// Persist a fresh sign-in and send the user to their dashboard.
async fn signed_in<R: RequiredRole>(client: &CurrentClient, identity: &Identity) -> Response {
    // New session ID on privilege change.
    if let Err(e) = client.cycle_session_id().await {
        error!(error = %e, "Failed to cycle session ID");
    }
    if let Err(e) = client.save().await {
        error!(error = %e, "Failed to save session after sign-in");
        return failed::<R>("session");
    }

    set_sentry_user(&identity.id, identity.email.as_ref().map(Email::as_str));
    Redirect::to(identity.role.dashboard_path()).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page for role `R`.
///
/// Signed-in users go straight to their own dashboard.
pub async fn login_page<R: RequiredRole>(
    client: CurrentClient,
    Query(query): Query<MessageQuery>,
) -> Response {
    if let Some(identity) = client.identity() {
        return Redirect::to(identity.role.dashboard_path()).into_response();
    }

    LoginTemplate {
        nav: NavView::new(&client),
        role_label: R::ROLE.label(),
        login_path: R::ROLE.login_path(),
        register_path: register_path(R::ROLE),
        error: query.error.as_deref().and_then(error_message),
        success: query.success.as_deref().and_then(success_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// The account's own role decides the dashboard, whichever login page was
/// used.
#[instrument(skip(client, form), fields(role = R::ROLE.as_str()))]
pub async fn login<R: RequiredRole>(client: CurrentClient, Form(form): Form<LoginForm>) -> Response {
    let result = match Email::parse(&form.email) {
        Ok(email) => client.auth().sign_in(&email, &form.password).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(identity) => signed_in::<R>(&client, &identity).await,
        Err(e) => {
            warn!(error = %e, "Login failed");
            failed::<R>(error_code(&e))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

fn register_path(role: Role) -> String {
    format!("/{role}/register")
}

/// Handle registration form submission for role `R`.
#[instrument(skip(client, form), fields(role = R::ROLE.as_str()))]
pub async fn register<R: RequiredRole>(
    client: CurrentClient,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return failed::<R>("password_mismatch");
    }

    let result = match Email::parse(&form.email) {
        Ok(email) => {
            client
                .auth()
                .sign_up(&email, &form.password, R::ROLE)
                .await
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(SignUpOutcome::SignedIn(identity)) => signed_in::<R>(&client, &identity).await,
        Ok(SignUpOutcome::ConfirmationRequired) => Redirect::to(&format!(
            "{}?success=confirm_email",
            R::ROLE.login_path()
        ))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Registration failed");
            failed::<R>(error_code(&e))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(client))]
pub async fn logout(client: CurrentClient) -> Response {
    client.auth().sign_out().await;

    if let Err(e) = client.save().await {
        error!(error = %e, "Failed to save session after sign-out");
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Consumer, Producer};
    use crate::supabase::BackendError;
    use axum::http::header::LOCATION;

    fn location(response: &Response) -> Option<&str> {
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_every_error_code_has_a_message() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::UserAlreadyExists,
            AuthError::WeakPassword("short".to_string()),
            AuthError::MissingRole,
            AuthError::NotSignedIn,
            AuthError::Backend(BackendError::RateLimited(5)),
        ];
        for err in &errors {
            assert!(error_message(error_code(err)).is_some(), "{err}");
        }
        assert!(error_message("password_mismatch").is_some());
        assert!(error_message("bogus").is_none());
    }

    #[test]
    fn test_failed_redirects_to_role_login() {
        let response = failed::<Producer>("credentials");
        assert_eq!(location(&response), Some("/producer/login?error=credentials"));

        let response = failed::<Consumer>("exists");
        assert_eq!(location(&response), Some("/consumer/login?error=exists"));
    }

    #[test]
    fn test_register_path() {
        assert_eq!(register_path(Role::Consumer), "/consumer/register");
        assert_eq!(register_path(Role::Producer), "/producer/register");
    }

    #[test]
    fn test_success_message() {
        assert!(success_message("confirm_email").is_some());
        assert!(success_message("other").is_none());
    }
}
