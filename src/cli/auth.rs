use crate::api::models::{Credentials, RegisterRequest};
use crate::api::AuthApi;
use crate::app::App;
use crate::error::{Result, TmsError};

/// Sign in and persist the returned token.
pub async fn run_login(app: &App, email: String, password: String) -> Result<()> {
    let credentials = Credentials { email, password };
    // The server answers bad credentials with 401, which is not a session problem.
    let response = AuthApi::new(&app.client)
        .login(&credentials)
        .await
        .map_err(|e| match e {
            TmsError::Unauthorized { .. } => TmsError::InvalidCredentials,
            other => other,
        })?;
    eprintln!("tms: logged in as {}", response.user.email);
    Ok(())
}

/// Create an account. The server may or may not sign the user in directly.
pub async fn run_register(app: &App, name: String, email: String, password: String) -> Result<()> {
    let request = RegisterRequest {
        name,
        email,
        password,
    };
    let response = AuthApi::new(&app.client).register(&request).await?;

    match app.session.user() {
        Some(user) if response.token.is_some() => {
            eprintln!("tms: registered and logged in as {}", user.email);
        }
        _ => {
            let message = response
                .message
                .unwrap_or_else(|| "registration successful".into());
            eprintln!("tms: {message}; run `tms login` to sign in");
        }
    }
    Ok(())
}

/// Drop the stored session. Safe to run when already logged out.
pub fn run_logout(app: &App) -> Result<()> {
    app.session.logout()?;
    eprintln!("tms: logged out");
    Ok(())
}

/// Print the user restored from the stored session.
pub fn run_whoami(app: &App) -> Result<()> {
    match app.session.user() {
        Some(user) => {
            println!("{} ({})", user.email, user.role);
            println!("id: {}", user.id);
        }
        None => println!("not logged in"),
    }
    Ok(())
}
