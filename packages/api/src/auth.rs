//! Login, registration and logout on top of the request pipeline.
//!
//! Login and register go out without a bearer credential and never trigger
//! a refresh: a 401 from `/token/` means the password is wrong, not that a
//! session expired.

use std::sync::Arc;

use store::CredentialStore;
use tracing::info;

use crate::error::{AuthError, PipelineError};
use crate::models::user::RegistrationResponse;
use crate::models::{AccountInfo, Credentials, Registration, TokenPair};
use crate::pipeline::RequestPipeline;
use crate::transport::{ApiRequest, Transport};

pub const LOGIN_PATH: &str = "/token/";
pub const REGISTER_PATH: &str = "/register/";

pub struct AuthClient<T: Transport, S: CredentialStore> {
    pipeline: Arc<RequestPipeline<T, S>>,
}

impl<T: Transport, S: CredentialStore> AuthClient<T, S> {
    pub fn new(pipeline: Arc<RequestPipeline<T, S>>) -> Self {
        Self { pipeline }
    }

    /// Exchange email and password for a credential pair and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let request = ApiRequest::post(LOGIN_PATH).json(&credentials);
        let pair: TokenPair = match self.pipeline.send_anonymous(&request).await {
            Ok(response) => response.json().map_err(PipelineError::from)?,
            Err(PipelineError::RequestFailed {
                status: 400 | 401, ..
            }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        self.pipeline
            .session()
            .set_tokens(&pair.access, &pair.refresh)
            .await;
        info!("logged in as {}", credentials.email);
        Ok(())
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// Field rules are checked locally first so an invalid form never
    /// reaches the backend.
    pub async fn register(&self, registration: &Registration) -> Result<AccountInfo, AuthError> {
        registration.validate()?;

        let request = ApiRequest::post(REGISTER_PATH).json(registration);
        let response = self.pipeline.send_anonymous(&request).await?;
        let RegistrationResponse { user } = response.json().map_err(PipelineError::from)?;
        info!(user = user.id, "registered {}", user.username);

        let credentials = registration.credentials();
        self.login(&credentials.email, &credentials.password).await?;
        Ok(user)
    }

    /// Forget both credentials. Purely local.
    pub async fn logout(&self) {
        self.pipeline.session().clear().await;
        info!("logged out");
    }
}
