// Session login/logout and platform detection.
//
// Login stores the session cookie in the client's jar; every later request
// on the same client carries it. UniFi OS additionally hands out a CSRF
// token that must accompany POSTs.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::transport::{ClientAuth, TransportConfig};

impl LegacyClient {
    /// Open a cookie session with username and password.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().login_path())?;
        debug!(%url, username, "logging in");

        let resp = self
            .http()
            .post(url)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status}): {body}"),
            });
        }

        let csrf = resp
            .headers()
            .get("X-CSRF-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if let Some(token) = csrf {
            self.set_csrf_token(token);
        }
        Ok(())
    }

    /// Invalidate the session on the controller.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().logout_path())?;
        debug!(%url, "logging out");

        let status = self.apply_csrf(self.http().post(url)).send().await?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Authentication {
                message: format!("logout rejected (HTTP {status})"),
            })
        }
    }

    /// Probe the login endpoints to tell UniFi OS from a standalone
    /// Network Application.
    ///
    /// Anything other than 404 on `/api/auth/login` means UniFi OS. Failing
    /// that, the standalone endpoint only has to answer at all; a transport
    /// failure there means the controller is unreachable.
    pub async fn detect_platform(
        base_url: &Url,
        transport: &TransportConfig,
    ) -> Result<ControllerPlatform, Error> {
        let http = transport.build_client(ClientAuth::Anonymous)?;

        let probe = base_url.join(ControllerPlatform::UnifiOs.login_path())?;
        debug!(url = %probe, "probing for UniFi OS");
        if let Ok(resp) = http.get(probe).send().await {
            if resp.status() != reqwest::StatusCode::NOT_FOUND {
                return Ok(ControllerPlatform::UnifiOs);
            }
        }

        let probe = base_url.join(ControllerPlatform::ClassicController.login_path())?;
        debug!(url = %probe, "probing for standalone controller");
        match http.get(probe).send().await {
            Ok(_) => Ok(ControllerPlatform::ClassicController),
            Err(e) if e.is_timeout() => Err(Error::Timeout {
                timeout_secs: transport.timeout.as_secs(),
            }),
            Err(e) => Err(Error::Transport(e)),
        }
    }
}
