use tracing::debug;

use crate::{
    Res,
    types::{AuthTokenResponse, SessionToken},
    utils,
};

use super::ConcurClient;

impl ConcurClient {
    /// Exchanges the destination's user and password for an access token.
    ///
    /// Concur expects:
    ///
    /// ```text
    /// GET <auth URL>
    /// Authorization: Basic {base64(LoginID:Password)}
    /// X-ConsumerKey: {Consumer Key}
    /// ```
    ///
    /// and answers `{"Access_Token": {"Token": "..."}}`. The token comes back
    /// with its `OAuth` scheme prefix, ready for the `Authorization` header.
    pub async fn obtain_token(&self, auth_destination: &str) -> Res<SessionToken> {
        debug!(destination = auth_destination, "requesting authentication token");
        let props = self.destination(auth_destination).await?;

        let url = props.require("URL")?.to_string();
        let user = props.require("User")?;
        let password = props.require("Password")?;
        let consumer_key = props.require("X-ConsumerKey")?;

        let request = self
            .prepare(&props, url)?
            .header("Accept", "application/json")
            .header("X-ConsumerKey", consumer_key)
            .header(
                "Authorization",
                format!("Basic {}", utils::basic_credentials(user, password)),
            );

        let body = self.transport.get(&request).await?;
        extract_token(&body)
    }
}

/// Reads `Access_Token.Token` from an authentication response body.
pub fn extract_token(body: &[u8]) -> Res<SessionToken> {
    let response: AuthTokenResponse = serde_json::from_slice(body)?;
    if let Some(expires) = &response.access_token.expiration_date {
        debug!(expires = %expires, "received authentication token");
    }
    Ok(SessionToken::oauth(&response.access_token.token))
}
