use tracing::debug;

use crate::{Res, types::SessionToken, xml};

use super::ConcurClient;

/// Appended to the API destination URL to list every user's expense entries.
pub const EXPENSES_PATH: &str = "/v3.0/expense/entries?user=all";

impl ConcurClient {
    /// Fetches expense entries with `token` and returns them as indented JSON.
    ///
    /// The body is read to completion without a size limit.
    pub async fn fetch_expenses(&self, api_destination: &str, token: &SessionToken) -> Res<String> {
        debug!(destination = api_destination, "fetching expense entries");
        let props = self.destination(api_destination).await?;

        let url = format!("{}{}", props.require("URL")?, EXPENSES_PATH);
        let request = self
            .prepare(&props, url)?
            .header("Authorization", token.as_str());

        let body = self.transport.get(&request).await?;
        debug!(bytes = body.len(), "transcoding expense entries");
        xml::xml_to_json(&String::from_utf8_lossy(&body))
    }
}
