// Legacy API system endpoints

use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::legacy::models::LegacyHealth;

impl LegacyClient {
    /// Get site health dashboard metrics.
    ///
    /// `GET /api/s/{site}/stat/health`
    ///
    /// Returns one entry per subsystem (wan, wan2, lan, wlan, vpn, www).
    pub async fn get_health(&self) -> Result<Vec<LegacyHealth>, Error> {
        let url = self.site_url("stat/health")?;
        debug!("fetching site health");
        self.get(url).await
    }
}
