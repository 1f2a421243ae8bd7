use std::error::Error;
use std::fmt;

use url::Url;

/// A pre-authorized Data Lake file system URL, e.g.
/// `https://<account>.dfs.core.windows.net/<filesystem>?sv=...&sig=...`
pub struct SasUrl {
    pub account_name: String,
    pub container_name: String,
    pub sas: Vec<(String, String)>,
    pub endpoint: String,
}

impl SasUrl {

    pub fn parse(sas_url: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let url = Url::parse(sas_url).map_err(|e| format!("Failed to parse SAS URL: {}", e))?;
        let host = url.host_str().ok_or("Missing host in SAS URL")?;
        let account_name = host.split('.').next().ok_or("Missing account name in host")?.to_string();
        if account_name.is_empty() {
            return Err("Missing account name in host".into());
        }

        let container_name = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .ok_or("Missing file system name in SAS URL path")?
            .to_string();

        let sas: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if sas.is_empty() {
            return Err("Missing SAS token in SAS URL query".into());
        }

        let endpoint = format!("{}://{}", url.scheme(), host);

        Ok(SasUrl {
            account_name,
            container_name,
            sas,
            endpoint,
        })
    }
}

// The query carries the signature, never print it.
impl fmt::Debug for SasUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasUrl")
            .field("account_name", &self.account_name)
            .field("container_name", &self.container_name)
            .field("endpoint", &self.endpoint)
            .field("sas", &"<redacted>")
            .finish()
    }
}
