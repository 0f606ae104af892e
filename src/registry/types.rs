use crate::utils::mask_key;

/// How an endpoint is reached, if at all
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointKind {
    /// Traffic gateway endpoint: key sent as `apikey` query parameter, retried
    Active {
        url: String,
        params: Vec<(String, String)>,
    },
    /// Retired service; never requested
    Discontinued,
    /// Population endpoint: key embedded in the URL path, single attempt
    SpecialPopulation { base_url: String, url: String },
}

/// One probed endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    pub id: u8,
    pub name: String,
    pub api_key: String,
    pub kind: EndpointKind,
}

impl EndpointSpec {
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            EndpointKind::Active { url, .. } | EndpointKind::SpecialPopulation { url, .. } => {
                Some(url.as_str())
            }
            EndpointKind::Discontinued => None,
        }
    }

    /// URL with the API key masked, for logs and reports
    pub fn display_url(&self) -> Option<String> {
        match &self.kind {
            EndpointKind::Active { url, .. } => Some(url.clone()),
            EndpointKind::SpecialPopulation { base_url, .. } => {
                Some(population_url(base_url, &mask_key(&self.api_key)))
            }
            EndpointKind::Discontinued => None,
        }
    }

    pub fn is_discontinued(&self) -> bool {
        matches!(self.kind, EndpointKind::Discontinued)
    }
}

/// `{base}/{key}/json/citydata_ppltn/1/5/POI007`
pub fn population_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}/json/citydata_ppltn/1/5/POI007",
        base_url.trim_end_matches('/'),
        key
    )
}
