pub mod types;

use crate::utils::Settings;
use std::collections::BTreeMap;

pub use types::{population_url, EndpointKind, EndpointSpec};

/// Identifier of the population endpoint
pub const POPULATION_API_ID: u8 = 9;

/// Fixed table of probed endpoints, keyed by identifier
#[derive(Debug, Clone)]
pub struct Registry {
    endpoints: BTreeMap<u8, EndpointSpec>,
}

impl Registry {
    /// Build the nine Seoul endpoints from validated settings
    pub fn from_settings(settings: &Settings) -> Self {
        let base = settings.seoul_api_base_url.trim_end_matches('/');
        let date = settings.standard_date.as_str();
        let traffic_key = settings.traffic_api_key();

        let traffic = |id: u8, name: &str, service: &str, params: &[(&str, &str)]| {
            traffic_endpoint(id, name, &format!("{}/{}/1.0", base, service), traffic_key, params)
        };

        let population_key = settings.population_api_key();
        let population_base = settings.seoul_population_base_url.trim_end_matches('/');
        let population = EndpointSpec {
            id: POPULATION_API_ID,
            name: "실시간 인구".to_string(),
            api_key: population_key.to_string(),
            kind: EndpointKind::SpecialPopulation {
                base_url: population_base.to_string(),
                url: population_url(population_base, population_key),
            },
        };

        let entries = vec![
            traffic(
                1,
                "정류장별 승하차",
                "TaimsTpssStaRouteInfoH",
                &[("stdrDe", date)],
            ),
            traffic(
                2,
                "구간별 승객수",
                "TaimsTpssA18RouteSection",
                &[("stdrDe", date), ("routeId", "100100001")],
            ),
            traffic(
                3,
                "행정동별 OD",
                "TaimsTpssEmdOdTc",
                &[("stdrDe", date), ("emdCd", "1111051")],
            ),
            traffic(
                4,
                "구간별 운행시간",
                "TaimsTpssRouteSectionSpeedH",
                &[("stdrDe", date), ("routeId", "100100001")],
            ),
            traffic(
                5,
                "노선-정류장 마스터",
                "TaimsTaimsTbisMsRouteNode",
                &[("routeId", "100100001")],
            ),
            EndpointSpec {
                id: 6,
                name: "좌표정보 (중단됨)".to_string(),
                api_key: String::new(),
                kind: EndpointKind::Discontinued,
            },
            traffic(
                7,
                "구간별 소통정보",
                "TopisIccStTimesLinkTrfSectionStats",
                &[("stndDt", date)],
            ),
            traffic(
                8,
                "차량운행통계",
                "BisTbisStVehOprat",
                &[("stdrDe", date)],
            ),
            population,
        ];

        Self {
            endpoints: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    pub fn get(&self, id: u8) -> Option<&EndpointSpec> {
        self.endpoints.get(&id)
    }

    /// Endpoints in ascending identifier order
    pub fn iter(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.endpoints.values()
    }

    pub fn ids(&self) -> Vec<u8> {
        self.endpoints.keys().copied().collect()
    }
}

fn traffic_endpoint(
    id: u8,
    name: &str,
    url: &str,
    api_key: &str,
    params: &[(&str, &str)],
) -> EndpointSpec {
    let mut query: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    query.push(("startRow".to_string(), "1".to_string()));
    query.push(("rowCnt".to_string(), "10".to_string()));

    EndpointSpec {
        id,
        name: name.to_string(),
        api_key: api_key.to_string(),
        kind: EndpointKind::Active {
            url: url.to_string(),
            params: query,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            seoul_traffic_api_key: Some("traffic-key-123".to_string()),
            seoul_population_api_key: Some("population-key-456".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_nine_endpoints_in_order() {
        let registry = Registry::from_settings(&settings());
        assert_eq!(registry.ids(), (1..=9).collect::<Vec<u8>>());
        assert!(registry.get(6).unwrap().is_discontinued());
        assert_eq!(registry.iter().filter(|e| !e.is_discontinued()).count(), 8);
    }

    #[test]
    fn test_traffic_endpoint_shape() {
        let registry = Registry::from_settings(&settings());
        let spec = registry.get(2).unwrap();
        match &spec.kind {
            EndpointKind::Active { url, params } => {
                assert_eq!(
                    url,
                    "http://t-data.seoul.go.kr/apig/apiman-gateway/tapi/TaimsTpssA18RouteSection/1.0"
                );
                let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["stdrDe", "routeId", "startRow", "rowCnt"]);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(spec.api_key, "traffic-key-123");
    }

    #[test]
    fn test_population_key_in_path() {
        let registry = Registry::from_settings(&settings());
        let spec = registry.get(POPULATION_API_ID).unwrap();
        assert_eq!(
            spec.url(),
            Some("http://openapi.seoul.go.kr:8088/population-key-456/json/citydata_ppltn/1/5/POI007")
        );
        assert_eq!(
            spec.display_url().unwrap(),
            "http://openapi.seoul.go.kr:8088/population***/json/citydata_ppltn/1/5/POI007"
        );
    }
}
