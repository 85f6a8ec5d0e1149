//! Listed-issue reference data (`GET /listed/info`).

use serde::{Deserialize, Serialize};

use crate::models::date::Date;

/// One listed issue as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrandInfo {
    /// Date the listing information applies to.
    pub date: Date,
    /// Issue code, unique per listed issue (e.g. `"13010"`).
    pub code: String,
    pub company_name: String,
    pub company_name_english: String,
    pub sector17_code: String,
    pub sector17_code_name: String,
    pub sector33_code: String,
    pub sector33_code_name: String,
    pub scale_category: String,
    pub market_code: String,
    pub market_code_name: String,
}

/// Optional filters for the listed-issue query. Empty means "every issue, latest date".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBrandsQuery {
    pub code: Option<String>,
    pub date: Option<Date>,
}

impl ListBrandsQuery {
    /// Query parameters for the present filters only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(code) = &self.code {
            pairs.push(("code", code.clone()));
        }
        if let Some(date) = &self.date {
            pairs.push(("date", date.format()));
        }
        pairs
    }
}

/// Body of a successful listed-issue response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBrandsResponse {
    #[serde(rename = "info")]
    pub brands: Vec<BrandInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_listed_info_payload() {
        let body = r#"{
            "info": [{
                "Date": "2023-01-04",
                "Code": "13010",
                "CompanyName": "極洋",
                "CompanyNameEnglish": "KYOKUYO CO.,LTD.",
                "Sector17Code": "1",
                "Sector17CodeName": "食品",
                "Sector33Code": "0050",
                "Sector33CodeName": "水産・農林業",
                "ScaleCategory": "TOPIX Small 2",
                "MarketCode": "0111",
                "MarketCodeName": "プライム",
                "MarginCode": "1"
            }]
        }"#;

        let resp: ListBrandsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.brands.len(), 1);
        let b = &resp.brands[0];
        assert_eq!(b.date, Date::from_ymd(2023, 1, 4).unwrap());
        assert_eq!(b.code, "13010");
        assert_eq!(b.company_name_english, "KYOKUYO CO.,LTD.");
        assert_eq!(b.sector33_code_name, "水産・農林業");
        assert_eq!(b.market_code, "0111");
    }

    #[test]
    fn only_present_filters_become_parameters() {
        assert!(ListBrandsQuery::default().query_pairs().is_empty());

        let q = ListBrandsQuery {
            code: Some("86970".into()),
            date: Some(Date::from_ymd(2023, 3, 1).unwrap()),
        };
        assert_eq!(
            q.query_pairs(),
            vec![("code", "86970".to_string()), ("date", "2023-03-01".to_string())]
        );
    }
}
