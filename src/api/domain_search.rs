//! Domain availability search
//!
//! Consumes the dispatcher/normalizer core to query the zone-names, fix
//! (name suggestions), and verisign bulk-check services. The `hash` query
//! value the site expects is a djb2-variant 32-bit string hash of the search
//! label, seeded differently per endpoint family.

use crate::{
    Result,
    normalize::{self, FieldSource, FieldSpec, Shape},
    session::Dispatcher,
    types::{PayloadFormat, RequestSpec},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// TLDs queried when the caller does not supply a list
pub const DEFAULT_TLDS: &str = "com,net,org,ai,io,xyz,app,shop,info,co,store,site,online,dev,\
    tech,pro,live,lol,club,vip,link,top,me,tv,blog,cloud,design,studio,art,fun,one,world,\
    digital,global,space,plus,media,email,host,page,ltd,biz,agency,social,stream,zone,web,\
    team,work,life,love,best,cool,today,guru,care,fit,marketing,luxury,solutions,services,\
    money,consulting,bio";

/// Hash seed for the zone-names and fix endpoints
const ZONE_HASH_SEED: i32 = 42;
/// Hash seed for the verisign bulk check
const VERISIGN_HASH_SEED: i32 = 27;

/// Availability status of a single domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Fully qualified domain (label + TLD)
    pub domain: String,
    /// True when the domain is not registered
    pub is_available: bool,
}

/// Results of one search: direct TLD variations plus suggested names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSearchResults {
    /// The query as given
    pub query: String,
    /// Availability of the label across the requested TLDs
    pub main_results: Vec<DomainInfo>,
    /// Availability of site-suggested alternative names
    pub suggested_results: Vec<DomainInfo>,
}

/// One entry of the zone-names / fix result arrays
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneItem {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    tld: Option<String>,
    #[serde(default = "default_registered")]
    is_registered: bool,
}

fn default_registered() -> bool {
    true
}

/// One entry of the verisign check result array
#[derive(Debug, Deserialize)]
struct VerisignItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    availability: Option<String>,
}

/// API for searching domain availability and getting suggestions
#[derive(Debug, Clone)]
pub struct DomainSearchApi {
    /// Shared dispatcher
    dispatcher: Arc<Dispatcher>,
    /// City hint sent with zone queries
    city: String,
    /// Country hint sent with zone queries
    country: String,
}

impl DomainSearchApi {
    /// Create the API over a shared dispatcher
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            city: "Houston".to_string(),
            country: "US".to_string(),
        }
    }

    /// Override the location hints sent with zone queries
    pub fn with_location(mut self, city: impl Into<String>, country: impl Into<String>) -> Self {
        self.city = city.into();
        self.country = country.into();
        self
    }

    /// Search availability of a label across TLDs, optionally with
    /// site-suggested alternatives bulk-checked for availability
    pub async fn search(
        &self,
        query: &str,
        tlds: &[String],
        with_suggestions: bool,
    ) -> Result<DomainSearchResults> {
        let label = query.split('.').next().unwrap_or(query).to_lowercase();
        let tlds_str = tlds
            .iter()
            .map(|tld| tld.trim_start_matches('.'))
            .collect::<Vec<_>>()
            .join(",");
        let zone_hash = search_hash(&label, ZONE_HASH_SEED);

        tracing::info!(label = %label, tlds = tlds.len(), "searching domain availability");

        let main_results = self
            .zone_names(&label, &zone_hash, &tlds_str)
            .await?;

        let suggested_results = if with_suggestions {
            let names = self.fix_suggestions(&label, &zone_hash, &tlds_str).await?;
            if names.is_empty() {
                Vec::new()
            } else {
                self.verisign_check(&label, &names, &tlds_str).await?
            }
        } else {
            Vec::new()
        };

        Ok(DomainSearchResults {
            query: query.to_string(),
            main_results,
            suggested_results,
        })
    }

    /// Direct TLD variations from the zone-names service
    async fn zone_names(
        &self,
        label: &str,
        hash: &str,
        tlds: &str,
    ) -> Result<Vec<DomainInfo>> {
        let spec = RequestSpec::get(format!("/services/zone-names/{}", label))
            .with_query("hash", hash)
            .with_query("limit", "64")
            .with_query("city", &self.city)
            .with_query("country", &self.country)
            .with_query("tlds", tlds)
            .with_required_token(true);

        let raw = self.dispatcher.execute(&spec).await?;
        let result = normalize::normalize(
            &raw.body,
            raw.content_type.as_deref(),
            PayloadFormat::Json,
            &results_shape("zone-names", "/results"),
        )?;

        let items: Vec<ZoneItem> =
            serde_json::from_value(result.get("results").cloned().unwrap_or_default())?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let (label, tld) = (item.label?, item.tld?);
                Some(DomainInfo {
                    domain: format!("{}.{}", label, tld),
                    is_available: !item.is_registered,
                })
            })
            .collect())
    }

    /// Suggested alternative names from the fix service
    async fn fix_suggestions(
        &self,
        label: &str,
        hash: &str,
        tlds: &str,
    ) -> Result<Vec<String>> {
        let spec = RequestSpec::get(format!("/services/fix/{}", label))
            .with_query("hash", hash)
            .with_query("limit", "32")
            .with_query("city", &self.city)
            .with_query("country", &self.country)
            .with_query("tlds", tlds)
            .with_required_token(true);

        let raw = self.dispatcher.execute(&spec).await?;
        let result = normalize::normalize(
            &raw.body,
            raw.content_type.as_deref(),
            PayloadFormat::Json,
            &results_shape("fix-suggestions", "/results"),
        )?;

        let items: Vec<ZoneItem> =
            serde_json::from_value(result.get("results").cloned().unwrap_or_default())?;
        Ok(items
            .into_iter()
            .filter_map(|item| Some(format!("{}.{}", item.label?, item.tld?)))
            .collect())
    }

    /// Bulk availability check of suggested names
    async fn verisign_check(
        &self,
        label: &str,
        names: &[String],
        tlds: &str,
    ) -> Result<Vec<DomainInfo>> {
        let form = vec![
            ("hash".to_string(), search_hash(label, VERISIGN_HASH_SEED)),
            ("names".to_string(), names.join(",")),
            ("search".to_string(), label.to_string()),
            ("tlds".to_string(), tlds.to_string()),
        ];
        let spec = RequestSpec::post("/services/verisign/check")
            .with_form(form)
            .with_header("Accept", "*/*")
            .with_required_token(true);

        let raw = self.dispatcher.execute(&spec).await?;
        let result = normalize::normalize(
            &raw.body,
            raw.content_type.as_deref(),
            PayloadFormat::Json,
            &results_shape("verisign-check", "/data/results"),
        )?;

        let items: Vec<VerisignItem> =
            serde_json::from_value(result.get("results").cloned().unwrap_or_default())?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                Some(DomainInfo {
                    domain: item.name?,
                    is_available: item.availability.as_deref() == Some("available"),
                })
            })
            .collect())
    }
}

/// Shape shared by the result-array endpoints: one required array member,
/// everything else preserved in extra
fn results_shape(name: &str, pointer: &str) -> Shape {
    Shape::new(name).with_field(
        FieldSpec::new("results", FieldSource::JsonPointer(pointer.to_string())).required(),
    )
}

/// djb2-variant string hash with 32-bit signed wrapping, matching the
/// site's client-side implementation
fn search_hash(input: &str, seed: i32) -> String {
    let mut hash = seed;
    for ch in input.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(ch as u32 as i32);
    }
    hash.to_string()
}

/// The default TLD list as a vector
pub fn default_tlds() -> Vec<String> {
    DEFAULT_TLDS.split(',').map(str::to_string).collect()
}
