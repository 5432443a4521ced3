use serde::{Deserialize, Serialize};

/// Result type requested from the provider. Serialized into the `type` body field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Search,
    News,
    Images,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub q: String,
    pub num: usize,
    #[serde(rename = "type")]
    pub search_type: SearchType,
    pub start: usize,
}

impl SearchRequest {
    pub fn web(q: impl Into<String>, num: usize) -> Self {
        Self {
            q: q.into(),
            num,
            search_type: SearchType::Search,
            start: 0,
        }
    }

    pub fn page(q: impl Into<String>, search_type: SearchType, num: usize, start: usize) -> Self {
        Self {
            q: q.into(),
            num,
            search_type,
            start,
        }
    }
}

/// Every array is optional on the wire; absent sections decode as empty.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic: Vec<Hit>,
    #[serde(default)]
    pub news: Vec<Hit>,
    #[serde(default)]
    pub images: Vec<ImageHit>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Hit {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHit {
    pub title: Option<String>,
    pub image_url: Option<String>,
    /// Web page hosting the image.
    pub link: Option<String>,
    pub source: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
}
