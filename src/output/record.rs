use serde::{Deserialize, Serialize};

/// The publishable summary of one successfully processed page
///
/// Field names on the wire follow the result schema consumed downstream,
/// hence the mixed casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source URL of the page
    pub identifier: String,

    /// Host (and port) the page was served from
    pub owner: String,

    /// SHA-256 of the body, hex encoded
    #[serde(rename = "Hash")]
    pub hash: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Author")]
    pub author: String,

    /// `Last-Modified` of the response as RFC 3339, when present and valid
    #[serde(rename = "DateCreated")]
    pub date_created: Option<String>,

    #[serde(rename = "Classification")]
    pub classification: String,

    #[serde(rename = "Language")]
    pub language: String,

    /// Body size in bytes
    pub size: usize,

    #[serde(rename = "MIMEType")]
    pub mime_type: String,

    /// Object store key of the body
    #[serde(rename = "s3_filename")]
    pub storage_key: String,

    /// Distinct external hosts linked from the page
    pub external_domains: Vec<String>,

    /// Distinct internal links found on the page
    pub links: Vec<String>,

    pub keywords: Vec<String>,
}
