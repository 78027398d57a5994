//! Tenant and client records.

use crate::error::IdentityError;
use crate::store::Document;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Length of tenant and client identifiers in bytes, before encoding.
pub const ID_LEN: usize = 8;

/// Random identifier, base64url-encoded without padding.
pub(crate) fn random_id() -> String {
    let mut buf = [0u8; ID_LEN];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// A tenant identifier: 8 bytes, base64url-encoded in records and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantId([u8; ID_LEN]);

impl TenantId {
    pub fn generate() -> Self {
        let mut buf = [0u8; ID_LEN];
        rand::rng().fill_bytes(&mut buf);
        Self(buf)
    }

    /// Parse the encoded form, rejecting anything that is not exactly
    /// 8 bytes of base64url.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|_| IdentityError::InvalidTenantId(s.to_string()))?;
        let raw: [u8; ID_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidTenantId(s.to_string()))?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl FromStr for TenantId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A billing and isolation boundary grouping clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: String,
    pub description: String,
}

impl Tenant {
    pub(crate) fn to_document(&self) -> Document {
        Document::from([
            ("id".to_string(), self.id.clone()),
            ("description".to_string(), self.description.clone()),
        ])
    }

    pub(crate) fn from_document(doc: &Document) -> Result<Self, IdentityError> {
        Ok(Self {
            id: field(doc, "tenant", "id")?,
            description: field(doc, "tenant", "description")?,
        })
    }
}

/// A machine identity belonging to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: String,
    pub tenant_id: String,
    pub description: String,

    /// Stored secret hash; only present under the hashed credential scheme.
    #[serde(skip)]
    pub secret_hash: Option<String>,

    /// Plaintext secret, only populated on the record returned at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_secret: Option<String>,
}

impl Client {
    pub(crate) fn to_document(&self) -> Document {
        let mut doc = Document::from([
            ("id".to_string(), self.id.clone()),
            ("tenant".to_string(), self.tenant_id.clone()),
            ("description".to_string(), self.description.clone()),
        ]);
        if let Some(hash) = &self.secret_hash {
            doc.insert("secret".to_string(), hash.clone());
        }
        doc
    }

    pub(crate) fn from_document(doc: &Document) -> Result<Self, IdentityError> {
        Ok(Self {
            id: field(doc, "client", "id")?,
            tenant_id: field(doc, "client", "tenant")?,
            description: field(doc, "client", "description")?,
            secret_hash: doc.get("secret").cloned(),
            plain_secret: None,
        })
    }
}

fn field(doc: &Document, record: &str, name: &str) -> Result<String, IdentityError> {
    doc.get(name)
        .cloned()
        .ok_or_else(|| IdentityError::CorruptRecord(format!("{record} record has no {name}")))
}
