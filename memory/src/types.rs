//! # Core Types
//!
//! ## MemoryRole
//!
//! Who produced a stored message.
//!
//! - `User`: incoming message from the conversation partner
//! - `Assistant`: a reply the relay sent back
//!
//! ## ProductMention
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `key` | `String` | Normalized `brand_model1_model2` key |
//! | `brand` | `String` | Brand or product line as written ("iPhone", "Sony") |
//! | `model` | `String` | Model part ("15 Pro"); empty for companies |
//! | `category` | `ProductCategory` | Product family |
//! | `full_name` | `String` | Display name |
//! | `first_mentioned` / `last_mentioned` | `DateTime<Utc>` | Mention times |
//! | `mention_count` | `u32` | Counted mentions plus correction bonus |
//! | `corrected` | `bool` | Superseded by a later correction |
//! | `is_correction` | `bool` | Introduced as a correction |
//! | `color` | `Option<String>` | Color word seen with the mention |
//! | `url` | `Option<String>` | Source URL for company mentions |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryRole {
    User,
    Assistant,
}

/// Product family a rule belongs to. Corrections only cross entries of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Phone,
    Headphones,
    Company,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Phone => "phone",
            ProductCategory::Headphones => "headphones",
            ProductCategory::Company => "company",
        }
    }
}

/// A tracked brand/model reference within one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMention {
    pub key: String,
    pub brand: String,
    pub model: String,
    pub category: ProductCategory,
    pub full_name: String,
    pub first_mentioned: DateTime<Utc>,
    pub last_mentioned: DateTime<Utc>,
    pub mention_count: u32,
    pub corrected: bool,
    pub is_correction: bool,
    pub color: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_role_serialization() {
        let serialized = serde_json::to_string(&MemoryRole::Assistant).unwrap();
        assert_eq!(serialized, "\"Assistant\"");
        let deserialized: MemoryRole = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, MemoryRole::Assistant);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ProductCategory::Phone.as_str(), "phone");
        assert_eq!(ProductCategory::Headphones.as_str(), "headphones");
        assert_eq!(ProductCategory::Company.as_str(), "company");
    }
}
