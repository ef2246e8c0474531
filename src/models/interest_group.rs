// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest groups and their WhatsApp invite links.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Required prefix of a WhatsApp group invite link.
pub const WHATSAPP_LINK_PREFIX: &str = "https://chat.whatsapp.com/";

/// Interest group as returned by `/interest-groups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestGroup {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub whatsapp_link: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timing: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /interest-groups` and `PUT /interest-groups/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct InterestGroupInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_whatsapp_link"))]
    pub whatsapp_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
}

/// `https://chat.whatsapp.com/` followed by a non-empty alphanumeric code.
pub fn is_valid_whatsapp_link(link: &str) -> bool {
    link.strip_prefix(WHATSAPP_LINK_PREFIX)
        .is_some_and(|code| !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn validate_whatsapp_link(link: &str) -> Result<(), ValidationError> {
    if is_valid_whatsapp_link(link) {
        Ok(())
    } else {
        let mut err = ValidationError::new("whatsapp_link");
        err.message = Some(
            format!("WhatsApp link must start with \"{WHATSAPP_LINK_PREFIX}\"").into(),
        );
        Err(err)
    }
}

/// Selectable interest group category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category { value: "Health", label: "Health & Wellness", icon: "heart" },
    Category { value: "Arts", label: "Arts & Crafts", icon: "palette" },
    Category { value: "Technology", label: "Technology", icon: "laptop" },
    Category { value: "Education", label: "Education & Learning", icon: "book" },
    Category { value: "Social", label: "Social Activities", icon: "people" },
    Category { value: "Sports", label: "Sports & Fitness", icon: "trophy" },
    Category { value: "Hobby", label: "Hobbies & Interests", icon: "star" },
    Category { value: "Other", label: "Other", icon: "circle" },
];

/// Display icon for a category; unknown categories get the generic one.
pub fn category_icon(category: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|c| c.value == category)
        .map(|c| c.icon)
        .unwrap_or("circle")
}
