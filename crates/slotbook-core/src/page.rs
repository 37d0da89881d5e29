//! Public scheduling page payload.
//!
//! The bootstrap endpoint returns `{ page, config, services[] }`. The config
//! carries a list of typed sections; only the details form and the service
//! list matter to the booking flow, everything else is ignored.

use serde::{Deserialize, Serialize};

/// The public page a visitor books through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    /// Business timezone (IANA identifier), if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// A bookable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A custom question shown on the details form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomQuestion {
    pub id: String,
    pub label: String,
}

/// Details form settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailsFormSection {
    pub phone_required: bool,
    pub custom_questions: Vec<CustomQuestion>,
}

/// Service list settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceListSection {
    /// Services offered on the page. Empty means all active services.
    pub selected_service_ids: Vec<String>,
}

/// A configured page section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageSection {
    DetailsForm(DetailsFormSection),
    ServiceList(ServiceListSection),
    /// Presentation-only sections.
    #[serde(other)]
    Other,
}

/// Page configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub sections: Vec<PageSection>,
}

impl PageConfig {
    /// Returns the first details form section, if configured.
    pub fn details_form(&self) -> Option<&DetailsFormSection> {
        self.sections.iter().find_map(|section| match section {
            PageSection::DetailsForm(form) => Some(form),
            _ => None,
        })
    }

    /// Returns the first service list section, if configured.
    pub fn service_list(&self) -> Option<&ServiceListSection> {
        self.sections.iter().find_map(|section| match section {
            PageSection::ServiceList(list) => Some(list),
            _ => None,
        })
    }

    /// Whether the details form requires a phone number.
    pub fn phone_required(&self) -> bool {
        self.details_form().is_some_and(|form| form.phone_required)
    }

    /// Custom questions configured on the details form.
    pub fn custom_questions(&self) -> &[CustomQuestion] {
        self.details_form()
            .map(|form| form.custom_questions.as_slice())
            .unwrap_or_default()
    }
}

/// Bootstrap payload for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBundle {
    pub page: Page,
    #[serde(default)]
    pub config: PageConfig,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl PageBundle {
    /// Services a visitor may pick, honouring the service list restriction.
    ///
    /// Backend order is preserved.
    pub fn selectable_services(&self) -> Vec<Service> {
        match self.config.service_list() {
            Some(list) if !list.selected_service_ids.is_empty() => self
                .services
                .iter()
                .filter(|service| list.selected_service_ids.contains(&service.id))
                .cloned()
                .collect(),
            _ => self.services.clone(),
        }
    }
}
