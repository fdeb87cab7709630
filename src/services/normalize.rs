//! Lead source labels.
//!
//! Form-driven leads are grouped under the "Website" source type with the
//! specific form as the source. Older rows stored the form name in
//! `source_type`; [`normalize_source`] folds those into the current shape
//! when leads are read.

use crate::models::{Lead, SOURCE_TYPE_WEBSITE};

pub const FORM_SOURCE_NAMES: [&str; 5] = [
    "Brochure Download",
    "Product Profile Download",
    "Talk to Sales",
    "General Inquiry",
    "Request a Demo",
];

/// Source label for submissions of an unrecognised form type.
pub const DEFAULT_FORM_SOURCE: &str = "Website Form";

fn is_form_source(s: Option<&str>) -> bool {
    s.is_some_and(|s| FORM_SOURCE_NAMES.contains(&s))
}

/// Idempotent; only ever touches `source_type` and `source`.
pub fn normalize_source(lead: &mut Lead) {
    if is_form_source(lead.source.as_deref()) {
        if lead.source_type.as_deref() != Some(SOURCE_TYPE_WEBSITE) {
            lead.source_type = Some(SOURCE_TYPE_WEBSITE.to_string());
        }
    } else if is_form_source(lead.source_type.as_deref()) {
        let form_name = lead.source_type.take();
        lead.source_type = Some(SOURCE_TYPE_WEBSITE.to_string());
        let keep_source = matches!(
            lead.source.as_deref(),
            Some(s) if !s.is_empty() && s != SOURCE_TYPE_WEBSITE
        );
        if !keep_source {
            lead.source = form_name;
        }
    }
}

pub fn normalized(mut lead: Lead) -> Lead {
    normalize_source(&mut lead);
    lead
}

/// Map a submission form type to the lead source label.
pub fn source_for_form_type(form_type: &str) -> &'static str {
    match form_type.to_lowercase().replace('-', "_").as_str() {
        "contact" => "General Inquiry",
        "talk_to_sales" | "talk" => "Talk to Sales",
        "brochure" => "Brochure Download",
        "product_profile" => "Product Profile Download",
        "demo" => "Request a Demo",
        _ => DEFAULT_FORM_SOURCE,
    }
}

/// Form types stored under more than one spelling.
pub fn form_type_aliases(form_type: &str) -> Vec<&str> {
    match form_type {
        "product-profile" | "product_profile" => vec!["product-profile", "product_profile"],
        "talk" | "talk_to_sales" => vec!["talk", "talk_to_sales"],
        "general" | "contact" => vec!["general", "contact"],
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lead_with(source_type: Option<&str>, source: Option<&str>) -> Lead {
        let mut lead = Lead::new("N".into(), "n@x.test".into());
        lead.source_type = source_type.map(String::from);
        lead.source = source.map(String::from);
        lead
    }

    #[test]
    fn test_form_source_gets_website_type() {
        let mut lead = lead_with(Some("Referral"), Some("Request a Demo"));
        normalize_source(&mut lead);
        assert_eq!(lead.source_type.as_deref(), Some("Website"));
        assert_eq!(lead.source.as_deref(), Some("Request a Demo"));
    }

    #[test]
    fn test_legacy_form_name_in_source_type() {
        let mut lead = lead_with(Some("Talk to Sales"), Some("Website"));
        normalize_source(&mut lead);
        assert_eq!(lead.source_type.as_deref(), Some("Website"));
        assert_eq!(lead.source.as_deref(), Some("Talk to Sales"));

        let mut lead = lead_with(Some("Talk to Sales"), None);
        normalize_source(&mut lead);
        assert_eq!(lead.source.as_deref(), Some("Talk to Sales"));

        // A specific source survives
        let mut lead = lead_with(Some("Brochure Download"), Some("Trade Show"));
        normalize_source(&mut lead);
        assert_eq!(lead.source_type.as_deref(), Some("Website"));
        assert_eq!(lead.source.as_deref(), Some("Trade Show"));
    }

    #[test]
    fn test_unrelated_sources_untouched() {
        let mut lead = lead_with(Some("Referral"), Some("Partner"));
        normalize_source(&mut lead);
        assert_eq!(lead.source_type.as_deref(), Some("Referral"));
        assert_eq!(lead.source.as_deref(), Some("Partner"));
    }

    #[test]
    fn test_source_for_form_type() {
        assert_eq!(source_for_form_type("contact"), "General Inquiry");
        assert_eq!(source_for_form_type("talk"), "Talk to Sales");
        assert_eq!(source_for_form_type("Talk-To-Sales"), "Talk to Sales");
        assert_eq!(source_for_form_type("product-profile"), "Product Profile Download");
        assert_eq!(source_for_form_type("brochure"), "Brochure Download");
        assert_eq!(source_for_form_type("demo"), "Request a Demo");
        assert_eq!(source_for_form_type("careers"), DEFAULT_FORM_SOURCE);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(form_type_aliases("general"), vec!["general", "contact"]);
        assert_eq!(form_type_aliases("talk_to_sales"), vec!["talk", "talk_to_sales"]);
        assert_eq!(form_type_aliases("demo"), vec!["demo"]);
    }

    fn label() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("Website".to_string())),
            proptest::sample::select(FORM_SOURCE_NAMES.to_vec()).prop_map(|s| Some(s.to_string())),
            "[A-Za-z ]{0,12}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(source_type in label(), source in label()) {
            let mut once = Lead::new("P".into(), "p@x.test".into());
            once.source_type = source_type;
            once.source = source;
            normalize_source(&mut once);

            let mut twice = once.clone();
            normalize_source(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
