// src/dispatch/mod.rs

//! Splits one job into independent, serially executed invocations.
//!
//! For every input the engine runs one invocation per (encoding, filter
//! kind) combination present in the job. With neither configured there is a
//! single plain invocation.

pub mod encoding;
pub mod filters;

use crate::errors::{Result, ToolrunError};

pub use encoding::Encoding;
pub use filters::{parse_filter_list, Filter, FilterKind, FilterSet};

/// Parameters of one invocation beyond the input itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variant {
    pub filter: Option<Filter>,
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    variants: Vec<Variant>,
}

impl DispatchPlan {
    /// Build the plan. With `filters_required`, a job with no filter kind at
    /// all is rejected before anything runs.
    pub fn build(filters: &FilterSet, filters_required: bool, encodings: &[Encoding]) -> Result<Self> {
        if filters_required && filters.is_empty() {
            return Err(ToolrunError::config(
                "No filters were set. Configure artifact filters or file name/extension/signature filters",
            ));
        }

        let filter_variants: Vec<Option<Filter>> = if filters.is_empty() {
            vec![None]
        } else {
            filters.split_by_kind().into_iter().map(Some).collect()
        };
        let encoding_variants: Vec<Option<Encoding>> = if encodings.is_empty() {
            vec![None]
        } else {
            encodings.iter().copied().map(Some).collect()
        };

        let mut variants = Vec::new();
        for encoding in &encoding_variants {
            for filter in &filter_variants {
                variants.push(Variant {
                    filter: filter.clone(),
                    encoding: *encoding,
                });
            }
        }

        Ok(Self { variants })
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_filters_missing_is_configuration_error() {
        let err = DispatchPlan::build(&FilterSet::default(), true, &[]).unwrap_err();
        assert!(matches!(err, ToolrunError::Configuration(msg) if msg.contains("No filters were set")));
    }

    #[test]
    fn no_filters_no_encodings_is_one_plain_invocation() {
        let plan = DispatchPlan::build(&FilterSet::default(), false, &[]).unwrap();
        assert_eq!(plan.variants(), &[Variant::default()]);
    }

    #[test]
    fn one_invocation_per_kind_and_encoding() {
        let filters = FilterSet {
            artifacts: vec!["A".into()],
            extensions: vec!["exe".into()],
            ..Default::default()
        };
        let plan = DispatchPlan::build(&filters, true, &[Encoding::Ascii, Encoding::Utf16Le]).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.variants()[0].encoding, Some(Encoding::Ascii));
        assert_eq!(plan.variants()[1].filter.as_ref().map(Filter::kind), Some(FilterKind::Files));
    }
}
