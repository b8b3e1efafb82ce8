//! Translation machinery: provenance sets, the generic walker, merging and
//! line correlation
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod correlate;
pub mod generic;
pub mod merge;
pub mod set;

pub use correlate::{correlate_markers, translate_report_paths};
pub use generic::{GenericTranslator, Override};
pub use merge::merge_translated;
pub use set::{Translation, TranslationSet};

use crate::report::Report;

/// A translated value with its provenance and diagnostics
#[derive(Debug, Clone)]
pub struct Translated<T> {
    pub value: T,
    pub translations: TranslationSet,
    pub report: Report,
}

impl<T> Translated<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            translations: TranslationSet::default(),
            report: Report::new(),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Translated<U> {
        Translated {
            value: f(self.value),
            translations: self.translations,
            report: self.report,
        }
    }
}
