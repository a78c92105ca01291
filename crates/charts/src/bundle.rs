//! Chart bundle: the finished, immutable hand-off to a rendering surface.

use macro_core::{AlignedSeries, AxisRange, Error, Label, PeriodKey, Result, Values};
use macro_features::BandClassifier;
use serde::Serialize;
use std::collections::BTreeMap;

/// Category axis plus named numeric arrays aligned to it.
///
/// Every series and overlay has exactly `categories.len()` points. `None`
/// points serialize as `null` and are drawn as gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBundle {
    categories: Vec<PeriodKey>,
    series: BTreeMap<String, Values>,
    overlays: BTreeMap<String, Values>,
    axes: BTreeMap<String, AxisRange>,
    classifier: Option<BandClassifier>,
}

impl ChartBundle {
    /// Category axis.
    pub fn categories(&self) -> &[PeriodKey] {
        &self.categories
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// A source series by name.
    pub fn series(&self, name: &str) -> Option<&Values> {
        self.series.get(name)
    }

    /// All source series.
    pub fn all_series(&self) -> &BTreeMap<String, Values> {
        &self.series
    }

    /// A derived overlay by name.
    pub fn overlay(&self, name: &str) -> Option<&Values> {
        self.overlays.get(name)
    }

    /// All derived overlays.
    pub fn overlays(&self) -> &BTreeMap<String, Values> {
        &self.overlays
    }

    /// A value-axis range by axis name.
    pub fn axis(&self, name: &str) -> Option<&AxisRange> {
        self.axes.get(name)
    }

    /// The band classifier, if the chart has one.
    pub fn classifier(&self) -> Option<&BandClassifier> {
        self.classifier.as_ref()
    }

    /// Valuation label of the classified series at a category.
    pub fn label_at(&self, key: &PeriodKey) -> Label {
        let Some(classifier) = &self.classifier else {
            return Label::Unavailable;
        };
        let value = self
            .categories
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.series.get(classifier.series())?.get(i).copied().flatten());
        classifier.classify(value)
    }

    /// Labels for every category, in axis order.
    pub fn labels(&self) -> Vec<Label> {
        match &self.classifier {
            Some(classifier) => match self.series.get(classifier.series()) {
                Some(values) => classifier.classify_all(values),
                None => vec![Label::Unavailable; self.len()],
            },
            None => vec![Label::Unavailable; self.len()],
        }
    }
}

/// Assembles a [`ChartBundle`], checking every array against the axis.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    categories: Vec<PeriodKey>,
    series: BTreeMap<String, Values>,
    overlays: BTreeMap<String, Values>,
    axes: BTreeMap<String, AxisRange>,
    classifier: Option<BandClassifier>,
}

impl BundleBuilder {
    /// Start a bundle on a category axis.
    pub fn new(categories: Vec<PeriodKey>) -> Self {
        Self {
            categories,
            series: BTreeMap::new(),
            overlays: BTreeMap::new(),
            axes: BTreeMap::new(),
            classifier: None,
        }
    }

    /// Start from aligned series, taking over the axis and every series.
    pub fn from_aligned(aligned: AlignedSeries) -> Result<Self> {
        let mut builder = Self::new(aligned.categories);
        for (name, values) in aligned.series {
            builder = builder.series(name, values)?;
        }
        Ok(builder)
    }

    fn check(&self, name: &str, values: &Values) -> Result<()> {
        if values.len() != self.categories.len() {
            return Err(Error::length_mismatch(name, self.categories.len(), values.len()));
        }
        Ok(())
    }

    /// Add a source series.
    pub fn series(mut self, name: impl Into<String>, values: Values) -> Result<Self> {
        let name = name.into();
        self.check(&name, &values)?;
        self.series.insert(name, values);
        Ok(self)
    }

    /// Add a derived overlay.
    pub fn overlay(mut self, name: impl Into<String>, values: Values) -> Result<Self> {
        let name = name.into();
        self.check(&name, &values)?;
        self.overlays.insert(name, values);
        Ok(self)
    }

    /// Set a value-axis range.
    pub fn axis(mut self, name: impl Into<String>, range: AxisRange) -> Self {
        self.axes.insert(name.into(), range);
        self
    }

    /// Attach a classifier. Its series must already be in the bundle.
    pub fn classifier(mut self, classifier: BandClassifier) -> Result<Self> {
        if !self.series.contains_key(classifier.series()) {
            return Err(Error::data(format!(
                "classifier refers to unknown series '{}'",
                classifier.series()
            )));
        }
        self.classifier = Some(classifier);
        Ok(self)
    }

    /// Borrow a series added so far.
    pub fn get_series(&self, name: &str) -> Option<&Values> {
        self.series.get(name)
    }

    /// Remove a series, e.g. an input only needed to derive another.
    pub fn take_series(&mut self, name: &str) -> Option<Values> {
        self.series.remove(name)
    }

    /// Finish the bundle.
    pub fn build(self) -> ChartBundle {
        ChartBundle {
            categories: self.categories,
            series: self.series,
            overlays: self.overlays,
            axes: self.axes,
            classifier: self.classifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_core::StatSummary;

    fn keys(ks: &[&str]) -> Vec<PeriodKey> {
        ks.iter().map(|k| PeriodKey::new(*k)).collect()
    }

    #[test]
    fn test_build_bundle() {
        let bundle = BundleBuilder::new(keys(&["2020-01", "2020-02"]))
            .series("cpi", vec![Some(1.0), None])
            .unwrap()
            .overlay("diff", vec![None, Some(0.5)])
            .unwrap()
            .axis("left", AxisRange { min: -2.0, max: 2.0 })
            .build();

        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.series("cpi"), Some(&vec![Some(1.0), None]));
        assert_eq!(bundle.overlay("diff"), Some(&vec![None, Some(0.5)]));
        assert_eq!(bundle.axis("left").unwrap().max, 2.0);
        assert!(bundle.classifier().is_none());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = BundleBuilder::new(keys(&["2020-01"]))
            .series("cpi", vec![Some(1.0), Some(2.0)])
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 1, actual: 2, .. }));

        let err = BundleBuilder::new(keys(&["2020-01"]))
            .overlay("diff", vec![])
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_classifier_requires_series() {
        let classifier = BandClassifier::new("premium", StatSummary { mean: 0.0, std: 1.0 });
        assert!(BundleBuilder::new(keys(&["2020-01-02"]))
            .classifier(classifier)
            .is_err());
    }

    #[test]
    fn test_label_at() {
        let stats = StatSummary { mean: 0.0, std: 1.0 };
        let bundle = BundleBuilder::new(keys(&["2020-01-02", "2020-01-03", "2020-01-06"]))
            .series("premium", vec![Some(2.5), None, Some(-0.5)])
            .unwrap()
            .classifier(BandClassifier::new("premium", stats))
            .unwrap()
            .build();

        assert_eq!(bundle.label_at(&PeriodKey::new("2020-01-02")), Label::ExtremelyLow);
        assert_eq!(bundle.label_at(&PeriodKey::new("2020-01-03")), Label::Unavailable);
        assert_eq!(bundle.label_at(&PeriodKey::new("2020-01-06")), Label::MidHigh);
        assert_eq!(bundle.label_at(&PeriodKey::new("2021-01-01")), Label::Unavailable);
        assert_eq!(
            bundle.labels(),
            vec![Label::ExtremelyLow, Label::Unavailable, Label::MidHigh]
        );
    }

    #[test]
    fn test_no_classifier_labels() {
        let bundle = BundleBuilder::new(keys(&["2020-01"])).build();
        assert_eq!(bundle.label_at(&PeriodKey::new("2020-01")), Label::Unavailable);
        assert_eq!(bundle.labels(), vec![Label::Unavailable]);
    }

    #[test]
    fn test_from_aligned_and_serialize() {
        let mut aligned = AlignedSeries::empty();
        aligned.categories = keys(&["2020-01", "2020-02"]);
        aligned.series.insert("m1".to_string(), vec![Some(1.5), None]);

        let mut builder = BundleBuilder::from_aligned(aligned).unwrap();
        assert_eq!(builder.get_series("m1"), Some(&vec![Some(1.5), None]));
        let m1 = builder.take_series("m1").unwrap();
        let bundle = builder.series("m1_renamed", m1).unwrap().build();

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["categories"], serde_json::json!(["2020-01", "2020-02"]));
        assert_eq!(json["series"]["m1_renamed"], serde_json::json!([1.5, null]));
        assert!(json["classifier"].is_null());
    }
}
