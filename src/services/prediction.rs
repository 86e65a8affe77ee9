// src/services/prediction.rs
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{DashboardError, Result};
use crate::services::display::format_price;

/// Feature names in the order the model was trained on.
pub const FEATURES: [&str; 9] = [
    "accommodates",
    "bedrooms",
    "minimum_nights",
    "maximum_nights",
    "review_scores_rating",
    "review_scores_cleanliness",
    "review_scores_location",
    "host_total_listings_count",
    "host_response_rate",
];

/// Single-row model input, as entered on the prediction page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub accommodates: u32,
    pub bedrooms: u32,
    pub minimum_nights: u32,
    pub maximum_nights: u32,
    pub review_scores_rating: u32,
    pub review_scores_cleanliness: u32,
    pub review_scores_location: u32,
    pub host_total_listings_count: u32,
    pub host_response_rate: f64,
}

impl PredictionInput {
    pub fn features(&self) -> [(&'static str, f64); 9] {
        [
            (FEATURES[0], f64::from(self.accommodates)),
            (FEATURES[1], f64::from(self.bedrooms)),
            (FEATURES[2], f64::from(self.minimum_nights)),
            (FEATURES[3], f64::from(self.maximum_nights)),
            (FEATURES[4], f64::from(self.review_scores_rating)),
            (FEATURES[5], f64::from(self.review_scores_cleanliness)),
            (FEATURES[6], f64::from(self.review_scores_location)),
            (FEATURES[7], f64::from(self.host_total_listings_count)),
            (FEATURES[8], self.host_response_rate),
        ]
    }

    /// Checks the same bounds the input widgets enforce.
    pub fn validate(&self) -> Result<()> {
        if self.minimum_nights > self.maximum_nights {
            return Err(DashboardError::InvalidInput(
                "minimum_nights cannot be greater than maximum_nights".to_string(),
            ));
        }

        let ranges: [(&str, f64, f64, f64); 9] = [
            (FEATURES[0], f64::from(self.accommodates), 1.0, 10.0),
            (FEATURES[1], f64::from(self.bedrooms), 1.0, 10.0),
            (FEATURES[2], f64::from(self.minimum_nights), 1.0, 30.0),
            (FEATURES[3], f64::from(self.maximum_nights), 1.0, 100.0),
            (FEATURES[4], f64::from(self.review_scores_rating), 1.0, 100.0),
            (FEATURES[5], f64::from(self.review_scores_cleanliness), 1.0, 10.0),
            (FEATURES[6], f64::from(self.review_scores_location), 1.0, 10.0),
            (FEATURES[7], f64::from(self.host_total_listings_count), 1.0, 100.0),
            (FEATURES[8], self.host_response_rate, f64::MIN_POSITIVE, 1.0),
        ];
        for (name, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                return Err(DashboardError::InvalidInput(format!(
                    "{} must be greater than 0 and at most {}, got {}",
                    name, max, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: &'static str,
    pub value: f64,
    pub contribution: f64,
}

/// Additive breakdown of a prediction: `expected_value` plus every
/// contribution equals the predicted price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub expected_value: f64,
    pub contributions: Vec<FeatureContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub price: f64,
    pub formatted: String,
    pub explanation: Explanation,
}

/// A trained price model. The service only runs inference.
pub trait PriceModel: Send + Sync {
    fn predict(&self, input: &PredictionInput) -> Result<f64>;

    fn explain(&self, input: &PredictionInput) -> Result<Explanation>;
}

/// Validates `input`, then predicts and explains it.
pub fn predict_price(model: &dyn PriceModel, input: &PredictionInput) -> Result<Prediction> {
    input.validate()?;
    let price = model.predict(input)?;
    let explanation = model.explain(input)?;
    info!("Predicted price {:.2} for {:?}", price, input);
    Ok(Prediction {
        price,
        formatted: format_price(price),
        explanation,
    })
}

/// Linear regression exported as JSON:
/// `{"intercept": .., "coefficients": {feature: weight}, "feature_means": {..}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearPriceModel {
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub feature_means: BTreeMap<String, f64>,
}

impl LinearPriceModel {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading price model from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let model: LinearPriceModel = serde_json::from_str(text)?;
        model.check()?;
        debug!("Price model has {} coefficients", model.coefficients.len());
        Ok(model)
    }

    fn check(&self) -> Result<()> {
        if let Some(missing) = FEATURES.iter().find(|f| !self.coefficients.contains_key(**f)) {
            return Err(DashboardError::Model(format!("no coefficient for {}", missing)));
        }
        if let Some(unknown) = self
            .coefficients
            .keys()
            .chain(self.feature_means.keys())
            .find(|k| !FEATURES.contains(&k.as_str()))
        {
            return Err(DashboardError::Model(format!("unknown feature {}", unknown)));
        }
        Ok(())
    }

    fn weight(&self, feature: &str) -> f64 {
        self.coefficients.get(feature).copied().unwrap_or(0.0)
    }

    fn baseline(&self, feature: &str) -> f64 {
        self.feature_means.get(feature).copied().unwrap_or(0.0)
    }
}

impl PriceModel for LinearPriceModel {
    fn predict(&self, input: &PredictionInput) -> Result<f64> {
        let price = input
            .features()
            .iter()
            .fold(self.intercept, |acc, (name, value)| acc + self.weight(name) * value);
        if price.is_finite() {
            Ok(price)
        } else {
            Err(DashboardError::Model("prediction is not a finite number".to_string()))
        }
    }

    fn explain(&self, input: &PredictionInput) -> Result<Explanation> {
        let expected_value = FEATURES
            .iter()
            .fold(self.intercept, |acc, f| acc + self.weight(f) * self.baseline(f));

        let mut contributions: Vec<FeatureContribution> = input
            .features()
            .iter()
            .map(|&(feature, value)| FeatureContribution {
                feature,
                value,
                contribution: self.weight(feature) * (value - self.baseline(feature)),
            })
            .collect();
        contributions.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

        Ok(Explanation {
            expected_value,
            contributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "intercept": 20.0,
        "coefficients": {
            "accommodates": 15.0,
            "bedrooms": 25.0,
            "minimum_nights": -1.0,
            "maximum_nights": 0.1,
            "review_scores_rating": 0.5,
            "review_scores_cleanliness": 2.0,
            "review_scores_location": 3.0,
            "host_total_listings_count": 0.2,
            "host_response_rate": 10.0
        },
        "feature_means": {"accommodates": 3.0, "bedrooms": 1.5}
    }"#;

    fn input() -> PredictionInput {
        PredictionInput {
            accommodates: 2,
            bedrooms: 1,
            minimum_nights: 2,
            maximum_nights: 30,
            review_scores_rating: 90,
            review_scores_cleanliness: 9,
            review_scores_location: 10,
            host_total_listings_count: 1,
            host_response_rate: 1.0,
        }
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearPriceModel::from_json(MODEL).unwrap();
        let price = model.predict(&input()).unwrap();
        // 20 + 30 + 25 - 2 + 3 + 45 + 18 + 30 + 0.2 + 10
        assert!((price - 179.2).abs() < 1e-9);
    }

    #[test]
    fn test_explanation_adds_up() {
        let model = LinearPriceModel::from_json(MODEL).unwrap();
        let price = model.predict(&input()).unwrap();
        let explanation = model.explain(&input()).unwrap();
        let total: f64 = explanation.expected_value
            + explanation.contributions.iter().map(|c| c.contribution).sum::<f64>();
        assert!((total - price).abs() < 1e-9);
        assert_eq!(explanation.contributions.len(), 9);
    }

    #[test]
    fn test_validation_rejects_bad_nights() {
        let mut bad = input();
        bad.minimum_nights = 10;
        bad.maximum_nights = 5;
        assert!(matches!(bad.validate(), Err(DashboardError::InvalidInput(_))));

        let mut zero = input();
        zero.host_response_rate = 0.0;
        assert!(zero.validate().is_err());

        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_model_requires_every_feature() {
        let result = LinearPriceModel::from_json(r#"{"intercept": 1.0, "coefficients": {"bedrooms": 2.0}}"#);
        assert!(matches!(result, Err(DashboardError::Model(_))));
    }

    #[test]
    fn test_predict_price_formats() {
        let model = LinearPriceModel::from_json(MODEL).unwrap();
        let prediction = predict_price(&model, &input()).unwrap();
        assert_eq!(prediction.formatted, "$179.20");
    }
}
