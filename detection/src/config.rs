//! The JSON5 configuration of the detection components.

use crate::{
    common::*,
    heatmap::{GaussianMode, HeatmapDecoderInit, HeatmapEncoderInit, RegressionKind},
    loss::{FocalLossInit, SetCriterionInit},
    matcher::HungarianMatcherInit,
    metrics::{IntegralMethod, MeanApInit},
};

/// The configuration file. Unset options fall back to component defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The number of object classes, excluding no-object.
    pub num_classes: usize,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub criterion: CriterionConfig,
    #[serde(default)]
    pub focal_loss: FocalLossConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    pub fn heatmap_init(&self) -> HeatmapEncoderInit {
        let HeatmapConfig {
            kernel_sigma,
            gaussian_mode,
            regression_kind,
        } = self.heatmap;

        let mut init = HeatmapEncoderInit::new(self.num_classes);
        if let Some(sigma) = kernel_sigma {
            init.sigma = sigma.raw();
        }
        if let Some(mode) = gaussian_mode {
            init.mode = mode;
        }
        if let Some(kind) = regression_kind {
            init.regression_kind = kind;
        }
        init
    }

    pub fn decoder_init(&self) -> HeatmapDecoderInit {
        let DecoderConfig {
            confidence_threshold,
            kernel_size,
        } = self.decoder;
        let default = HeatmapDecoderInit::default();

        HeatmapDecoderInit {
            confidence_threshold: confidence_threshold
                .map(R64::raw)
                .unwrap_or(default.confidence_threshold),
            kernel_size: kernel_size.unwrap_or(default.kernel_size),
        }
    }

    pub fn matcher_init(&self) -> HungarianMatcherInit {
        let MatcherConfig {
            class_weight,
            box_weight,
            giou_weight,
        } = self.matcher;
        let default = HungarianMatcherInit::default();

        HungarianMatcherInit {
            class_weight: class_weight.map(R64::raw).unwrap_or(default.class_weight),
            box_weight: box_weight.map(R64::raw).unwrap_or(default.box_weight),
            giou_weight: giou_weight.map(R64::raw).unwrap_or(default.giou_weight),
        }
    }

    pub fn set_criterion_init(&self) -> SetCriterionInit {
        let CriterionConfig {
            no_object_weight,
            giou_loss_weight,
        } = self.criterion;

        let mut init = SetCriterionInit {
            matcher: self.matcher_init(),
            ..SetCriterionInit::new(self.num_classes)
        };
        if let Some(weight) = no_object_weight {
            init.no_object_weight = weight.raw();
        }
        init.giou_loss_weight = giou_loss_weight.map(R64::raw);
        init
    }

    pub fn focal_loss_init(&self) -> FocalLossInit {
        let FocalLossConfig { alpha, beta } = self.focal_loss;
        let default = FocalLossInit::default();

        FocalLossInit {
            alpha: alpha.map(R64::raw).unwrap_or(default.alpha),
            beta: beta.map(R64::raw).unwrap_or(default.beta),
        }
    }

    pub fn mean_ap_init(&self) -> MeanApInit {
        let EvaluationConfig {
            iou_threshold,
            integral_method,
        } = self.evaluation;

        let mut init = MeanApInit::new(self.num_classes);
        if let Some(threshold) = iou_threshold {
            init.iou_threshold = threshold.raw();
        }
        if let Some(method) = integral_method {
            init.integral_method = method;
        }
        init
    }
}

/// Heatmap target synthesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// The Gaussian spread in cells.
    pub kernel_sigma: Option<R64>,
    pub gaussian_mode: Option<GaussianMode>,
    pub regression_kind: Option<RegressionKind>,
}

/// Peak extraction from predicted heatmaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub confidence_threshold: Option<R64>,
    /// The odd side length of the local maximum window.
    pub kernel_size: Option<usize>,
}

/// The cost weights of bipartite matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub class_weight: Option<R64>,
    pub box_weight: Option<R64>,
    pub giou_weight: Option<R64>,
}

/// The set prediction loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub no_object_weight: Option<R64>,
    /// The weight of the generalized IoU term. The term is disabled if unset.
    pub giou_loss_weight: Option<R64>,
}

/// The heatmap focal loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FocalLossConfig {
    pub alpha: Option<R64>,
    pub beta: Option<R64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub iou_threshold: Option<R64>,
    pub integral_method: Option<IntegralMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_survives_json_export() -> Result<()> {
        let config: Config = json5::from_str(
            r#"{
                num_classes: 4,
                heatmap: { kernel_sigma: 1.5, gaussian_mode: "aspect" },
                evaluation: { iou_threshold: 0.3, integral_method: { interpolation: 101 } },
            }"#,
        )?;

        let text = serde_json::to_string(&config)?;
        let restored: Config = serde_json::from_str(&text)?;
        assert_eq!(restored, config);

        let reloaded: Config = json5::from_str(&text)?;
        assert_eq!(reloaded, config);
        assert_eq!(
            reloaded.mean_ap_init().integral_method,
            IntegralMethod::Interpolation(101)
        );
        Ok(())
    }

    #[test]
    fn minimal_config_uses_defaults() -> Result<()> {
        let config: Config = json5::from_str("{ num_classes: 3 }")?;

        let encoder = config.heatmap_init();
        assert_eq!(encoder.sigma, 2.0);
        assert_eq!(encoder.mode, GaussianMode::Fixed);
        assert_eq!(encoder.regression_kind, RegressionKind::OffsetSize);

        let decoder = config.decoder_init();
        assert_eq!(decoder.confidence_threshold, 0.3);
        assert_eq!(decoder.kernel_size, 3);

        let criterion = config.set_criterion_init();
        assert_eq!(criterion.no_object_weight, 1.0);
        assert_eq!(criterion.giou_loss_weight, None);
        assert_eq!(criterion.matcher, HungarianMatcherInit::default());

        assert_eq!(config.focal_loss_init(), FocalLossInit::default());

        let evaluation = config.mean_ap_init();
        assert_eq!(evaluation.iou_threshold, 0.5);
        assert_eq!(evaluation.integral_method, IntegralMethod::Continuous);

        config.heatmap_init().build()?;
        config.decoder_init().build()?;
        config.set_criterion_init().build()?;
        config.focal_loss_init().build()?;
        config.mean_ap_init().build()?;
        Ok(())
    }

    #[test]
    fn full_config_overrides_defaults() -> Result<()> {
        let text = r#"
        {
            // CenterNet style targets
            num_classes: 2,
            heatmap: {
                kernel_sigma: 1.0,
                gaussian_mode: "aspect",
                regression_kind: "size",
            },
            decoder: { confidence_threshold: 0.1, kernel_size: 5 },
            matcher: { class_weight: 1.0, box_weight: 5.0, giou_weight: 2.0 },
            criterion: { no_object_weight: 0.1, giou_loss_weight: 2.0 },
            focal_loss: { alpha: 2.0, beta: 2.0 },
            evaluation: {
                iou_threshold: 0.3,
                integral_method: { interpolation: 101 },
            },
        }
        "#;
        let config: Config = json5::from_str(text)?;

        let encoder = config.heatmap_init();
        assert_eq!(encoder.mode, GaussianMode::Aspect);
        assert_eq!(encoder.regression_kind, RegressionKind::Size);
        assert_eq!(config.decoder_init().kernel_size, 5);

        let criterion = config.set_criterion_init();
        assert_eq!(criterion.matcher.box_weight, 5.0);
        assert_eq!(criterion.giou_loss_weight, Some(2.0));
        assert_eq!(
            config.mean_ap_init().integral_method,
            IntegralMethod::Interpolation(101)
        );
        Ok(())
    }

    #[test]
    fn missing_class_count_is_an_error() {
        assert!(json5::from_str::<Config>("{ heatmap: {} }").is_err());
    }
}
