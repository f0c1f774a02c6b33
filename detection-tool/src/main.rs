use anyhow::{Context, Result};
use bbox::Pascal;
use clap::Parser;
use detection::{metrics::MeanApInit, Config};
use label::{Detections, Label, LabeledBoxSet};
use prettytable::{cell, row, Table};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Load a configuration file and print the resolved settings.
    CheckConfig {
        /// configuration file
        config_file: PathBuf,
    },
    /// Compute mAP over a JSON file of predictions and ground truth.
    Evaluate {
        /// configuration file
        #[clap(long)]
        config: Option<PathBuf>,
        /// input JSON file
        input_file: PathBuf,
    },
}

/// One image of the evaluation input.
#[derive(Debug, Clone, Deserialize)]
struct ImageRecord {
    #[serde(default)]
    predictions: Vec<PredictionRecord>,
    #[serde(default)]
    ground_truth: Vec<GroundTruthRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictionRecord {
    /// `[x0, y0, x1, y1]` in pixels
    #[serde(rename = "box")]
    rect: [f64; 4],
    class: usize,
    confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GroundTruthRecord {
    /// `[x0, y0, x1, y1]` in pixels
    #[serde(rename = "box")]
    rect: [f64; 4],
    class: usize,
}

fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::CheckConfig { config_file } => {
            check_config(config_file)?;
        }
        Opts::Evaluate { config, input_file } => {
            evaluate(config.as_deref(), input_file)?;
        }
    }

    Ok(())
}

fn load_config(config_file: &Path) -> Result<Config> {
    Config::open(config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))
}

fn check_config(config_file: impl AsRef<Path>) -> Result<()> {
    let config = load_config(config_file.as_ref())?;

    let encoder = config.heatmap_init();
    let decoder = config.decoder_init();
    let matcher = config.matcher_init();
    let criterion = config.set_criterion_init();
    let focal_loss = config.focal_loss_init();
    let evaluation = config.mean_ap_init();

    let mut table = Table::new();
    table.add_row(row!["component", "setting", "value"]);
    table.add_row(row!["heatmap", "num_classes", encoder.num_classes]);
    table.add_row(row!["heatmap", "kernel_sigma", encoder.sigma]);
    table.add_row(row!["heatmap", "gaussian_mode", format!("{:?}", encoder.mode)]);
    table.add_row(row![
        "heatmap",
        "regression_kind",
        format!("{:?}", encoder.regression_kind)
    ]);
    table.add_row(row![
        "decoder",
        "confidence_threshold",
        decoder.confidence_threshold
    ]);
    table.add_row(row!["decoder", "kernel_size", decoder.kernel_size]);
    table.add_row(row!["matcher", "class_weight", matcher.class_weight]);
    table.add_row(row!["matcher", "box_weight", matcher.box_weight]);
    table.add_row(row!["matcher", "giou_weight", matcher.giou_weight]);
    table.add_row(row![
        "criterion",
        "no_object_weight",
        criterion.no_object_weight
    ]);
    table.add_row(row![
        "criterion",
        "giou_loss_weight",
        format!("{:?}", criterion.giou_loss_weight)
    ]);
    table.add_row(row!["focal_loss", "alpha", focal_loss.alpha]);
    table.add_row(row!["focal_loss", "beta", focal_loss.beta]);
    table.add_row(row!["evaluation", "iou_threshold", evaluation.iou_threshold]);
    table.add_row(row![
        "evaluation",
        "integral_method",
        format!("{:?}", evaluation.integral_method)
    ]);

    // every component must accept the settings
    encoder.build().context("invalid heatmap settings")?;
    decoder.build().context("invalid decoder settings")?;
    matcher.build().context("invalid matcher settings")?;
    criterion.build().context("invalid criterion settings")?;
    focal_loss.build().context("invalid focal loss settings")?;
    evaluation.build().context("invalid evaluation settings")?;

    table.printstd();
    info!("configuration '{}' is valid", config_file.as_ref().display());
    Ok(())
}

fn evaluate(config_file: Option<&Path>, input_file: impl AsRef<Path>) -> Result<()> {
    let input_file = input_file.as_ref();
    let text = fs::read_to_string(input_file)
        .with_context(|| format!("failed to read '{}'", input_file.display()))?;
    let records: Vec<ImageRecord> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse '{}'", input_file.display()))?;
    let images = records
        .iter()
        .map(ImageRecord::to_labels)
        .collect::<Result<Vec<_>>>()?;

    let init = match config_file {
        Some(config_file) => load_config(config_file)?.mean_ap_init(),
        None => {
            // take the class count from the data
            let num_classes = records
                .iter()
                .flat_map(|record| {
                    let pred_classes = record.predictions.iter().map(|pred| pred.class);
                    let gt_classes = record.ground_truth.iter().map(|gt| gt.class);
                    pred_classes.chain(gt_classes)
                })
                .max()
                .map_or(1, |class| class + 1);
            MeanApInit::new(num_classes)
        }
    };

    let mut evaluator = init.build()?;
    evaluator.add_batch(&images)?;
    let output = evaluator.compute();

    let mut table = Table::new();
    table.add_row(row!["class", "AP"]);
    output.per_class.iter().for_each(|(class, ap)| {
        table.add_row(row![class, format!("{:.4}", ap)]);
    });
    table.add_row(row!["mAP", format!("{:.4}", output.mean_ap)]);
    table.printstd();

    Ok(())
}

impl ImageRecord {
    fn to_labels(&self) -> Result<(Detections<Pascal<f64>>, LabeledBoxSet<Pascal<f64>>)> {
        let boxes = self
            .predictions
            .iter()
            .map(|pred| Pascal::try_from_xyxy(pred.rect))
            .collect::<Result<Vec<_>>>()?;
        let labels = self.predictions.iter().map(|pred| pred.class).collect();
        let confidences = self
            .predictions
            .iter()
            .map(|pred| pred.confidence)
            .collect();
        let predictions = Detections::try_new(boxes.into(), labels, confidences)?;

        let ground_truth = self
            .ground_truth
            .iter()
            .map(|gt| -> Result<_> {
                Ok(Label {
                    rect: Pascal::try_from_xyxy(gt.rect)?,
                    class: gt.class,
                })
            })
            .collect::<Result<LabeledBoxSet<_>>>()?;

        Ok((predictions, ground_truth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_image_records() {
        let text = r#"[
            {
                "predictions": [
                    { "box": [0, 0, 10, 10], "class": 1, "confidence": 0.9 }
                ],
                "ground_truth": [
                    { "box": [0, 0, 10, 10], "class": 1 },
                    { "box": [20, 20, 30, 30], "class": 0 }
                ]
            },
            { "ground_truth": [] }
        ]"#;
        let records: Vec<ImageRecord> = serde_json::from_str(text).unwrap();
        assert_eq!(records.len(), 2);

        let (predictions, ground_truth) = records[0].to_labels().unwrap();
        assert_eq!(predictions.labels(), &[1]);
        assert_eq!(predictions.confidences(), &[0.9]);
        assert_eq!(ground_truth.labels(), &[1, 0]);

        let (predictions, ground_truth) = records[1].to_labels().unwrap();
        assert!(predictions.is_empty());
        assert!(ground_truth.is_empty());
    }

    #[test]
    fn reject_inverted_box() {
        let text = r#"[{ "ground_truth": [{ "box": [10, 0, 0, 10], "class": 0 }] }]"#;
        let records: Vec<ImageRecord> = serde_json::from_str(text).unwrap();
        assert!(records[0].to_labels().is_err());
    }
}
