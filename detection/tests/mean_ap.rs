use anyhow::Result;
use approx::assert_abs_diff_eq;
use bbox::Pascal;
use detection::metrics::{IntegralMethod, MeanApInit};
use label::{Detections, Label, LabeledBoxSet, ScoredLabel};

fn detections(items: &[([f64; 4], usize, f64)]) -> Detections<Pascal<f64>> {
    Detections::try_from_iter(items.iter().map(|&(xyxy, class, confidence)| ScoredLabel {
        rect: Pascal::from_xyxy(xyxy),
        class,
        confidence,
    }))
    .unwrap()
}

fn ground_truth(items: &[([f64; 4], usize)]) -> LabeledBoxSet<Pascal<f64>> {
    items
        .iter()
        .map(|&(xyxy, class)| Label {
            rect: Pascal::from_xyxy(xyxy),
            class,
        })
        .collect()
}

#[test]
fn reference_scenario() -> Result<()> {
    let predictions = detections(&[
        ([15.0, 15.0, 25.0, 25.0], 0, 0.9),
        ([0.0, 0.0, 15.0, 15.0], 0, 0.8),
        ([25.0, 25.0, 35.0, 35.0], 1, 0.7),
    ]);
    let targets = ground_truth(&[([0.0, 0.0, 10.0, 10.0], 0), ([20.0, 20.0, 30.0, 30.0], 0)]);

    let mut evaluator = MeanApInit {
        iou_threshold: 0.3,
        ..MeanApInit::new(2)
    }
    .build()?;
    evaluator.add(&predictions, &targets)?;
    let output = evaluator.compute();

    // class 0 ranks a false positive (IoU 1/7) before a true positive (IoU 4/9)
    assert_eq!(output.per_class.len(), 1);
    assert_abs_diff_eq!(output.per_class[&0], 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(output.mean_ap, 0.25, epsilon = 1e-12);

    // the result is reproducible
    let mut again = MeanApInit {
        iou_threshold: 0.3,
        ..MeanApInit::new(2)
    }
    .build()?;
    again.add(&predictions, &targets)?;
    assert_eq!(again.compute(), output);
    Ok(())
}

#[test]
fn perfect_predictions_score_one() -> Result<()> {
    let boxes = [
        ([0.0, 0.0, 10.0, 10.0], 0),
        ([20.0, 20.0, 30.0, 30.0], 1),
        ([5.0, 40.0, 25.0, 60.0], 1),
    ];
    let predictions = detections(
        &boxes
            .iter()
            .map(|&(xyxy, class)| (xyxy, class, 1.0))
            .collect::<Vec<_>>(),
    );

    for method in [IntegralMethod::Continuous, IntegralMethod::Interpolation(101)] {
        let mut evaluator = MeanApInit {
            integral_method: method,
            ..MeanApInit::new(3)
        }
        .build()?;
        evaluator.add(&predictions, &ground_truth(&boxes))?;
        let output = evaluator.compute();

        assert_eq!(output.per_class.len(), 2);
        assert_abs_diff_eq!(output.per_class[&0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(output.per_class[&1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(output.mean_ap, 1.0, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn unmatched_class_scores_zero_and_absent_class_is_excluded() -> Result<()> {
    let mut evaluator = MeanApInit::new(3).build()?;
    evaluator.add(
        &detections(&[
            ([0.0, 0.0, 10.0, 10.0], 0, 0.9),
            ([50.0, 50.0, 60.0, 60.0], 1, 0.8),
            ([70.0, 70.0, 80.0, 80.0], 2, 0.8),
        ]),
        &ground_truth(&[([0.0, 0.0, 10.0, 10.0], 0), ([0.0, 0.0, 10.0, 10.0], 1)]),
    )?;
    let output = evaluator.compute();

    assert_eq!(output.per_class.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_abs_diff_eq!(output.per_class[&0], 1.0);
    assert_abs_diff_eq!(output.per_class[&1], 0.0);
    assert_abs_diff_eq!(output.mean_ap, 0.5);
    Ok(())
}

#[test]
fn accumulation_spans_images() -> Result<()> {
    let mut evaluator = MeanApInit::new(1).build()?;
    evaluator.add(
        &detections(&[([0.0, 0.0, 10.0, 10.0], 0, 0.5)]),
        &ground_truth(&[([0.0, 0.0, 10.0, 10.0], 0)]),
    )?;
    evaluator.add(
        &detections(&[([30.0, 30.0, 40.0, 40.0], 0, 0.9)]),
        &ground_truth(&[([0.0, 0.0, 10.0, 10.0], 0)]),
    )?;
    evaluator.add(&Detections::empty(), &LabeledBoxSet::empty())?;

    // ranked: FP at 0.9, TP at 0.5, with two ground truth boxes overall
    assert_abs_diff_eq!(evaluator.compute().mean_ap, 0.25, epsilon = 1e-12);
    Ok(())
}
