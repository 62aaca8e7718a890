//! Integration test: model selection end-to-end

use polars::prelude::*;
use tabclass::error::TabClassError;
use tabclass::pipeline::ModelSelection;

/// 100-row table with a binary target, one numeric and one categorical
/// feature, with enough signal for all three candidates to fit cleanly.
fn binary_frame() -> DataFrame {
    let mut amount = Vec::new();
    let mut segment = Vec::new();
    let mut churn = Vec::new();
    for i in 0..50 {
        let jitter = (i % 10) as f64 * 0.07;
        amount.push(1.0 + jitter);
        segment.push("retail");
        churn.push("no");
        amount.push(6.0 + jitter);
        segment.push("enterprise");
        churn.push("yes");
    }
    df!(
        "amount" => &amount,
        "segment" => &segment,
        "churn" => &churn
    )
    .unwrap()
}

#[test]
fn test_selection_runs_all_candidates_and_picks_one() {
    let selection = ModelSelection::new(binary_frame(), "churn").unwrap();
    let outcome = selection.run().unwrap();

    assert_eq!(outcome.problem_type.as_str(), "classification");
    assert_eq!(outcome.candidates.len(), 3);

    let names: Vec<&str> = outcome.candidates.iter().map(|c| c.model.as_str()).collect();
    assert_eq!(names, vec!["LogisticRegression", "RandomForest", "SVC"]);
    assert!(names.contains(&outcome.best_model.as_str()));
}

#[test]
fn test_winner_accuracy_is_the_maximum() {
    let selection = ModelSelection::new(binary_frame(), "churn").unwrap();
    let outcome = selection.run().unwrap();

    let max_holdout = outcome
        .candidates
        .iter()
        .map(|c| c.holdout_accuracy)
        .fold(f64::NEG_INFINITY, f64::max);

    assert_eq!(outcome.accuracy, max_holdout);
    for candidate in &outcome.candidates {
        assert!(candidate.holdout_accuracy <= outcome.accuracy);
    }
}

#[test]
fn test_selection_is_deterministic() {
    let a = ModelSelection::new(binary_frame(), "churn")
        .unwrap()
        .run()
        .unwrap();
    let b = ModelSelection::new(binary_frame(), "churn")
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(a.best_model, b.best_model);
    assert_eq!(a.accuracy, b.accuracy);

    let actual_a: Vec<&str> = a.predictions.iter().map(|p| p.actual.as_str()).collect();
    let actual_b: Vec<&str> = b.predictions.iter().map(|p| p.actual.as_str()).collect();
    assert_eq!(actual_a, actual_b, "held-out rows must be identical across runs");
}

#[test]
fn test_report_and_predictions_cover_the_holdout() {
    let selection = ModelSelection::new(binary_frame(), "churn").unwrap();
    let outcome = selection.run().unwrap();

    // 20% of 100 rows, stratified
    assert_eq!(outcome.predictions.len(), 20);
    for record in &outcome.predictions {
        assert!(record.actual == "yes" || record.actual == "no");
        assert!(record.predicted == "yes" || record.predicted == "no");
    }

    assert!(outcome.report.classes.contains_key("yes"));
    assert!(outcome.report.classes.contains_key("no"));
    let total_support: usize = outcome.report.classes.values().map(|m| m.support).sum();
    assert_eq!(total_support, 20);

    assert_eq!(outcome.confusion_matrix.labels, vec!["no", "yes"]);
    let total_counts: u64 = outcome.confusion_matrix.counts.iter().flatten().sum();
    assert_eq!(total_counts, 20);

    // Clean separation: the winner should classify the holdout well
    assert!(
        outcome.accuracy >= 0.9,
        "accuracy {} unexpectedly low for separable data",
        outcome.accuracy
    );
}

#[test]
fn test_missing_target_fails_before_any_fitting() {
    let err = ModelSelection::new(binary_frame(), "nonexistent").unwrap_err();
    assert!(matches!(err, TabClassError::InvalidTargetColumn(_)));
    assert_eq!(err.to_string(), "Target column not found in dataset.");
}

#[test]
fn test_float_target_is_unsupported() {
    let df = df!(
        "f" => &[1.0, 2.0, 3.0, 4.0],
        "target" => &[0.1, 0.9, 0.4, 0.6]
    )
    .unwrap();
    let err = ModelSelection::new(df, "target").unwrap_err();
    assert!(matches!(err, TabClassError::UnsupportedProblemType(_)));
}

#[test]
fn test_high_cardinality_target_is_unsupported() {
    let feature: Vec<f64> = (0..30).map(|i| i as f64).collect();
    let target: Vec<String> = (0..30).map(|i| format!("class_{}", i % 15)).collect();
    let df = df!("f" => &feature, "target" => &target).unwrap();

    let err = ModelSelection::new(df, "target").unwrap_err();
    assert!(matches!(err, TabClassError::UnsupportedProblemType(_)));
}

#[test]
fn test_multiclass_selection() {
    let mut f1 = Vec::new();
    let mut label = Vec::new();
    for i in 0..20 {
        let jitter = (i % 5) as f64 * 0.05;
        f1.push(jitter);
        label.push("alpha");
        f1.push(3.0 + jitter);
        label.push("beta");
        f1.push(6.0 + jitter);
        label.push("gamma");
    }
    let df = df!("f1" => &f1, "label" => &label).unwrap();

    let outcome = ModelSelection::new(df, "label").unwrap().run().unwrap();

    assert_eq!(outcome.confusion_matrix.labels.len(), 3);
    assert!(outcome.accuracy > 0.8);
}

#[test]
fn test_shap_summary_present_on_small_data() {
    let outcome = ModelSelection::new(binary_frame(), "churn")
        .unwrap()
        .run()
        .unwrap();

    let shap = outcome.shap_summary.expect("SHAP summary should succeed here");
    assert_eq!(shap.feature_names.len(), shap.mean_abs_contribution.len());
    assert!(shap.n_instances > 0);
}
