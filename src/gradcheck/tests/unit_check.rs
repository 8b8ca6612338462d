//! Unit tests for check_layer

use super::fixtures::{arr, ForgetfulBias, ScaledProduct, ZeroBackward};
use crate::error::Error;
use crate::gradcheck::{check_layer, check_layer_with_rng, CheckConfig, Layer, Variable};
use crate::layers::{Linear, Square, Tanh};
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded() -> CheckConfig {
    CheckConfig::default().with_seed(2024)
}

#[test]
fn test_default_config() {
    let config = CheckConfig::default();
    assert_eq!(config.delta, 0.01);
    assert_eq!(config.precision, 1e-3);
    assert!(config.seed.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_square_passes() {
    let mut layer = Square::new();
    let mut x = arr(&[2, 3], vec![0.5, -1.0, 2.0, 0.0, 1.5, -0.25]);

    let report = check_layer(&mut layer, &mut x, &(), &seeded()).unwrap();

    assert_eq!(report.variables.len(), 1);
    assert_eq!(report.variables[0].variable, Variable::Input);
    assert_eq!(report.num_checked(), 6);
    assert!(report.max_abs_error() < 1e-3);
}

#[test]
fn test_tanh_passes() {
    let mut layer = Tanh::new();
    let mut x = arr(&[4], vec![-1.0, -0.1, 0.4, 1.3]);
    assert!(check_layer(&mut layer, &mut x, &(), &seeded()).is_ok());
}

#[test]
fn test_linear_checks_input_then_parameters() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut layer = Linear::new(3, 2, &mut rng).unwrap();
    let mut x = arr(&[4, 3], (0..12).map(|i| f64::from(i) * 0.1 - 0.5).collect());

    let report = check_layer_with_rng(&mut layer, &mut x, &(), &CheckConfig::default(), &mut rng).unwrap();

    let names: Vec<_> = report.variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["input", "weight", "bias"]);
    assert_eq!(report.variables[1].variable, Variable::Parameter(0));
    assert_eq!(report.num_checked(), 12 + 6 + 2);
}

#[test]
fn test_zero_backward_is_detected() {
    let mut layer = ZeroBackward::default();
    let mut x = arr(&[3], vec![1.0, 2.0, 3.0]);

    let err = check_layer(&mut layer, &mut x, &(), &seeded()).unwrap_err();

    match err {
        Error::GradientMismatch { variable, index, analytic, precision, .. } => {
            assert_eq!(variable, "input");
            assert!(index < 3);
            assert_eq!(analytic, 0.0);
            assert_eq!(precision, 1e-3);
        }
        other => panic!("expected GradientMismatch, got {other:?}"),
    }
}

#[test]
fn test_wrong_parameter_gradient_is_named() {
    let w = arr(&[3], vec![0.5, -1.0, 2.0]);
    let mut layer = ScaledProduct::new(w).with_wrong_weight_grad();
    let mut x = arr(&[3], vec![1.0, 1.0, 1.0]);

    let err = check_layer(&mut layer, &mut x, &4.0, &seeded()).unwrap_err();

    match err {
        Error::GradientMismatch { variable, .. } => assert_eq!(variable, "w"),
        other => panic!("expected GradientMismatch, got {other:?}"),
    }
}

#[test]
fn test_extra_args_layer_passes() {
    let w = arr(&[3], vec![0.5, -1.0, 2.0]);
    let mut layer = ScaledProduct::new(w);
    let mut x = arr(&[3], vec![1.0, -2.0, 0.3]);

    let report = check_layer(&mut layer, &mut x, &4.0, &seeded()).unwrap();
    assert_eq!(report.variables.len(), 2);
}

#[test]
fn test_missing_parameter_gradient() {
    let mut layer = ForgetfulBias { bias: arr(&[2], vec![0.1, 0.2]) };
    let mut x = arr(&[2], vec![1.0, 2.0]);

    let err = check_layer(&mut layer, &mut x, &(), &seeded()).unwrap_err();
    assert!(matches!(err, Error::MissingParameterGradient { .. }));
}

#[test]
fn test_invalid_config_fails_before_forward() {
    let mut layer = ZeroBackward::default();
    let mut x = arr(&[1], vec![1.0]);

    let bad_delta = CheckConfig::default().with_delta(0.0);
    assert!(matches!(
        check_layer(&mut layer, &mut x, &(), &bad_delta),
        Err(Error::InvalidDelta(_))
    ));

    let bad_precision = CheckConfig::default().with_precision(f64::NAN);
    assert!(matches!(
        check_layer(&mut layer, &mut x, &(), &bad_precision),
        Err(Error::InvalidPrecision(_))
    ));
}

#[test]
fn test_seeded_checks_are_reproducible() {
    let mut x = arr(&[3], vec![0.2, -0.4, 0.9]);
    let first = check_layer(&mut Tanh::new(), &mut x, &(), &seeded()).unwrap();
    let second = check_layer(&mut Tanh::new(), &mut x, &(), &seeded()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_check_leaves_layer_and_input_untouched() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut layer = Linear::new(2, 2, &mut rng).unwrap();
    let weight_before = layer.parameter(0).unwrap().clone();
    let bias_before = layer.parameter(1).unwrap().clone();
    let mut x = arr(&[1, 2], vec![0.7, -0.3]);
    let x_before = x.clone();

    check_layer(&mut layer, &mut x, &(), &seeded()).unwrap();

    assert_eq!(layer.parameter(0).unwrap(), &weight_before);
    assert_eq!(layer.parameter(1).unwrap(), &bias_before);
    assert_eq!(x, x_before);
}

#[test]
fn test_report_display() {
    let mut layer = Square::new();
    let mut x = ArrayD::from_elem(IxDyn(&[2]), 1.0);
    let report = check_layer(&mut layer, &mut x, &(), &seeded()).unwrap();

    let text = report.to_string();
    assert!(text.contains("Gradient check passed"));
    assert!(text.contains("input"));
}
