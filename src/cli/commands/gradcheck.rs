//! Gradcheck command implementation

use crate::cli::logging::log;
use crate::cli::{apply_gradcheck_overrides, GradcheckArgs, LayerKind, LogLevel};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::gradcheck::{check_layer_with_rng, GradientReport, Layer};
use crate::layers::{Linear, Square, Tanh};
use crate::sampling::standard_normal_like;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn run_check<L: Layer<Args = ()>>(
    layer: &mut L,
    args: &GradcheckArgs,
    config: &ProbeConfig,
    rng: &mut StdRng,
) -> Result<GradientReport> {
    let mut input = standard_normal_like(&[args.batch, args.in_features], rng);
    check_layer_with_rng(layer, &mut input, &(), &config.gradcheck, rng)
}

pub fn run_gradcheck(args: &GradcheckArgs, mut config: ProbeConfig, level: LogLevel) -> Result<()> {
    apply_gradcheck_overrides(&mut config, args);
    config.validate()?;
    if args.batch == 0 || args.in_features == 0 {
        return Err(Error::ConfigValue {
            field: "batch/in_features".to_string(),
            message: "must be > 0".to_string(),
        });
    }

    let mut rng = match config.gradcheck.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Checking {:?} layer: input [{}, {}], delta={}, precision={:e}",
            args.layer, args.batch, args.in_features, config.gradcheck.delta, config.gradcheck.precision
        ),
    );

    let report = match args.layer {
        LayerKind::Square => run_check(&mut Square::new(), args, &config, &mut rng)?,
        LayerKind::Tanh => run_check(&mut Tanh::new(), args, &config, &mut rng)?,
        LayerKind::Linear => {
            let mut layer = Linear::new(args.in_features, args.out_features, &mut rng)?;
            run_check(&mut layer, args, &config, &mut rng)?
        }
    };

    log(level, LogLevel::Normal, report.to_string().trim_end());
    Ok(())
}
