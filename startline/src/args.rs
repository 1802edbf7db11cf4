//! Positional run arguments: a thread count and a pinning directive, in any
//! order.
//!
//! ```text
//! startline 8                 8 unpinned workers
//! startline 8 pin             8 workers on units 0..8
//! startline 8 pin@4           8 workers on units 4..12
//! startline 8 pin@1-0         8 workers from group 1, processor 0 onwards
//! startline pin:0-1,0-3,1-2   one worker per listed unit
//! ```

use std::path::Path;

use startline_core::placement::parse_unit_list;
use startline_core::{
    ExecutionUnit, LaunchConfig, PinningMode, RunConfig, StartlineError, StartlineResult,
};

const PIN: &str = "pin";
const PIN_FROM: &str = "pin@";
const PIN_LIST: &str = "pin:";

/// What the positional arguments asked for. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub threads: Option<usize>,
    pub placement: Option<PinningMode>,
}

impl RunArgs {
    /// Parse positional tokens. Later tokens override earlier ones.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> StartlineResult<Self> {
        let mut args = RunArgs::default();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.starts_with(PIN) {
                args.placement = Some(parse_pinning(token)?);
            } else {
                let threads = token.parse::<usize>().map_err(|e| {
                    StartlineError::Parse(format!(
                        "`{}` is neither a thread count nor a pin directive: {}",
                        token, e
                    ))
                })?;
                args.threads = Some(threads);
            }
        }
        Ok(args)
    }

    /// Overlay these arguments on `base` (usually a launch file) and
    /// validate the result.
    pub fn apply(self, mut base: LaunchConfig) -> StartlineResult<LaunchConfig> {
        if let Some(threads) = self.threads {
            base.run.threads = Some(threads);
        }
        if let Some(placement) = self.placement {
            base.run.placement = placement;
        }

        // An explicit list on its own sizes the launch; a zero count is
        // treated the same as a missing one.
        if base.run.threads == Some(0) && base.run.placement.explicit_units().is_some() {
            base.run.threads = None;
        }

        base.run.validate()?;
        Ok(base)
    }
}

/// Parse a single `pin`, `pin@UNIT` or `pin:LIST` token.
pub fn parse_pinning(token: &str) -> StartlineResult<PinningMode> {
    if token == PIN {
        Ok(PinningMode::sequential())
    } else if let Some(start) = token.strip_prefix(PIN_FROM) {
        let start: ExecutionUnit = start.parse()?;
        Ok(PinningMode::Sequential { start })
    } else if let Some(list) = token.strip_prefix(PIN_LIST) {
        Ok(PinningMode::explicit(parse_unit_list(list)?))
    } else {
        Err(StartlineError::Parse(format!(
            "unknown pin directive `{}` (expected pin, pin@UNIT or pin:LIST)",
            token
        )))
    }
}

/// Build the launch configuration from an optional launch file and the
/// positional arguments. The file may leave out anything the arguments
/// supply; only the merged result is validated.
pub fn resolve<S: AsRef<str>>(
    config_file: Option<&Path>,
    tokens: &[S],
) -> StartlineResult<LaunchConfig> {
    let args = RunArgs::parse(tokens)?;
    let base = match config_file {
        Some(path) => LaunchConfig::read(path)?,
        None => LaunchConfig {
            run: RunConfig::new(None, PinningMode::NoPinning),
            ..Default::default()
        },
    };
    args.apply(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_only() {
        let args = RunArgs::parse(&["6"]).unwrap();
        assert_eq!(args.threads, Some(6));
        assert_eq!(args.placement, None);
    }

    #[test]
    fn test_pin_directives() {
        assert_eq!(parse_pinning("pin").unwrap(), PinningMode::sequential());
        assert_eq!(
            parse_pinning("pin@4").unwrap(),
            PinningMode::Sequential {
                start: ExecutionUnit::Flat(4)
            }
        );
        assert_eq!(
            parse_pinning("pin@1-2").unwrap(),
            PinningMode::Sequential {
                start: ExecutionUnit::grouped(1, 2)
            }
        );
        assert_eq!(
            parse_pinning("pin:0-1,0-3,").unwrap(),
            PinningMode::explicit(vec![
                ExecutionUnit::grouped(0, 1),
                ExecutionUnit::grouped(0, 3)
            ])
        );
    }

    #[test]
    fn test_bad_pin_directives() {
        assert!(parse_pinning("pinned").is_err());
        assert!(parse_pinning("pin@").is_err());
        assert!(parse_pinning("pin:").is_err());
        assert!(parse_pinning("pin:0-1,,0-2").is_err());
        assert!(parse_pinning("pin:a-b").is_err());
    }

    #[test]
    fn test_any_order() {
        let a = RunArgs::parse(&["pin", "4"]).unwrap();
        let b = RunArgs::parse(&["4", "pin"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.threads, Some(4));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            RunArgs::parse(&["four"]),
            Err(StartlineError::Parse(_))
        ));
    }

    #[test]
    fn test_thread_count_required_without_list() {
        let err = resolve::<&str>(None, &["pin"]).unwrap_err();
        assert!(err.to_string().contains("thread count has to be specified"));

        let err = resolve::<&str>(None, &["0", "pin@3"]).unwrap_err();
        assert!(matches!(err, StartlineError::Configuration(_)));
    }

    #[test]
    fn test_list_sizes_launch() {
        let config = resolve(None, &["pin:2,5,7"]).unwrap();
        assert_eq!(config.run.threads, None);
        assert_eq!(config.run.worker_count().unwrap(), 3);

        let config = resolve(None, &["0", "pin:2,5"]).unwrap();
        assert_eq!(config.run.worker_count().unwrap(), 2);
    }

    #[test]
    fn test_positional_overrides_file() {
        let base = LaunchConfig {
            run: RunConfig::new(Some(2), PinningMode::sequential()),
            ..Default::default()
        };
        let args = RunArgs::parse(&["8"]).unwrap();
        let config = args.apply(base).unwrap();
        assert_eq!(config.run.threads, Some(8));
        assert_eq!(config.run.placement, PinningMode::sequential());
    }

    #[test]
    fn test_file_supplies_placement_args_supply_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launch.yaml");
        std::fs::write(
            &path,
            "placement:\n  mode: sequential\n  start: 2\noptions:\n  raise_priority: true\n",
        )
        .unwrap();

        let config = resolve(Some(path.as_path()), &["3"]).unwrap();
        assert_eq!(config.run.threads, Some(3));
        assert_eq!(
            config.run.placement,
            PinningMode::Sequential {
                start: ExecutionUnit::Flat(2)
            }
        );
        assert!(config.options.raise_priority);

        assert!(resolve::<&str>(Some(path.as_path()), &[]).is_err());
    }
}
