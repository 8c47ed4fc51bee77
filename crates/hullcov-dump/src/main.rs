//! Prints the generated WGSL module, or an ASCII preview of one segment's
//! coverage.
//!
//! ```text
//! hullcov-dump [--no-hull] [--corner] [--bloat <px>] [--preview x0,y0,x1,y1,x2,y2[,wind]]
//! ```

use anyhow::{Context, Result, bail};

use hullcov_engine::coords::{ControlPoints, Vec2};
use hullcov_engine::logging::{LoggingConfig, init_logging};
use hullcov_engine::probe::CoverageProbe;
use hullcov_engine::program::CurveInstance;
use hullcov_engine::{CurveProgram, EmitConfig};

const USAGE: &str =
    "usage: hullcov-dump [--no-hull] [--corner] [--bloat <px>] [--preview x0,y0,x1,y1,x2,y2[,wind]]";

/// Darkest last.
const RAMP: &[u8] = b" .:-=+*#%@";
const PREVIEW_COLUMNS: f32 = 64.0;

#[derive(Debug, Clone, PartialEq)]
struct Preview {
    points: ControlPoints,
    wind: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: EmitConfig,
    preview: Option<Preview>,
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = parse_args(std::env::args().skip(1))?;
    log::debug!("{args:?}");

    let program = CurveProgram::quadratic(args.config);
    match args.preview {
        None => print!("{}", program.source()),
        Some(preview) => print!("{}", render_preview(&program, &preview)?),
    }
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut config = EmitConfig::default();
    let mut preview = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-hull" => config = config.with_hull(false),
            "--corner" => config = config.with_corner_coverage(true),
            "--bloat" => {
                let value = args.next().context("--bloat needs a value")?;
                let bloat: f32 = value
                    .parse()
                    .with_context(|| format!("invalid --bloat value `{value}`"))?;
                config = config.with_bloat(bloat);
            }
            "--preview" => {
                let value = args.next().context("--preview needs control points")?;
                preview = Some(parse_preview(&value)?);
            }
            "-h" | "--help" => bail!("{USAGE}"),
            other => bail!("unknown argument `{other}`\n{USAGE}"),
        }
    }

    if !config.is_valid() {
        bail!("bloat must be a positive number of pixels, got {}", config.bloat);
    }
    Ok(Args { config, preview })
}

fn parse_preview(value: &str) -> Result<Preview> {
    let nums = value
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .with_context(|| format!("invalid number `{s}` in --preview"))
        })
        .collect::<Result<Vec<_>>>()?;

    let (coords, wind) = match nums.as_slice() {
        [c @ .., w] if c.len() == 6 => (c, Some(*w)),
        c if c.len() == 6 => (c, None),
        _ => bail!("--preview takes 6 coordinates and an optional winding, got {}", nums.len()),
    };
    let points = ControlPoints::new(
        Vec2::new(coords[0], coords[1]),
        Vec2::new(coords[2], coords[3]),
        Vec2::new(coords[4], coords[5]),
    );
    if points.is_degenerate() {
        bail!("control points are collinear: {value}");
    }
    Ok(Preview { points, wind })
}

/// Samples coverage over the hull bounds, one character per cell.
///
/// Rows are twice as tall as columns to roughly match terminal glyphs.
fn render_preview(program: &CurveProgram, preview: &Preview) -> Result<String> {
    let points = preview.points;
    let wind = preview.wind.unwrap_or_else(|| points.winding());
    let instance = CurveInstance::new(points, wind).with_corner_coverage(0.0, 1.0);
    let probe = CoverageProbe::new(program, &instance).context("failed to evaluate setup")?;

    let area = points.bounds().outset(2.0 * program.config().bloat);
    let step = (area.size.x.max(area.size.y) / PREVIEW_COLUMNS).max(1.0 / 16.0);
    let cols = (area.size.x / step).ceil() as usize;
    let rows = (area.size.y / (2.0 * step)).ceil() as usize;

    let mut out = String::with_capacity((cols + 1) * rows + 64);
    out.push_str(&format!(
        "# wind {wind}, {cols}x{rows} cells of {step:.3} px, origin {:?}\n",
        area.min().to_array()
    ));

    for row in 0..rows {
        for col in 0..cols {
            let pos = area.min()
                + Vec2::new((col as f32 + 0.5) * step, (row as f32 + 0.5) * 2.0 * step);
            let coverage = probe
                .coverage_at(pos)
                .with_context(|| format!("failed to evaluate coverage at {pos:?}"))?;
            out.push(shade(coverage));
        }
        out.push('\n');
    }
    Ok(out)
}

fn shade(coverage: f32) -> char {
    let level = coverage.abs().clamp(0.0, 1.0) * (RAMP.len() - 1) as f32;
    RAMP[level.round() as usize] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_dump_default_program() {
        let a = args(&[]).unwrap();
        assert_eq!(a.config, EmitConfig::default());
        assert_eq!(a.preview, None);
    }

    #[test]
    fn flags_update_config() {
        let a = args(&["--no-hull", "--corner", "--bloat", "0.75"]).unwrap();
        assert_eq!(a.config, EmitConfig { bloat: 0.75, hull: false, corner_coverage: true });
    }

    #[test]
    fn preview_with_and_without_winding() {
        let a = args(&["--preview", "0,0,1,2,2,0"]).unwrap();
        let p = a.preview.unwrap();
        assert_eq!(p.points.p1, Vec2::new(1.0, 2.0));
        assert_eq!(p.wind, None);

        let a = args(&["--preview", "0, 0, 1, 2, 2, 0, -2"]).unwrap();
        assert_eq!(a.preview.unwrap().wind, Some(-2.0));
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(args(&["--bloat"]).is_err());
        assert!(args(&["--bloat", "wide"]).is_err());
        assert!(args(&["--bloat", "-1"]).is_err());
        assert!(args(&["--preview", "0,0,1,1"]).is_err());
        assert!(args(&["--preview", "0,0,1,1,2,2"]).is_err());
        assert!(args(&["--frobnicate"]).is_err());
    }

    #[test]
    fn shade_uses_magnitude() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(-1.0), '@');
        assert_eq!(shade(7.0), '@');
    }

    #[test]
    fn preview_renders_a_filled_interior() {
        let program = CurveProgram::quadratic(EmitConfig::default());
        let preview = Preview {
            points: ControlPoints::new(Vec2::new(0.0, 0.0), Vec2::new(16.0, 32.0), Vec2::new(32.0, 0.0)),
            wind: None,
        };
        let text = render_preview(&program, &preview).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("# wind -1"));
        assert!(text.contains('@'));
        assert!(text.contains(' '));
    }
}
