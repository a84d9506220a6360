//! The `run` command: evaluate a script over in-memory images.
//!
//! Source images are filled with a constant (0 unless `--fill` says
//! otherwise) and every image is `--size` pixels. The run goes through
//! the [`Executor`] like any embedding would.

use std::sync::Arc;

use rasc_eval::{
    Executor, ExecutorEvent, ProgressListener, ProgressPolicy, RasterImage, Runtime,
    RuntimeError, World, WorldBounds, WritableImage,
};
use rasc_ir::ImageRole;
use rasc_registry::Registry;

use super::{emit_diagnostics, fail_compile, read_file};
use crate::{compile, CompileOptions, CompiledScript, ExecModel};

/// Grids up to this many pixels are printed in full.
const MAX_PRINTED_PIXELS: u64 = 256;

/// Parsed `rasc run` arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub step: Option<f64>,
    pub vars: Vec<(String, f64)>,
    pub fills: Vec<(String, f64)>,
    pub seed: Option<u64>,
    /// Worker threads; 0 lets the pool decide.
    pub threads: usize,
}

/// Parse the arguments following `rasc run`.
pub fn parse_run_options(args: &[String]) -> Result<RunOptions, String> {
    let mut path = None;
    let mut size = None;
    let mut step = None;
    let mut vars = Vec::new();
    let mut fills = Vec::new();
    let mut seed = None;
    let mut threads = 0;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .map(String::as_str)
                .ok_or_else(|| format!("missing value for {flag}"))
        };
        match arg.as_str() {
            "--size" => size = Some(parse_size(value("--size")?)?),
            "--step" => step = Some(parse_number("--step", value("--step")?)?),
            "--var" => vars.push(parse_assignment("--var", value("--var")?)?),
            "--fill" => fills.push(parse_assignment("--fill", value("--fill")?)?),
            "--seed" => {
                let text = value("--seed")?;
                seed = Some(text.parse().map_err(|_| format!("invalid --seed '{text}'"))?);
            }
            "--threads" => {
                let text = value("--threads")?;
                threads = text
                    .parse()
                    .map_err(|_| format!("invalid --threads '{text}'"))?;
            }
            other if other.starts_with('-') => return Err(format!("unknown option '{other}'")),
            other if path.is_none() => path = Some(other.to_string()),
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    let path = path.ok_or("missing file path")?;
    let (width, height) = size.ok_or("missing --size WxH")?;
    Ok(RunOptions {
        path,
        width,
        height,
        step,
        vars,
        fills,
        seed,
        threads,
    })
}

fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let invalid = || format!("invalid --size '{text}', expected WxH");
    let (w, h) = text.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

fn parse_number(flag: &str, text: &str) -> Result<f64, String> {
    text.parse()
        .map_err(|_| format!("invalid {flag} value '{text}'"))
}

fn parse_assignment(flag: &str, text: &str) -> Result<(String, f64), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("invalid {flag} '{text}', expected name=value"))?;
    Ok((name.trim().to_string(), parse_number(flag, value.trim())?))
}

/// Logs run progress through `tracing`.
struct LogProgress;

impl ProgressListener for LogProgress {
    fn started(&mut self, total: u64) {
        tracing::info!(total, "evaluation started");
    }

    fn progress(&mut self, done: u64, total: u64) {
        tracing::debug!(done, total, "evaluation progress");
    }

    fn finished(&mut self, total: u64) {
        tracing::info!(total, "evaluation finished");
    }
}

pub fn run_file(options: &RunOptions) {
    let path = options.path.as_str();
    let source = read_file(path);
    let registry = Registry::standard();
    let output = match compile(&source, &CompileOptions::new(ExecModel::Direct), &registry) {
        Ok(output) => output,
        Err(error) => fail_compile(path, &source, &error),
    };
    emit_diagnostics(path, &source, &output.warnings);

    let (runtime, total) = match prepare(output.script, options) {
        Ok(prepared) => prepared,
        Err(error) => {
            eprintln!("error: {path}: {error}");
            std::process::exit(1);
        }
    };

    let executor = match Executor::new(options.threads) {
        Ok(executor) => executor,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };
    let policy = ProgressPolicy::every((total / 10).max(1), LogProgress);
    let job = executor.submit(runtime, policy);

    match executor.recv() {
        Some(ExecutorEvent::Completed { images, .. }) => {
            for (name, image) in &images {
                print_image(name, image.as_ref());
            }
        }
        Some(ExecutorEvent::Failed { error, .. }) => {
            eprintln!("error: {path}: {error}");
            std::process::exit(1);
        }
        None => {
            eprintln!("error: {job} produced no result");
            std::process::exit(1);
        }
    }
}

/// Bind images, variables and the world. Returns the runtime and its pixel count.
fn prepare(
    script: Arc<CompiledScript>,
    options: &RunOptions,
) -> Result<(Runtime, u64), RuntimeError> {
    let (width, height) = (options.width, options.height);
    let images: Vec<(String, ImageRole)> = script
        .image_params
        .iter()
        .map(|(name, role)| (name.to_string(), role))
        .collect();

    let mut runtime = Runtime::new(script);
    for (name, role) in images {
        match role {
            ImageRole::Source => {
                let fill = options
                    .fills
                    .iter()
                    .rev()
                    .find(|(n, _)| *n == name)
                    .map_or(0.0, |(_, v)| *v);
                let mut image = RasterImage::new(width, height);
                image.fill(fill);
                runtime.bind_source(&name, Arc::new(image))?;
            }
            ImageRole::Dest => runtime.bind_dest(&name, Box::new(RasterImage::new(width, height)))?,
        }
    }
    for (name, value) in &options.vars {
        runtime.set_var(name, Some(*value))?;
    }
    if let Some(seed) = options.seed {
        runtime.set_seed(seed);
    }

    let bounds = WorldBounds::new(0.0, 0.0, f64::from(width), f64::from(height));
    let step = options.step.unwrap_or(1.0);
    let total = World::new(bounds, step, step)?.pixel_count();
    if options.step.is_some() {
        runtime.set_world(bounds, step, step)?;
    }
    Ok((runtime, total))
}

fn print_image(name: &str, image: &dyn WritableImage) {
    let mut count = 0u64;
    let mut nan = 0u64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for y in image.min_y()..image.min_y() + i64::from(image.height()) {
        for x in image.min_x()..image.min_x() + i64::from(image.width()) {
            let v = image.get(x, y, 0);
            if v.is_nan() {
                nan += 1;
                continue;
            }
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
    }
    println!("{name}: {}x{}", image.width(), image.height());
    if count > 0 {
        println!("  min {min}  max {max}  mean {}", sum / count as f64);
    }
    if nan > 0 {
        println!("  {nan} null pixel(s)");
    }

    if u64::from(image.width()) * u64::from(image.height()) <= MAX_PRINTED_PIXELS {
        for y in image.min_y()..image.min_y() + i64::from(image.height()) {
            let row: Vec<String> = (image.min_x()..image.min_x() + i64::from(image.width()))
                .map(|x| format!("{}", image.get(x, y, 0)))
                .collect();
            println!("  {}", row.join(" "));
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_run_options() {
        let options =
            parse_run_options(&args("a.rasc --size 4x3 --step 0.5 --var k=2 --fill src=1.5 --seed 7"))
                .unwrap();
        assert_eq!(
            options,
            RunOptions {
                path: "a.rasc".to_string(),
                width: 4,
                height: 3,
                step: Some(0.5),
                vars: vec![("k".to_string(), 2.0)],
                fills: vec![("src".to_string(), 1.5)],
                seed: Some(7),
                threads: 0,
            }
        );
    }

    #[test]
    fn test_parse_run_options_errors() {
        assert_eq!(
            parse_run_options(&args("a.rasc")).unwrap_err(),
            "missing --size WxH"
        );
        assert_eq!(
            parse_run_options(&args("--size 2x2")).unwrap_err(),
            "missing file path"
        );
        assert_eq!(
            parse_run_options(&args("a.rasc --size 0x2")).unwrap_err(),
            "invalid --size '0x2', expected WxH"
        );
        assert_eq!(
            parse_run_options(&args("a.rasc --size 2x2 --var k")).unwrap_err(),
            "invalid --var 'k', expected name=value"
        );
        assert_eq!(
            parse_run_options(&args("a.rasc --size")).unwrap_err(),
            "missing value for --size"
        );
        assert_eq!(
            parse_run_options(&args("a.rasc --size 2x2 --frobnicate")).unwrap_err(),
            "unknown option '--frobnicate'"
        );
    }

    #[test]
    fn test_prepare_binds_images_and_variables() {
        let registry = Registry::standard();
        let output = compile(
            "images { src = read; out = write; } init { k = 1; } out = src * k;",
            &CompileOptions::new(ExecModel::Direct),
            &registry,
        )
        .unwrap();
        let options = parse_run_options(&args("a.rasc --size 3x2 --fill src=2 --var k=5")).unwrap();
        let (mut runtime, total) = prepare(output.script, &options).unwrap();
        assert_eq!(total, 6);
        runtime.evaluate_all().unwrap();
        let image = runtime.dest_image("out").unwrap();
        assert_eq!(image.get(2, 1, 0), 10.0);
    }
}
