use jianpu_transpose::{
    process_recognition, render_instructions, AnchorPair, Direction, EstimatedMetrics, ImageSize,
    RecognitionResult, TransposeConfig, TransposeRequest, TransposeTarget,
};
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "Usage: jianpu-transpose [--from KEY] (--to KEY | --up N | --down N) \
[--size WxH] [--pixels WxH] [--anchors x1,y1,x2,y2] [--config FILE] <recognition.json>";

struct CliArgs {
    from: Option<String>,
    target: TransposeTarget,
    size: ImageSize,
    pixels: Option<ImageSize>,
    anchors: Option<AnchorPair>,
    config_path: Option<String>,
    input_path: String,
}

fn parse_size(value: &str) -> Result<ImageSize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Invalid size '{}', expected WxH", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("Invalid size '{}', expected WxH", value))
    };
    Ok(ImageSize::new(parse(w)?, parse(h)?))
}

fn parse_amount(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("Invalid semitone count '{}'", value))
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut from = None;
    let mut target = None;
    let mut size = ImageSize::new(1000.0, 1000.0);
    let mut pixels = None;
    let mut anchors = None;
    let mut config_path = None;
    let mut input_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {}", arg))
        };
        match arg.as_str() {
            "--from" => from = Some(value()?),
            "--to" => target = Some(TransposeTarget::Key(value()?)),
            "--up" => target = Some(TransposeTarget::shift(Direction::Up, parse_amount(&value()?)?)),
            "--down" => {
                target = Some(TransposeTarget::shift(Direction::Down, parse_amount(&value()?)?))
            }
            "--size" => size = parse_size(&value()?)?,
            "--pixels" => pixels = Some(parse_size(&value()?)?),
            "--anchors" => anchors = Some(value()?.parse::<AnchorPair>().map_err(|e| e.to_string())?),
            "--config" => config_path = Some(value()?),
            flag if flag.starts_with("--") => return Err(format!("Unknown option {}", flag)),
            path => {
                if input_path.replace(path.to_string()).is_some() {
                    return Err("Only one input file is accepted".to_string());
                }
            }
        }
    }

    Ok(CliArgs {
        from,
        target: target.ok_or("One of --to, --up or --down is required")?,
        size,
        pixels,
        anchors,
        config_path,
        input_path: input_path.ok_or("Missing input file")?,
    })
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let config = match cli.config_path.as_deref().map(read_file) {
        Some(yaml) => TransposeConfig::from_yaml(&yaml),
        None => Ok(TransposeConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            process::exit(1);
        }
    };

    let recognition = match RecognitionResult::from_json(&read_file(&cli.input_path)) {
        Ok(recognition) => recognition,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let request = TransposeRequest {
        original_key: cli.from,
        target: cli.target,
        anchors: cli.anchors,
        image: cli.size,
    };

    let outcome = match process_recognition(&recognition, &request, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Transposition error: {}", e);
            process::exit(1);
        }
    };

    let annotation = render_instructions(
        &outcome,
        cli.pixels.unwrap_or(cli.size),
        &EstimatedMetrics::default(),
        &config,
    );

    let output = serde_json::json!({
        "outcome": outcome,
        "annotation": annotation,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding output: {}", e);
            process::exit(1);
        }
    }
}
