use clap::{arg, crate_version, value_parser, ArgAction, Command};
use std::path::{Path, PathBuf};

use umitrie::check_lengths::CheckLengths;
use umitrie::dedup::Deduplicator;
use umitrie::dissection::DissectionMethod;
use umitrie::fastq;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let long_help = "Examples:
---------
Basic:           `fastqdedup -o dedup.fastq.gz reads.fastq.gz`
Allow mismatch:  `fastqdedup --max-distance 1 -o dedup.fastq.gz reads.fastq.gz`
UMI in header:   `fastqdedup --check-lengths 0:8 -o dedup.fastq.gz reads.fastq.gz`";

    let methods = ["highest_count", "adjacency", "directional"];

    let main_cmd = Command::new("fastqdedup")
        .about("Deduplicate FASTQ reads by UMI-aware clustering")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(<inputs> ... "input FASTQ file(s), gzip-compressed if named *.gz"))
        .arg(arg!(-o --output <PATH> "output FASTQ path").required(false))
        .arg(arg!(--prefix <PATH> "output path prefix, used in place of --output").required(false))
        .arg(
            arg!(--"max-distance" <N> "maximum Hamming (or edit, with --edit) distance within a cluster")
                .value_parser(value_parser!(u32))
                .default_value("0"),
        )
        .arg(
            arg!(--"max-average-error-rate" <RATE> "reject reads whose average per-base error rate exceeds RATE")
                .value_parser(value_parser!(f64))
                .default_value("0.01"),
        )
        .arg(arg!(--"no-average-error-rate-filter" "disable the average-error-rate quality filter"))
        .arg(arg!(--edit "use edit distance instead of Hamming distance"))
        .arg(
            arg!(--"cluster-dissection-method" <METHOD> "how to turn a cluster into output record(s)")
                .value_parser(methods)
                .default_value("highest_count"),
        )
        .arg(arg!(--"check-lengths" <SPEC> "index/slice notation selecting the UMI region of each read's sequence").required(false))
        .arg(arg!(-v --verbose "increase log verbosity (repeatable)").action(ArgAction::Count))
        .arg(arg!(-q --quiet "decrease log verbosity (repeatable)").action(ArgAction::Count));

    let matches = main_cmd.get_matches();

    let verbosity = matches.get_count("verbose") as i32 - matches.get_count("quiet") as i32;
    init_logging(verbosity);

    let inputs: Vec<String> = matches
        .get_many::<String>("inputs")
        .expect(RCH)
        .cloned()
        .collect();
    let output = matches.get_one::<String>("output").cloned();
    let prefix = matches.get_one::<String>("prefix").cloned();
    let max_distance = *matches.get_one::<u32>("max-distance").expect(RCH);
    let use_edit = matches.get_flag("edit");
    let method: DissectionMethod = matches
        .get_one::<String>("cluster-dissection-method")
        .expect(RCH)
        .parse()
        .expect(RCH);
    let filter_disabled = matches.get_flag("no-average-error-rate-filter");
    let max_average_error_rate = if filter_disabled {
        None
    } else {
        Some(*matches.get_one::<f64>("max-average-error-rate").expect(RCH))
    };
    let check_lengths = match matches.get_one::<String>("check-lengths") {
        Some(spec) => CheckLengths::parse(spec)?,
        None => CheckLengths::default(),
    };

    let output_path = resolve_output_path(output.as_deref(), prefix.as_deref(), &inputs);

    let mut dedup = Deduplicator::new();
    for path in &inputs {
        log::info!("reading {}", path);
        let mut reader = fastq::open_reader(Path::new(path))?;
        while let Some(record) = reader.next_record()? {
            dedup.ingest(record, &check_lengths, max_average_error_rate)?;
        }
    }
    let stats = dedup.stats();
    log::info!(
        "read {} record(s), {} filtered by quality, {} indexed",
        stats.seen,
        stats.filtered_by_quality,
        stats.indexed
    );

    let mut writer = fastq::create_writer(&output_path)?;
    let mut written = 0u64;
    match dedup.drain(max_distance, use_edit, method) {
        Ok(records) => {
            for (_, record) in &records {
                fastq::write_record(&mut writer, record)?;
                written += 1;
            }
        }
        Err(umitrie::Error::Empty) => {
            log::info!("nothing to drain, no records survived filtering");
        }
        Err(e) => return Err(Box::new(e)),
    }
    log::info!("wrote {} deduplicated record(s) to {:?}", written, output_path);

    Ok(())
}

fn resolve_output_path(output: Option<&str>, prefix: Option<&str>, inputs: &[String]) -> PathBuf {
    if let Some(output) = output {
        return PathBuf::from(output);
    }
    if let Some(prefix) = prefix {
        let first = Path::new(&inputs[0]);
        let name = first
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dedup.fastq.gz".to_string());
        return PathBuf::from(format!("{prefix}{name}"));
    }
    PathBuf::from("dedup.fastq.gz")
}

fn init_logging(verbosity: i32) {
    let level = match verbosity {
        i32::MIN..=-2 => log::LevelFilter::Error,
        -1 => log::LevelFilter::Warn,
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}
