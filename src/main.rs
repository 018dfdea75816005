//! httpry command line entry point.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use httpry::capture::PacketSource;
use httpry::config::{Config, RateConfig, DEFAULT_CAPFILTER, DEFAULT_FORMAT};
use httpry::rate::HostStats;
use httpry::{Error, FieldRegistry, PacketDecoder, Pipeline, RecordEmitter, RecordFormat};

/// Set by SIGINT/SIGTERM, polled between packets.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Log HTTP requests and responses seen on the wire.
#[derive(Debug, Parser)]
#[command(name = "httpry", version, about)]
struct Args {
    /// Capture filter expression (requires the `libpcap` feature)
    #[arg(short = 'f', long = "filter")]
    filter: Option<String>,

    /// Interface to capture from, the default device when omitted
    #[arg(short = 'i', long = "interface")]
    interface: Option<String>,

    /// Stop after this many records, 0 for no limit
    #[arg(short = 'n', long = "count", default_value_t = 0)]
    count: u64,

    /// Append records to this file instead of standard output
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Do not put the interface in promiscuous mode
    #[arg(short = 'p', long = "no-promisc")]
    no_promisc: bool,

    /// Read packets from a pcap capture file
    #[arg(short = 'r', long = "read")]
    input: Option<PathBuf>,

    /// Comma separated list of output fields
    #[arg(short = 's', long = "format", default_value = DEFAULT_FORMAT)]
    format: String,

    /// Write one Json object per record instead of tab separated values
    #[arg(long)]
    json: bool,

    /// Report per-host request rates every N seconds of capture time
    #[arg(short = 't', long = "rate-interval")]
    rate_interval: Option<u64>,

    /// Minimum requests per second for a host to appear in a rate report
    #[arg(
        short = 'l',
        long = "rate-threshold",
        default_value_t = 1,
        requires = "rate_interval"
    )]
    rate_threshold: u64,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            format: self.format,
            parse_count: if self.count == 0 {
                None
            } else {
                Some(self.count)
            },
            output: self.output,
            input: self.input,
            interface: self.interface,
            filter: self
                .filter
                .unwrap_or_else(|| DEFAULT_CAPFILTER.to_string()),
            promiscuous: !self.no_promisc,
            record_format: if self.json {
                RecordFormat::Json
            } else {
                RecordFormat::Tsv
            },
            rate: self.rate_interval.map(|interval| RateConfig {
                interval,
                threshold: self.rate_threshold,
            }),
        }
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let filter_given = args.filter.is_some();
    let config = args.into_config();

    if let Err(e) = run(&config, filter_given) {
        log::error!("{}", e);
        eprintln!("httpry: {}", e);
        process::exit(1);
    }
}

fn run(config: &Config, filter_given: bool) -> Result<(), Error> {
    config.validate()?;

    let registry = FieldRegistry::from_format_str(&config.format)?;
    log::debug!("output fields: {}", registry.header_line());

    let mut source = open_source(config, filter_given)?;
    let decoder = PacketDecoder::new(source.encap_type())?;

    let out: Box<dyn Write> = match &config.output {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("cannot open output file '{}': {}", path.display(), e))
                })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };

    let mut emitter = RecordEmitter::new(out, config.record_format);
    if config.has_output_file() {
        emitter.write_preamble(&registry)?;
    }

    let mut pipeline = Pipeline::new(decoder, registry, emitter)
        .with_parse_count(config.parse_count.unwrap_or(0));
    if let Some(rate) = config.rate {
        pipeline = pipeline.with_host_stats(HostStats::new(rate.interval, rate.threshold));
    }

    setup_signal_handler();

    let parsed = pipeline.run(source.as_mut(), &SHUTDOWN)?;
    log::info!("{} http packets parsed", parsed);

    Ok(())
}

#[cfg(feature = "libpcap")]
fn open_source(config: &Config, _filter_given: bool) -> Result<Box<dyn PacketSource>, Error> {
    use httpry::capture::LibpcapSource;

    let source = match &config.input {
        Some(path) => LibpcapSource::offline(path, &config.filter)?,
        None => LibpcapSource::live(
            config.interface.as_deref(),
            config.promiscuous,
            &config.filter,
        )?,
    };

    Ok(Box::new(source))
}

#[cfg(not(feature = "libpcap"))]
fn open_source(config: &Config, filter_given: bool) -> Result<Box<dyn PacketSource>, Error> {
    use httpry::capture::FileSource;

    let path = config.input.as_ref().ok_or_else(|| {
        Error::Config("live capture requires building with the `libpcap` feature".to_string())
    })?;
    if filter_given {
        log::warn!(
            "capture filter '{}' ignored, filtering requires the `libpcap` feature",
            config.filter
        );
    }

    Ok(Box::new(FileSource::open(path)?))
}

#[cfg(unix)]
fn setup_signal_handler() {
    for sig in [libc::SIGTERM, libc::SIGINT] {
        unsafe {
            libc::signal(sig, signal_handler as libc::sighandler_t);
        }
    }
}

#[cfg(unix)]
extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN.store(true, std::sync::atomic::Ordering::Relaxed);
}

#[cfg(not(unix))]
fn setup_signal_handler() {}
