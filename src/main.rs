use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use quadspread_rs::dsss::{CodeGenerator, CorrelationMethod, LinkConfig, TrialRunner};
use quadspread_rs::sweep::{SweepOptions, SweepParams, run_sweep};
use quadspread_rs::ui::{SweepProgress, print_banner};
use quadspread_rs::utils::consts::*;
use quadspread_rs::utils::dump::{SweepDump, TrialDump, write_json, write_to_wav};
use quadspread_rs::utils::logging::init_logging;

#[derive(Parser)]
#[command(author, version, about = "Quaternary spread-spectrum link BER simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the four spreading codes
    Codes,
    /// Run one trial and report its bit error rate
    Trial {
        #[command(flatten)]
        link: LinkArgs,
        /// Random seed (drawn from the OS when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Write symbols, BER and correlation traces as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the transmitted waveform as a 16-bit WAV
        #[arg(long)]
        wav: Option<PathBuf>,
    },
    /// Average BER over a range of SNR values
    Sweep {
        #[command(flatten)]
        link: LinkArgs,
        #[arg(long, default_value_t = DEFAULT_SWEEP_FROM_DB, allow_negative_numbers = true)]
        from: f64,
        #[arg(long, default_value_t = DEFAULT_SWEEP_TO_DB, allow_negative_numbers = true)]
        to: f64,
        #[arg(long, default_value_t = DEFAULT_SWEEP_STEP_DB, allow_negative_numbers = true)]
        step: f64,
        /// Trials per SNR point
        #[arg(long, default_value_t = DEFAULT_REPEAT_COUNT)]
        repeat: usize,
        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Write the (snr, ber) series as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LinkArgs {
    /// Sampling frequency [kHz]
    #[arg(long, default_value_t = DEFAULT_SAMPLING_FREQUENCY_KHZ)]
    sampling_frequency: f64,
    /// Sequence length [bits]
    #[arg(long, default_value_t = DEFAULT_SEQUENCE_LENGTH)]
    sequence_length: usize,
    /// Baud rate [chips/sec]
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,
    /// Carrier frequency [kHz]
    #[arg(long, default_value_t = DEFAULT_CARRIER_FREQUENCY_KHZ)]
    carrier_frequency: f64,
    /// SNR [dB]
    #[arg(long, default_value_t = DEFAULT_SNR_DB, allow_negative_numbers = true)]
    snr: f64,
    /// Disable noise injection
    #[arg(long)]
    no_noise: bool,
    /// Correlation algorithm
    #[arg(long, value_enum, default_value_t = MethodArg::Fft)]
    method: MethodArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Fft,
    Direct,
}

impl From<&LinkArgs> for LinkConfig {
    fn from(args: &LinkArgs) -> Self {
        LinkConfig {
            sampling_frequency_khz: args.sampling_frequency,
            sequence_length: args.sequence_length,
            baud_rate: args.baud_rate,
            carrier_frequency_khz: args.carrier_frequency,
            snr_db: args.snr,
            enable_noise: !args.no_noise,
            correlation_method: match args.method {
                MethodArg::Fft => CorrelationMethod::Fft,
                MethodArg::Direct => CorrelationMethod::Direct,
            },
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    print_banner();

    if let Err(err) = run(cli) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Codes => {
            let codes = CodeGenerator::standard().generate()?;
            for (symbol, code) in codes.iter().enumerate() {
                let chips: String = code
                    .iter()
                    .map(|&chip| if chip == 1 { '1' } else { '0' })
                    .collect();
                println!("{symbol}: {chips}");
            }
        }
        Commands::Trial {
            link,
            seed,
            json,
            wav,
        } => {
            let config = LinkConfig::from(&link);
            let mut runner = TrialRunner::new(config.clone())?;
            let seed = seed.unwrap_or_else(rand::random);
            info!("Seed: {}", seed);

            let mut rng = StdRng::seed_from_u64(seed);
            let result = runner.run_trial(&mut rng)?;

            info!("Sent:    {:?}", result.symbols);
            info!("Decoded: {:?}", result.decoded);
            println!(
                "BER {:.5} ({} of {} bits)",
                result.ber,
                result.bit_errors,
                2 * result.symbols.len()
            );

            if let Some(path) = json {
                write_json(&TrialDump::new(&config, seed, &result), &path)?;
                info!("Trial written to {}", path.display());
            }
            if let Some(path) = wav {
                let sample_rate = runner
                    .geometry()
                    .sampling_frequency_hz
                    .round() as u32;
                write_to_wav(&result.transmitted.samples, sample_rate, &path)?;
                info!("Waveform written to {}", path.display());
            }
        }
        Commands::Sweep {
            link,
            from,
            to,
            step,
            repeat,
            workers,
            seed,
            json,
        } => {
            let config = LinkConfig::from(&link);
            let params = SweepParams {
                from_db: from,
                to_db: to,
                step_db: step,
                repeat_count: repeat,
            };
            // fail on bad sweep input before building the link
            let points = params.snr_points()?;
            let runner = TrialRunner::new(config.clone())?;
            if !config.enable_noise {
                warn!("Noise is disabled, every SNR point will report the noiseless BER");
            }

            let mut options = SweepOptions {
                seed,
                ..SweepOptions::default()
            };
            if let Some(workers) = workers {
                options.workers = workers;
            }

            let cancel = Arc::new(AtomicBool::new(false));
            let c = cancel.clone();
            // Ctrl+C stops the sweep between trials
            ctrlc::set_handler(move || {
                c.store(true, Ordering::SeqCst);
            })
            .unwrap_or_else(|err| warn!("Ctrl+C handler not installed: {}", err));

            let progress = SweepProgress::new(points.len() * repeat);
            let report = run_sweep(&runner, &params, &options, &cancel, &progress)?;
            progress.finish(if report.cancelled { "cancelled" } else { "done" });

            println!("{:>10} {:>10}", "SNR[dB]", "BER");
            for point in &report.points {
                println!("{:>10.2} {:>10.5}", point.snr_db, point.average_ber);
            }

            if let Some(path) = json {
                let dump = SweepDump {
                    config: &config,
                    params: &params,
                    seed,
                    report: &report,
                };
                write_json(&dump, &path)?;
                info!("Sweep written to {}", path.display());
            }
        }
    }
    Ok(())
}
