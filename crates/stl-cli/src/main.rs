mod cases;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use stl_core::{
    Audit, AuditReport, AuditRequest, ClassifierParams, DominanceSample, IceSpec, RunDeclaration,
    StressSpec, TraceSummary, audit, classify, content_id, drawdown_trace, ice_like_trace, laws,
    negctl_trace, raw_trace_csv, run_pipeline, sample_trace, threshold_stress_trace,
};
use stl_report::{
    Artifact, DatasetSection, NaiveSection, ParamsSection, RunConfig, audit_artifacts,
    classifier_artifacts, drawdown_artifact, law_artifacts, raw_trace_artifact,
    read_collapse_csv, read_dominance_csv, read_price_table, write_artifacts,
};

#[derive(Parser)]
#[command(
    name = "stl",
    about = "Stability-aware T5 classifier, operator law checks and SAD(P) audits"
)]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Classifier parameters; unset values come from the run file or defaults.
#[derive(Args, Clone, Debug, Default)]
struct ParamArgs {
    /// Stability window W (>= 1)
    #[arg(long = "w", allow_negative_numbers = true)]
    w: Option<i64>,

    /// Stable-TRUE threshold
    #[arg(long)]
    tau_s: Option<f64>,

    /// Stable-FALSE threshold
    #[arg(long)]
    tau_l: Option<f64>,

    /// Derivative deadband
    #[arg(long)]
    eps: Option<f64>,
}

impl ParamArgs {
    fn section(&self) -> ParamsSection {
        ParamsSection {
            w: self.w,
            tau_s: self.tau_s,
            tau_l: self.tau_l,
            eps: self.eps,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a t,d trace into T5 states
    Classify {
        /// Input CSV with t,d columns
        #[arg(long, required_unless_present = "make_sample")]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Write a demo input trace instead of classifying
        #[arg(long, conflicts_with = "input")]
        make_sample: bool,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Audit a naive Boolean rule against the classifier (SAD(P))
    Audit(AuditArgs),

    /// Check the operator laws and write the law tables
    Algebra {
        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Generate a synthetic t,d trace
    Synth {
        #[command(subcommand)]
        kind: SynthKind,
    },

    /// Map a closing-price table onto a drawdown dominance trace
    Drawdown {
        /// Tab- or comma-separated price table
        #[arg(long)]
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Rolling-peak lookback in rows
        #[arg(long, default_value_t = 252)]
        lookback: usize,

        /// Drawdown mapped to d = 1
        #[arg(long, default_value_t = 0.20)]
        dd_scale: f64,

        #[arg(long, default_value = "Close")]
        close_col: String,

        #[arg(long, default_value = "Date")]
        date_col: String,
    },

    /// Run the verification case set, optionally twice with a replay check
    Verify {
        /// Output directory (cases go under stl_verify_out/)
        #[arg(long)]
        out_dir: PathBuf,

        /// Render REPLAY_A and REPLAY_B and compare them file by file
        #[arg(long)]
        replay: bool,

        /// Which replay directory a single run writes
        #[arg(long, value_enum, default_value_t = RunId::A)]
        run_id: RunId,
    },
}

#[derive(Args)]
struct AuditArgs {
    /// Raw t,d trace the naive rule is evaluated on
    #[arg(long)]
    input: PathBuf,

    /// Output directory
    #[arg(long)]
    out_dir: PathBuf,

    /// Previously exported classified trace; classified in-process when absent
    #[arg(long)]
    trace: Option<PathBuf>,

    /// TOML run file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    params: ParamArgs,

    /// Naive policy: threshold or debounced
    #[arg(long)]
    policy: Option<String>,

    /// Threshold rule such as 'd>=0.5'
    #[arg(long, conflicts_with_all = ["mode", "threshold"])]
    rule: Option<String>,

    /// Comparison mode: ge, gt, le or lt
    #[arg(long)]
    mode: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Which transitions count: enter_true, enter_false or any_change
    #[arg(long)]
    events: Option<String>,

    /// Free-text description of the naive rule
    #[arg(long)]
    naive_label: Option<String>,

    #[arg(long)]
    dataset_name: Option<String>,

    #[arg(long)]
    dataset_source: Option<String>,

    #[arg(long)]
    adapter_name: Option<String>,

    #[arg(long)]
    proposition: Option<String>,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl AuditArgs {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            params: self.params.section(),
            dataset: DatasetSection {
                name: self.dataset_name.clone(),
                source: self.dataset_source.clone(),
                adapter: self.adapter_name.clone(),
                proposition: self.proposition.clone(),
            },
            naive: NaiveSection {
                policy: self.policy.clone(),
                rule: self.rule.clone(),
                mode: self.mode.clone(),
                threshold: self.threshold,
                events: self.events.clone(),
                label: self.naive_label.clone(),
            },
        }
    }
}

#[derive(Subcommand)]
enum SynthKind {
    /// Flat, ramp, plateau, ramp, flat
    Negctl {
        #[arg(long)]
        out_dir: PathBuf,

        /// Time step between samples
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
    },

    /// Holds one sample short of the window around both thresholds
    ThresholdStress {
        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long, default_value_t = 0.0)]
        t0: f64,

        #[arg(long, default_value_t = 1.0)]
        dt: f64,

        #[arg(long, default_value_t = 0.95)]
        tau_s: f64,

        #[arg(long, default_value_t = 0.05)]
        tau_l: f64,

        #[arg(long, default_value_t = 4)]
        cycles: usize,

        #[arg(long, default_value_t = 9)]
        hold_short: usize,

        #[arg(long, default_value_t = 11)]
        hold_long: usize,

        #[arg(long, default_value_t = 0.01)]
        step: f64,
    },

    /// Pre-plateau, abrupt solid phase, abrupt liquid phase
    IceLike {
        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long, default_value_t = 40)]
        pre_len: usize,

        #[arg(long, default_value_t = 30)]
        solid_len: usize,

        #[arg(long, default_value_t = 30)]
        liquid_len: usize,

        #[arg(long, default_value_t = 0.10)]
        d_pre: f64,

        #[arg(long, default_value_t = 0.98)]
        d_solid: f64,

        #[arg(long, default_value_t = 0.02)]
        d_liquid: f64,

        #[arg(long, default_value_t = 2)]
        jump_steps: usize,
    },

    /// The demo trace written by `classify --make-sample`
    Sample {
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RunId {
    #[value(name = "A")]
    A,
    #[value(name = "B")]
    B,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Classify {
            input,
            out_dir,
            make_sample,
            params,
        } => cmd_classify(input.as_deref(), out_dir, *make_sample, params),
        Commands::Audit(args) => cmd_audit(args),
        Commands::Algebra { out_dir } => cmd_algebra(out_dir),
        Commands::Synth { kind } => cmd_synth(kind),
        Commands::Drawdown {
            input,
            out_dir,
            lookback,
            dd_scale,
            close_col,
            date_col,
        } => cmd_drawdown(input, out_dir, *lookback, *dd_scale, close_col, date_col),
        Commands::Verify {
            out_dir,
            replay,
            run_id,
        } => cmd_verify(out_dir, *replay, *run_id),
    }
}

fn write_run(out_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    write_artifacts(out_dir, artifacts)
        .with_context(|| format!("failed to write artifacts to {}", out_dir.display()))?;
    for a in artifacts {
        println!("WROTE: {}", out_dir.join(&a.rel_path).display());
    }
    println!("WROTE: {}", out_dir.join(stl_report::MANIFEST).display());
    Ok(())
}

fn cmd_classify(
    input: Option<&Path>,
    out_dir: &Path,
    make_sample: bool,
    params: &ParamArgs,
) -> Result<()> {
    if make_sample {
        return write_run(out_dir, &[raw_trace_artifact("sample_input.csv", &sample_trace())]);
    }
    let Some(input) = input else {
        bail!("either --input or --make-sample is required");
    };

    let params = params
        .section()
        .resolve(ClassifierParams::default())
        .context("invalid classifier parameters")?;
    let raw = read_dominance_csv(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    tracing::debug!(?params, rows = raw.len(), "classifying");

    let trace = classify(&raw, &params).context("classification failed")?;
    let summary = TraceSummary::from_trace(&trace);
    write_run(out_dir, &classifier_artifacts(&trace, &params))?;
    println!(
        "rows={} S={} Zstar={} transitional={}",
        summary.rows,
        summary.s,
        summary.zstar,
        summary.z0 + summary.eplus + summary.eminus
    );
    Ok(())
}

fn cmd_audit(args: &AuditArgs) -> Result<()> {
    let file = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    let config = file.overlay(&args.overrides());
    // An exported trace carries no parameters, so the declaration can only
    // record what the caller states.
    if args.trace.is_some() {
        let missing = config.params.missing();
        if !missing.is_empty() {
            bail!(
                "--trace requires the parameters that produced the trace; missing: {}",
                missing.join(", ")
            );
        }
    }
    let params = config
        .params
        .resolve(ClassifierParams::default())
        .context("invalid classifier parameters")?;
    let naive = config
        .naive
        .resolve(params)
        .context("invalid naive Boolean settings")?;

    let raw = read_dominance_csv(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let report = match &args.trace {
        None => {
            let request = AuditRequest {
                dataset: config.dataset.resolve(),
                params,
                policy: naive.policy,
                events: naive.events,
                naive_label: naive.label,
            };
            run_pipeline(&raw, &request).context("audit failed")?.report
        }
        Some(trace_path) => {
            let points = read_collapse_csv(trace_path)
                .with_context(|| format!("failed to read {}", trace_path.display()))?;
            let trace_bytes = std::fs::read(trace_path)
                .with_context(|| format!("failed to read {}", trace_path.display()))?;
            let values = naive.policy.evaluate(&raw);
            let outcome: Audit =
                audit(&raw, &points, &values, naive.events).context("audit failed")?;
            let declaration = RunDeclaration {
                dataset: config.dataset.resolve(),
                params,
                policy: naive.policy,
                naive_rule: naive.label.unwrap_or_else(|| naive.policy.to_string()),
                events: naive.events,
                raw_trace_id: content_id(raw_trace_csv(&raw).as_bytes()),
                classified_trace_id: content_id(&trace_bytes),
            };
            AuditReport::new(declaration, outcome)
        }
    };

    let artifacts = audit_artifacts(&report).context("failed to render SAD tables")?;
    write_artifacts(&args.out_dir, &artifacts)
        .with_context(|| format!("failed to write artifacts to {}", args.out_dir.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        let acc = &report.accounting;
        println!("E_total:     {}", acc.e_total);
        println!("E_premature: {}", acc.e_premature);
        println!("E_aligned:   {}", acc.e_aligned);
        println!("SAD(P):      {}", acc.sad);
        println!("wrote {}", args.out_dir.display());
    }
    Ok(())
}

fn cmd_algebra(out_dir: &Path) -> Result<()> {
    let tables = laws::all_tables();
    write_run(out_dir, &law_artifacts(&tables).context("failed to render law tables")?)?;

    let mut failed = 0;
    for table in &tables {
        let n = table.failures().count();
        println!("{}: {}/{} passed", table.name, table.checks.len() - n, table.checks.len());
        failed += n;
    }
    if failed > 0 {
        bail!("{failed} operator law checks failed");
    }
    println!("OVERALL: PASS");
    Ok(())
}

fn synth_run(out_dir: &Path, name: &str, trace: &[DominanceSample]) -> Result<()> {
    tracing::debug!(rows = trace.len(), "generated {name}");
    write_run(out_dir, &[raw_trace_artifact(name, trace)])
}

fn cmd_synth(kind: &SynthKind) -> Result<()> {
    match kind {
        SynthKind::Negctl { out_dir, dt } => {
            let trace = negctl_trace(*dt).context("invalid negctl arguments")?;
            synth_run(out_dir, "negctl_input.csv", &trace)
        }
        SynthKind::ThresholdStress {
            out_dir,
            t0,
            dt,
            tau_s,
            tau_l,
            cycles,
            hold_short,
            hold_long,
            step,
        } => {
            let spec = StressSpec {
                t0: *t0,
                dt: *dt,
                tau_s: *tau_s,
                tau_l: *tau_l,
                cycles: *cycles,
                hold_short: *hold_short,
                hold_long: *hold_long,
                step: *step,
            };
            let trace =
                threshold_stress_trace(&spec).context("invalid threshold-stress arguments")?;
            synth_run(out_dir, "threshold_stress_input.csv", &trace)
        }
        SynthKind::IceLike {
            out_dir,
            pre_len,
            solid_len,
            liquid_len,
            d_pre,
            d_solid,
            d_liquid,
            jump_steps,
        } => {
            let spec = IceSpec {
                pre_len: *pre_len,
                solid_len: *solid_len,
                liquid_len: *liquid_len,
                d_pre: *d_pre,
                d_solid: *d_solid,
                d_liquid: *d_liquid,
                jump_steps: *jump_steps,
                ..IceSpec::default()
            };
            let trace = ice_like_trace(&spec).context("invalid ice-like arguments")?;
            synth_run(out_dir, "ice_like_input.csv", &trace)
        }
        SynthKind::Sample { out_dir } => synth_run(out_dir, "sample_input.csv", &sample_trace()),
    }
}

fn cmd_drawdown(
    input: &Path,
    out_dir: &Path,
    lookback: usize,
    dd_scale: f64,
    close_col: &str,
    date_col: &str,
) -> Result<()> {
    let prices = read_price_table(input, date_col, close_col)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let rows = drawdown_trace(&closes, lookback, dd_scale).context("drawdown adapter failed")?;
    tracing::debug!(rows = rows.len(), lookback, dd_scale, "adapted price table");

    let artifact = drawdown_artifact(&rows).context("failed to render adapter output")?;
    write_run(out_dir, &[artifact])?;
    if let (Some(first), Some(last)) = (prices.first(), prices.last()) {
        println!("rows={} dates={}..{}", rows.len(), first.date, last.date);
    }
    Ok(())
}

fn cmd_verify(out_dir: &Path, replay: bool, run_id: RunId) -> Result<()> {
    let base = out_dir.join("stl_verify_out");
    if replay {
        let a = base.join("REPLAY_A");
        let b = base.join("REPLAY_B");
        cases::run_caseset(&a)?;
        cases::run_caseset(&b)?;
        let diffs = stl_report::compare_trees(&a, &b).context("failed to compare replays")?;
        for d in &diffs {
            eprintln!("{d}");
        }
        if !diffs.is_empty() {
            println!("VERIFY_REPLAY: FAIL");
            bail!("replay trees differ in {} files", diffs.len());
        }
        println!("VERIFY_REPLAY: PASS");
        return Ok(());
    }

    let dir = base.join(match run_id {
        RunId::A => "REPLAY_A",
        RunId::B => "REPLAY_B",
    });
    cases::run_caseset(&dir)?;
    println!("OK: STL verification complete");
    Ok(())
}
