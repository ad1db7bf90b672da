use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use exam_slots::graph::{verify_coloring, ExamId};
use exam_slots::ui::{self, Visualizer};
use exam_slots::utils::csv::{parse_conflict_list, parse_enrollment_csv, schedule_csv_bytes};
use exam_slots::utils::serialization::{
    load_instance, save_instance, ScheduleInstance, ScheduleReport,
};
use exam_slots::utils::synthetic::synthetic_from_config;
use exam_slots::{SchedulePlan, SchedulerConfig, TimetableConfig};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "EXAM_SLOTS_LOG";

#[derive(Parser)]
#[command(author, version, about = "Conflict-free exam timetabling (Welsh-Powell)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log at debug level (overridden by EXAM_SLOTS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic enrollment, schedule it and write the instance to disk
    Generate {
        /// Comma-separated exam names
        #[arg(long, value_delimiter = ',')]
        exams: Option<Vec<String>>,
        #[arg(long)]
        students: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        timetable: TimetableArgs,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Also export the timetable as CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Schedule exams from an enrollment CSV or a manual conflict list
    Schedule {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        timetable: TimetableArgs,
        /// Export destination (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Also store the colored graph as an instance file
        #[arg(long, value_name = "FILE")]
        instance: Option<PathBuf>,
    },
    /// Check that a stored instance is a proper, complete coloring
    Verify {
        #[arg(short, long, value_name = "FILE")]
        instance: PathBuf,
    },
    /// Browse a stored instance in a terminal UI
    Visualize {
        #[arg(short, long, value_name = "FILE")]
        instance: PathBuf,
    },
    /// Serve the scheduler as a JSON API on localhost
    Serve {
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// CSV with `student_id` and `exam` columns
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
    /// One exam or one `exam,exam` conflict per line
    #[arg(long, value_name = "FILE")]
    conflicts: Option<PathBuf>,
}

#[derive(Args)]
struct TimetableArgs {
    /// Hour at which the first slot starts
    #[arg(long)]
    start_hour: Option<u32>,
    /// Slot length in hours
    #[arg(long)]
    slot_duration: Option<u32>,
}

impl TimetableArgs {
    fn apply(&self, base: &TimetableConfig) -> TimetableConfig {
        TimetableConfig {
            start_hour: self.start_hour.unwrap_or(base.start_hour),
            slot_duration: self.slot_duration.unwrap_or(base.slot_duration),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = SchedulerConfig::load_or_default(cli.config.as_ref())?;

    match cli.command {
        Commands::Generate {
            exams,
            students,
            seed,
            timetable,
            output,
            csv,
        } => {
            let mut synthetic = config.synthetic.clone();
            if let Some(exams) = exams {
                synthetic.exams = exams;
            }
            synthetic.students = students.unwrap_or(synthetic.students);
            synthetic.seed = seed.unwrap_or(synthetic.seed);
            run_generate(&synthetic, &timetable.apply(&config.timetable), output, csv)?
        }
        Commands::Schedule {
            source,
            timetable,
            output,
            format,
            instance,
        } => run_schedule(
            source,
            &timetable.apply(&config.timetable),
            output,
            format,
            instance,
        )?,
        Commands::Verify { instance } => run_verify(instance)?,
        Commands::Visualize { instance } => run_visualize(instance)?,
        Commands::Serve { port } => {
            println!("Serving POST /schedule on http://127.0.0.1:{port}");
            ui::serve(port, config.timetable.clone())?
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_generate(
    synthetic: &exam_slots::utils::synthetic::SyntheticConfig,
    timetable: &TimetableConfig,
    output: PathBuf,
    csv: Option<PathBuf>,
) -> CliResult<()> {
    let (enrollment, params) = synthetic_from_config(synthetic);
    println!(
        "Synthetic enrollment: {} exams, {} students (seed {}), {} registrations",
        params.exams, params.students, params.seed, params.registrations
    );
    println!(
        "  students taking 1/2/3 exams: {}/{}/{}",
        params.load_histogram[0], params.load_histogram[1], params.load_histogram[2]
    );

    let started = Instant::now();
    let plan = SchedulePlan::from_enrollment(&enrollment, timetable)?;
    info!(elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0, "schedule computed");
    print_plan(&plan);

    if let Some(csv_path) = csv {
        fs::write(&csv_path, schedule_csv_bytes(&plan.timetable)?)?;
        println!("Timetable CSV written to {}", csv_path.display());
    }
    save_instance(&output, &ScheduleInstance::with_metadata(&plan, params))?;
    println!("Instance saved to {}", output.display());
    Ok(())
}

fn run_schedule(
    source: SourceArgs,
    timetable: &TimetableConfig,
    output: Option<PathBuf>,
    format: ExportFormat,
    instance: Option<PathBuf>,
) -> CliResult<()> {
    let plan = match (source.csv, source.conflicts) {
        (Some(path), _) => {
            let enrollment = parse_enrollment_csv(&fs::read_to_string(&path)?)?;
            info!(
                path = %path.display(),
                students = enrollment.student_count(),
                registrations = enrollment.registration_count(),
                "enrollment loaded"
            );
            SchedulePlan::from_enrollment(&enrollment, timetable)?
        }
        (None, Some(path)) => {
            let graph = parse_conflict_list(&fs::read_to_string(&path)?)?;
            info!(path = %path.display(), exams = graph.node_count(), "conflict list loaded");
            SchedulePlan::from_graph(graph, timetable)?
        }
        (None, None) => return Err("either --csv or --conflicts is required".into()),
    };

    let bytes = match format {
        ExportFormat::Csv => schedule_csv_bytes(&plan.timetable)?,
        ExportFormat::Json => ScheduleReport::from_plan(&plan).to_json_pretty()?.into_bytes(),
    };
    match output {
        Some(path) => {
            print_plan(&plan);
            fs::write(&path, bytes)?;
            println!("Schedule written to {}", path.display());
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }

    if let Some(path) = instance {
        save_instance(&path, &ScheduleInstance::new(&plan))?;
        info!(path = %path.display(), "instance saved");
    }
    Ok(())
}

fn run_verify(instance_path: PathBuf) -> CliResult<()> {
    let instance = load_instance(&instance_path)?;
    verify_coloring(&instance.graph, &instance.coloring)?;
    println!(
        "Coloring verified: {} exams, {} conflicts, {} slots (bound {})",
        instance.graph.node_count(),
        instance.graph.edge_count(),
        instance.coloring.slot_count(),
        instance.graph.max_degree() + 1
    );
    println!("Fingerprint: {}", instance.coloring.fingerprint());
    Ok(())
}

fn run_visualize(instance_path: PathBuf) -> CliResult<()> {
    let instance = load_instance(&instance_path)?;
    verify_coloring(&instance.graph, &instance.coloring)?;
    let mut visualizer = Visualizer::for_instance(&instance)?;
    visualizer.log(format!("Loaded instance from {}", instance_path.display()))?;
    if let Some(meta) = &instance.metadata {
        visualizer.log(format!(
            "Synthetic: {} students, seed {}, {} registrations",
            meta.students, meta.seed, meta.registrations
        ))?;
    }
    visualizer.wait_for_exit("Press q or Esc to exit.")?;
    println!("Visualization finished.");
    Ok(())
}

fn print_plan(plan: &SchedulePlan) {
    let busiest = plan
        .graph
        .exams()
        .iter()
        .max_by_key(|exam| plan.graph.degree_of(exam).unwrap_or(0))
        .map(ExamId::to_string)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Conflict graph: {} exams, {} conflicts, max degree {} ({busiest})",
        plan.graph.node_count(),
        plan.graph.edge_count(),
        plan.graph.max_degree()
    );
    println!(
        "Slots used: {} (fingerprint {})",
        plan.coloring.slot_count(),
        plan.coloring.fingerprint()
    );
    println!();
    print!("{}", plan.timetable.render_gantt());
    println!();
}
