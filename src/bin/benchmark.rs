use clap::Parser;
use std::time::Instant;
use exam_slots::graph::{verify_coloring, ConflictGraphBuilder, ExamId, GreedyColorer};
use exam_slots::utils::serialization::ScheduleInstance;
use exam_slots::utils::synthetic::synthetic_enrollment;
use exam_slots::{SchedulePlan, Timetable, TimetableConfig};

#[cfg(target_os = "windows")]
use windows::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::GetCurrentProcess;

struct BenchmarkResult {
    exams: u32,
    students: u32,
    conflicts: usize,
    max_degree: usize,
    slots: u32,
    generate_time_ms: f64,
    build_time_ms: f64,
    color_time_ms: f64,
    timetable_time_ms: f64,
    verify_time_ms: f64,
    memory_peak_mb: f64,
    instance_size_bytes: usize,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Benchmark runner for conflict graph construction and Welsh-Powell coloring"
)]
struct BenchmarkCli {
    /// Comma-separated list of exam counts to benchmark (e.g. 50,200,1000)
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32))]
    exams: Option<Vec<u32>>,
    /// Comma-separated list of student counts to benchmark (e.g. 1000,10000)
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32))]
    students: Option<Vec<u32>>,
    /// Seed for the synthetic enrollments (default: 42)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let cli = BenchmarkCli::parse();
    println!("=== Exam Slot Scheduling Benchmark Suite ===\n");

    let exam_sizes = cli.exams.unwrap_or_else(|| vec![50, 100, 200, 400]);
    let student_counts = cli.students.unwrap_or_else(|| vec![1_000, 10_000]);
    let seed = cli.seed.unwrap_or(42);

    let mut all_results = Vec::new();

    for &exams in &exam_sizes {
        for &students in &student_counts {
            println!("Benchmarking {} exams, {} students", exams, students);

            match run_benchmark(exams, students, seed) {
                Ok(result) => {
                    print_result(&result);
                    all_results.push(result);
                }
                Err(e) => {
                    eprintln!("  ✗ Benchmark failed: {}", e);
                }
            }
            println!();
        }
    }

    println!("\n=== Summary Report ===\n");
    print_summary_table(&all_results);
    print_scaling_analysis(&all_results, &student_counts);
}

fn run_benchmark(
    exams: u32,
    students: u32,
    seed: u64,
) -> Result<BenchmarkResult, Box<dyn std::error::Error>> {
    let exam_ids: Vec<ExamId> = (0..exams).map(|i| ExamId::new(format!("E{i:05}"))).collect();
    let config = TimetableConfig::default();

    let mem_before = get_memory_usage();

    let generate_start = Instant::now();
    let (enrollment, _params) = synthetic_enrollment(&exam_ids, students, seed);
    let generate_time = generate_start.elapsed();

    let build_start = Instant::now();
    let graph = ConflictGraphBuilder::build(&enrollment)?;
    let build_time = build_start.elapsed();

    let color_start = Instant::now();
    let coloring = GreedyColorer::color(&graph)?;
    let color_time = color_start.elapsed();

    let timetable_start = Instant::now();
    let timetable = Timetable::from_coloring(&coloring, &config)?;
    let timetable_time = timetable_start.elapsed();

    let verify_start = Instant::now();
    verify_coloring(&graph, &coloring)?;
    let verify_time = verify_start.elapsed();

    if coloring.slot_count() as usize > graph.max_degree() + 1 {
        return Err("slot count exceeds max degree + 1".into());
    }

    let mem_after = get_memory_usage();
    let memory_used = (mem_after - mem_before).max(0.0);

    let conflicts = graph.edge_count();
    let max_degree = graph.max_degree();
    let slots = coloring.slot_count();
    let plan = SchedulePlan {
        graph,
        coloring,
        timetable,
    };
    let instance_size = bincode::serialized_size(&ScheduleInstance::new(&plan))? as usize;

    Ok(BenchmarkResult {
        exams,
        students,
        conflicts,
        max_degree,
        slots,
        generate_time_ms: generate_time.as_secs_f64() * 1000.0,
        build_time_ms: build_time.as_secs_f64() * 1000.0,
        color_time_ms: color_time.as_secs_f64() * 1000.0,
        timetable_time_ms: timetable_time.as_secs_f64() * 1000.0,
        verify_time_ms: verify_time.as_secs_f64() * 1000.0,
        memory_peak_mb: memory_used,
        instance_size_bytes: instance_size,
    })
}

#[cfg(target_os = "windows")]
fn get_memory_usage() -> f64 {
    unsafe {
        let process = GetCurrentProcess();
        let mut pmc = PROCESS_MEMORY_COUNTERS::default();
        pmc.cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;

        if GetProcessMemoryInfo(process, &mut pmc, pmc.cb).is_ok() {
            pmc.WorkingSetSize as f64 / (1024.0 * 1024.0)
        } else {
            0.0
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn get_memory_usage() -> f64 {
    0.0
}

fn print_result(result: &BenchmarkResult) {
    println!(
        "  ✓ Conflict graph:   {} conflicts, max degree {}",
        result.conflicts, result.max_degree
    );
    println!(
        "  ✓ Slots used:       {} (bound {})",
        result.slots,
        result.max_degree + 1
    );
    println!("  ✓ Generate time:    {:.2} ms", result.generate_time_ms);
    println!("  ✓ Build time:       {:.2} ms", result.build_time_ms);
    println!(
        "  ✓ Color time:       {:.2} ms (timetable {:.2} ms, verify {:.2} ms)",
        result.color_time_ms, result.timetable_time_ms, result.verify_time_ms
    );
    println!("  ✓ Memory used:      {:.2} MB", result.memory_peak_mb);
    println!(
        "  ✓ Instance size:    {:.2} KB",
        result.instance_size_bytes as f64 / 1024.0
    );
}

fn print_summary_table(results: &[BenchmarkResult]) {
    println!(
        "{:<7} {:<9} {:<10} {:<7} {:<6} {:<12} {:<12} {:<12} {:<12}",
        "Exams",
        "Students",
        "Conflicts",
        "MaxDeg",
        "Slots",
        "Build(ms)",
        "Color(ms)",
        "Verify(ms)",
        "Inst(KB)"
    );
    println!("{}", "-".repeat(95));

    for result in results {
        println!(
            "{:<7} {:<9} {:<10} {:<7} {:<6} {:<12.2} {:<12.2} {:<12.2} {:<12.2}",
            result.exams,
            result.students,
            result.conflicts,
            result.max_degree,
            result.slots,
            result.build_time_ms,
            result.color_time_ms,
            result.verify_time_ms,
            result.instance_size_bytes as f64 / 1024.0
        );
    }
}

fn print_scaling_analysis(results: &[BenchmarkResult], student_counts: &[u32]) {
    println!("\n=== Scaling Analysis ===\n");

    for &students in student_counts {
        println!("Students: {}", students);

        let filtered: Vec<_> = results.iter().filter(|r| r.students == students).collect();

        if filtered.len() >= 2 {
            let first = filtered[0];
            let last = filtered[filtered.len() - 1];

            let build_ratio = last.build_time_ms / first.build_time_ms;
            let color_ratio = last.color_time_ms / first.color_time_ms;
            let edge_ratio = last.conflicts.max(1) as f64 / first.conflicts.max(1) as f64;
            let exam_ratio = last.exams as f64 / first.exams as f64;

            println!(
                "  Exams: {} → {} ({}x increase)",
                first.exams, last.exams, exam_ratio
            );
            println!("  Build time scaling:    {:.2}x", build_ratio);
            println!("  Color time scaling:    {:.2}x", color_ratio);
            println!("  Conflict count scaling: {:.2}x", edge_ratio);

            if exam_ratio > 1.0 {
                println!(
                    "  Estimated color complexity: O(n^{:.2})",
                    color_ratio.log(exam_ratio)
                );
            }
        }
        println!();
    }
}
