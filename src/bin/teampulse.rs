use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use teampulse::insights::Severity;
use teampulse::metrics::{self, KpiMetrics, RiskReason};
use teampulse::{glossary, DashboardConfig, Insight, TeamSnapshot};

#[derive(Parser)]
#[command(name = "teampulse", about = "Team delivery metrics CLI")]
struct Cli {
    /// Snapshot JSON file exported from the tracker
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Config file path (default: ~/.teampulse/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI summary and insights for the current cycle
    Overview {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Completed vs. total points per cycle
    Velocity {
        #[arg(long)]
        json: bool,
    },
    /// Daily burndown for a cycle (default: the one in progress)
    Burndown {
        /// Cycle number
        #[arg(long)]
        cycle: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Per-member workload
    Team {
        #[arg(long)]
        json: bool,
    },
    /// Cumulative flow and status dwell times
    Flow {
        /// Trailing window in days (default from config)
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Lead-time distribution and recent completions
    Leadtime {
        /// Histogram bin count (default from config)
        #[arg(long)]
        bins: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Open issues needing attention
    Risks {
        #[arg(long)]
        json: bool,
    },
    /// Advisory messages from the rule engine
    Insights {
        #[arg(long)]
        json: bool,
    },
    /// Project status listing
    Projects {
        #[arg(long)]
        json: bool,
    },
    /// Look up a glossary term, or list all terms
    Glossary {
        /// Term to look up
        term: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => DashboardConfig::default_path()?,
    };
    let config = DashboardConfig::load_or_default(&config_path);

    match cli.command {
        Commands::Config { action } => handle_config(&config_path, config, action),
        Commands::Glossary { term } => {
            handle_glossary(term.as_deref());
            Ok(())
        }
        command => {
            let path = cli.snapshot.as_deref().ok_or_else(|| {
                anyhow::anyhow!("--snapshot <FILE> is required for this command")
            })?;
            let snapshot = TeamSnapshot::load(path)?;
            run_metrics_command(command, &snapshot, &config)
        }
    }
}

fn run_metrics_command(
    command: Commands,
    snapshot: &TeamSnapshot,
    config: &DashboardConfig,
) -> anyhow::Result<()> {
    let now = Utc::now();

    match command {
        Commands::Overview { json } => {
            let current = snapshot.current_cycle(now);
            let previous = current.and_then(|c| snapshot.previous_cycle(c));
            let kpi = metrics::kpi_metrics(&snapshot.issues, current, previous, now);
            let creep = current.map(metrics::scope_creep).unwrap_or(0.0);
            let insights = teampulse::generate_insights(
                &kpi,
                creep,
                &snapshot.issues,
                &snapshot.team.members,
            );

            if json {
                let out = serde_json::json!({
                    "kpis": kpi,
                    "scopeCreep": creep,
                    "insights": insights,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Team: {} ({})", snapshot.team.name, snapshot.team.key);
                match current {
                    Some(cycle) => println!("Cycle: {}", cycle.display_name()),
                    None => println!("Cycle: none in progress"),
                }
                print_kpis(&kpi, creep);
                println!();
                print_insights(&insights);
            }
        }
        Commands::Velocity { json } => {
            let sorted: Vec<teampulse::Cycle> =
                snapshot.sorted_cycles().into_iter().cloned().collect();
            let points = metrics::velocity_series(&sorted);
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else if points.is_empty() {
                println!("No cycles in snapshot.");
            } else {
                for p in &points {
                    println!(
                        "{:24} {:>3}/{:<3} points  {:>3}/{:<3} issues",
                        p.cycle_name,
                        p.completed_points,
                        p.total_points,
                        p.completed_issues,
                        p.total_issues
                    );
                }
            }
        }
        Commands::Burndown { cycle, json } => {
            let cycle = match cycle {
                Some(n) => snapshot
                    .cycle_by_number(n)
                    .ok_or_else(|| anyhow::anyhow!("no cycle numbered {n} in snapshot"))?,
                None => snapshot.current_cycle(now).ok_or_else(|| {
                    anyhow::anyhow!("no cycle in progress; pass --cycle <N>")
                })?,
            };
            let series = metrics::burndown_series(cycle);
            let creep = metrics::scope_creep(cycle);

            if json {
                let out = serde_json::json!({
                    "cycle": cycle.display_name(),
                    "scopeCreep": creep,
                    "series": series,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} (scope creep {creep:+.1}%)", cycle.display_name());
                if series.is_empty() {
                    println!("  Not enough history for a burndown.");
                }
                for p in &series {
                    println!(
                        "  Day {:>2}  {}  remaining {:>4}  ideal {:>6.1}  in progress {:>3}",
                        p.day, p.date, p.remaining, p.ideal, p.in_progress
                    );
                }
            }
        }
        Commands::Team { json } => {
            let workload = metrics::member_workload(&snapshot.issues, &snapshot.team.members);
            if json {
                println!("{}", serde_json::to_string_pretty(&workload)?);
            } else if workload.is_empty() {
                println!("No members in snapshot.");
            } else {
                for w in &workload {
                    let avg = w
                        .average_cycle_time
                        .map(|d| format!("{d:.1} days avg cycle time"))
                        .unwrap_or_else(|| "no completions".to_string());
                    println!(
                        "{:20} {:>3} assigned  {:>3} done  {:>3} in progress  {:>5.1}/{:<5.1} pts  {avg}",
                        w.user.name,
                        w.assigned_count,
                        w.completed_count,
                        w.in_progress_count,
                        w.completed_estimate,
                        w.total_estimate
                    );
                }
            }
        }
        Commands::Flow { days, json } => {
            let days = days.unwrap_or(config.cfd_window_days);
            let cfd = metrics::cumulative_flow(&snapshot.issues, &snapshot.team.states, days, now);
            let dwell = metrics::status_dwell_times(&snapshot.issues, &snapshot.team.states);

            if json {
                let out = serde_json::json!({ "cfd": cfd, "dwell": dwell });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Status dwell times");
                for d in &dwell {
                    let marker = if d.is_anomaly { "  <- bottleneck" } else { "" };
                    println!(
                        "  {:20} {:>5.1} days avg  {:>3} issues{marker}",
                        d.name, d.average_days, d.issue_count
                    );
                }
                if let Some(point) = cfd.points.last() {
                    println!("\nFlow today ({} day window)", days);
                    for name in &cfd.state_names {
                        let count = point.counts.get(name).copied().unwrap_or(0);
                        println!("  {name:20} {count:>4}");
                    }
                }
            }
        }
        Commands::Leadtime { bins, json } => {
            let bins = bins.unwrap_or(config.histogram_bins);
            let histogram = metrics::lead_time_histogram(&snapshot.issues, bins);
            let scatter = metrics::cycle_time_scatter(&snapshot.issues);

            if json {
                let out = serde_json::json!({ "histogram": histogram, "scatter": scatter });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if histogram.bins.is_empty() {
                println!("No completed issues with a nonzero lead time.");
            } else {
                println!(
                    "Lead time: median {:.1}  p85 {:.1}  p95 {:.1} (business days)",
                    histogram.median, histogram.p85, histogram.p95
                );
                for bin in &histogram.bins {
                    println!("  {:>7} days  {:>4}  {}", bin.range, bin.count, "#".repeat(bin.count as usize));
                }
                println!("\nRecent completions");
                for p in scatter.iter().rev().take(10) {
                    println!(
                        "  {}  {:10} {} ({} days)",
                        p.completed_at.date_naive(),
                        p.identifier,
                        p.title,
                        p.cycle_time_days
                    );
                }
            }
        }
        Commands::Risks { json } => {
            let risks = metrics::detect_risks(&snapshot.issues, now);
            if json {
                println!("{}", serde_json::to_string_pretty(&risks)?);
            } else if risks.is_empty() {
                println!("No risk flags.");
            } else {
                for r in &risks {
                    println!(
                        "[{}] {:10} {} - {}",
                        reason_label(r.reason),
                        r.identifier,
                        r.title,
                        r.detail
                    );
                }
                println!("\n{} flags", risks.len());
            }
        }
        Commands::Insights { json } => {
            let current = snapshot.current_cycle(now);
            let previous = current.and_then(|c| snapshot.previous_cycle(c));
            let kpi = metrics::kpi_metrics(&snapshot.issues, current, previous, now);
            let creep = current.map(metrics::scope_creep).unwrap_or(0.0);
            let insights = teampulse::generate_insights(
                &kpi,
                creep,
                &snapshot.issues,
                &snapshot.team.members,
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                print_insights(&insights);
            }
        }
        Commands::Projects { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.projects)?);
            } else if snapshot.projects.is_empty() {
                println!("No projects in snapshot.");
            } else {
                for p in &snapshot.projects {
                    let lead = p
                        .lead
                        .as_ref()
                        .map(|u| u.name.as_str())
                        .unwrap_or("unassigned");
                    let target = p
                        .target_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "no target".to_string());
                    println!(
                        "[{:?}] {} - {:.0}% - lead: {lead} - target: {target}",
                        p.state,
                        p.name,
                        p.progress * 100.0
                    );
                }
            }
        }
        // Handled in main before the snapshot is loaded.
        Commands::Glossary { .. } | Commands::Config { .. } => unreachable!(),
    }

    Ok(())
}

fn handle_glossary(term: Option<&str>) {
    match term {
        Some(term) => match glossary::definition(term) {
            Some(definition) => {
                println!("{term}");
                println!("  {definition}");
            }
            None => println!("No glossary entry for \"{term}\"."),
        },
        None => {
            for (term, _) in glossary::GLOSSARY {
                println!("{term}");
            }
        }
    }
}

fn handle_config(
    path: &std::path::Path,
    mut config: DashboardConfig,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{key} = {value}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save(path)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            for (key, value) in config.entries() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

fn print_kpis(kpi: &KpiMetrics, scope_creep: f64) {
    println!("KPIs");
    println!(
        "  Completion rate:   {:.1}%{}",
        kpi.completion_rate,
        trend(kpi.previous_completion_rate, "%")
    );
    println!(
        "  Avg cycle time:    {:.1} business days{}",
        kpi.average_cycle_time,
        trend(kpi.previous_average_cycle_time, "")
    );
    println!(
        "  Weekly throughput: {} issues (prev {})",
        kpi.weekly_throughput, kpi.previous_weekly_throughput
    );
    println!("  Carryover rate:    {:.1}%", kpi.carryover_rate);
    println!("  Scope creep:       {scope_creep:+.1}%");
}

fn trend(previous: Option<f64>, unit: &str) -> String {
    previous
        .map(|p| format!(" (prev {p:.1}{unit})"))
        .unwrap_or_default()
}

fn print_insights(insights: &[Insight]) {
    println!("Insights");
    for insight in insights {
        println!(
            "  [{}] {}: {}",
            severity_label(insight.severity),
            insight.title,
            insight.message
        );
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Danger => "danger",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::Success => "success",
    }
}

fn reason_label(reason: RiskReason) -> &'static str {
    match reason {
        RiskReason::Overdue => "overdue",
        RiskReason::StaleWip => "stale wip",
        RiskReason::HighPriorityUnstarted => "high priority unstarted",
    }
}
