//! safe-apply CLI entrypoint.
//!
//! This is the main entrypoint for the safe-apply command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use safe_apply::cli::{read_input, Cli, Commands, OutputFormatter, PlanInputs};
use safe_apply::config::{ConfigParser, ConfigValidator, DeploymentConfig};
use safe_apply::error::Result;
use safe_apply::planner::{parse_plan_output, DependencyGraph, Plan, Planner, ROOT};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// Logs go to stderr so stdout stays usable for `-target` flags.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Plan { inputs, targets } => {
            cmd_plan(cli.config.as_ref(), &inputs, targets, &formatter)
        }
        Commands::Targets {
            inputs,
            fail_on_deferred,
        } => cmd_targets(cli.config.as_ref(), &inputs, fail_on_deferred, &formatter),
        Commands::Changes { changes } => cmd_changes(&changes, &formatter),
        Commands::Graph {
            graph,
            address,
            from,
        } => cmd_graph(&graph, &address, from.as_deref(), &formatter),
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
    }
}

/// Build the plan and print the report.
fn cmd_plan(
    config_path: Option<&PathBuf>,
    inputs: &PlanInputs,
    print_targets: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let plan = build_plan(config_path, inputs)?;

    let output = formatter.format_plan(&plan);
    eprint!("{output}");

    if print_targets {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", formatter.format_targets(&plan))?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Print only the target flags for the next apply.
fn cmd_targets(
    config_path: Option<&PathBuf>,
    inputs: &PlanInputs,
    fail_on_deferred: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let plan = build_plan(config_path, inputs)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", formatter.format_targets(&plan))?;

    if plan.has_unpicked_resources() {
        warn!(
            "{} changes deferred to a later apply",
            plan.deferred_items().len()
        );
        if fail_on_deferred {
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Show the changes parsed from the plan output.
fn cmd_changes(changes_path: &Path, formatter: &OutputFormatter) -> Result<ExitCode> {
    let text = read_input(changes_path)?;
    let changes = parse_plan_output(&text);
    debug!("Parsed {} changes", changes.total());

    eprint!("{}", formatter.format_changes(&changes));
    Ok(ExitCode::SUCCESS)
}

/// Show the dependency path to a resource.
fn cmd_graph(
    graph_path: &Path,
    address: &str,
    from: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let graph = load_graph(graph_path)?;
    let path = graph.shortest_path(from.unwrap_or(ROOT), address)?;

    eprint!("{}", formatter.format_path(&path));
    Ok(ExitCode::SUCCESS)
}

/// Validate the deployment declaration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let parser = config_parser(config_path)?;
    info!("Validating deployment: {}", parser.path().display());

    let config = parser.load_with_env()?;
    let result = ConfigValidator::new().check(&config);

    eprint!("{}", formatter.format_validation(&result, show_warnings));

    if !result.is_valid() {
        return Ok(ExitCode::FAILURE);
    }

    // Show summary
    eprintln!("\nDeployment summary:");
    eprintln!("  Name: {}", config.deployment.name);
    eprintln!("  Addresses: {}", config.resource_addresses().len());
    eprintln!("  Resources: {}", config.resources.len());
    eprintln!("  Target groups: {}", config.target_group_index().len());

    Ok(ExitCode::SUCCESS)
}

/// Loads the inputs and runs a planning pass.
fn build_plan(config_path: Option<&PathBuf>, inputs: &PlanInputs) -> Result<Plan> {
    inputs.check_sources()?;
    let config = load_config(config_path)?;
    let resources = config.resource_addresses();
    let groups = config.target_group_index();

    let graph = inputs.graph.as_deref().map(load_graph).transpose()?;
    let plan_output = read_input(&inputs.changes)?;

    let planner = Planner::new(&groups, &resources);
    Ok(planner.plan(&plan_output, graph.as_ref()))
}

/// Reads and parses a graph export.
fn load_graph(path: &Path) -> Result<DependencyGraph> {
    let text = read_input(path)?;
    let graph = DependencyGraph::from_export(&text)?;
    debug!(
        "Loaded graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Uses the given declaration, or the nearest one above the working directory.
fn config_parser(config_path: Option<&PathBuf>) -> Result<ConfigParser> {
    config_path.map_or_else(|| ConfigParser::discover("."), |path| Ok(ConfigParser::new(path)))
}

/// Loads and validates the deployment declaration.
fn load_config(config_path: Option<&PathBuf>) -> Result<DeploymentConfig> {
    let parser = config_parser(config_path)?;
    debug!("Loading deployment from: {}", parser.path().display());

    let config = parser.load_with_env()?;

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(config)
}
