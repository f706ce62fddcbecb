// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! judgekit CLI
//!
//! Command-line access to filter conversion, evaluator jobs and trace
//! previews.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use judgekit_client::{
    create_job, delete_job, update_job, CandidateChain, ContextStore, FilterOptionsLoader,
    PreviewLoader, ProjectContext, TraceListRequest, TrpcClient,
};
use judgekit_core::filter::{
    apply_filters, nested_key_operators, operators_for, renormalize, to_ui, to_ui_with, to_wire,
    ColumnType, FilterConfiguration, FilterExpression, LabelMode, Operator,
};
use judgekit_evals::{build_create, build_update, EvaluatorForm, JobStatus};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "judgekit")]
#[command(about = "judgekit - filter expressions and evaluator jobs", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert, check and evaluate filter expressions
    Filters {
        #[command(subcommand)]
        command: FilterCommands,
    },

    /// Evaluator job commands
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Trace list commands
    Traces {
        #[command(subcommand)]
        command: TraceCommands,
    },

    /// Saved project context
    Context {
        #[command(subcommand)]
        command: ContextCommands,
    },
}

/// Screen whose filter columns apply
#[derive(Clone, Copy, ValueEnum)]
enum Screen {
    Traces,
    Dataset,
}

impl Screen {
    fn configuration(self) -> FilterConfiguration {
        match self {
            Screen::Traces => FilterConfiguration::traces(),
            Screen::Dataset => FilterConfiguration::dataset_items(),
        }
    }
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Convert UI expressions to wire filters
    ToWire {
        #[arg(long, value_enum, default_value = "traces")]
        screen: Screen,

        /// JSON array of expressions (inline, @file or -)
        input: String,
    },

    /// Convert wire filters back to UI expressions
    ToUi {
        #[arg(long, value_enum, default_value = "traces")]
        screen: Screen,

        /// Show datasetId under its legacy "Dataset" label
        #[arg(long)]
        legacy_labels: bool,

        /// JSON array of wire filters (inline, @file or -)
        input: String,
    },

    /// Check expressions against the screen's columns and operators
    Check {
        #[arg(long, value_enum, default_value = "traces")]
        screen: Screen,

        input: String,
    },

    /// Filter a JSON array of rows
    Apply {
        #[arg(long, value_enum, default_value = "traces")]
        screen: Screen,

        /// File holding a JSON array of rows
        #[arg(long)]
        rows: PathBuf,

        /// Filters in UI or wire shape
        filter: String,
    },

    /// List operators per column type
    Operators {
        /// Column type name (all types when omitted)
        column_type: Option<String>,
    },

    /// Show the screen's columns with option values from the backend
    Options {
        #[arg(long, value_enum, default_value = "traces")]
        screen: Screen,

        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for JobStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => JobStatus::Active,
            StatusArg::Inactive => JobStatus::Inactive,
        }
    }
}

#[derive(Subcommand)]
enum JobCommands {
    /// Print the create payload for an evaluator form
    Build {
        /// Evaluator form (JSON)
        #[arg(long)]
        form: PathBuf,
    },

    /// Create an evaluator job
    Create {
        #[arg(long)]
        form: PathBuf,
    },

    /// Update an evaluator job
    Update {
        /// Evaluator config ID
        #[arg(long)]
        id: String,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long)]
        form: PathBuf,
    },

    /// Delete an evaluator job
    Delete {
        #[arg(long)]
        id: String,

        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum TraceCommands {
    /// Preview the traces a filter selects
    Preview {
        #[arg(long)]
        project: Option<String>,

        /// Full-text search query
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "0")]
        page: u32,

        #[arg(long, default_value = "50")]
        limit: u32,

        /// Filters in UI or wire shape
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
enum ContextCommands {
    /// Show the saved context
    Show,

    /// Save the project (and org) to work in
    Set {
        #[arg(long)]
        project: String,

        #[arg(long)]
        org: Option<String>,
    },

    /// Forget the saved context
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(cli.config.clone()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Filters { command } => handle_filter_command(command, &config, cli.json).await,
        Commands::Job { command } => handle_job_command(command, &config).await,
        Commands::Traces { command } => handle_trace_command(command, &config, cli.json).await,
        Commands::Context { command } => handle_context_command(command, cli.json),
    }
}

async fn handle_filter_command(command: FilterCommands, config: &CliConfig, json: bool) -> Result<()> {
    match command {
        FilterCommands::ToWire { screen, input } => {
            let exprs = parse_expressions(&input)?;
            print_json(&to_wire(&exprs, &screen.configuration()))?;
        }

        FilterCommands::ToUi {
            screen,
            legacy_labels,
            input,
        } => {
            let mode = if legacy_labels {
                LabelMode::LegacyLabels
            } else {
                LabelMode::Keys
            };
            let wire = parse_json(&input)?;
            print_json(&to_ui_with(&wire, &screen.configuration(), mode))?;
        }

        FilterCommands::Check { screen, input } => {
            let configuration = screen.configuration();
            let exprs = parse_expressions(&input)?;

            let problems: Vec<(usize, String)> = exprs
                .iter()
                .enumerate()
                .filter_map(|(i, expr)| configuration.check(expr).err().map(|e| (i, e.to_string())))
                .collect();

            if json {
                let report: Vec<Value> = problems
                    .iter()
                    .map(|(i, e)| json!({ "index": i, "error": e }))
                    .collect();
                print_json(&report)?;
            } else if problems.is_empty() {
                println!("✓ {} expression(s) valid", exprs.len());
            } else {
                for (i, e) in &problems {
                    println!("✗ #{}: {}", i, e);
                }
            }

            if !problems.is_empty() {
                bail!("{} invalid filter expression(s)", problems.len());
            }
        }

        FilterCommands::Apply {
            screen,
            rows,
            filter,
        } => {
            let configuration = screen.configuration();
            let rows: Vec<Value> = serde_json::from_str(&read_file(&rows)?)
                .context("Rows file must hold a JSON array")?;
            let exprs = to_ui(&parse_json(&filter)?, &configuration);

            let matched = apply_filters(&rows, &exprs, &configuration);
            info!("{} of {} rows matched", matched.len(), rows.len());
            print_json(&matched)?;
        }

        FilterCommands::Operators { column_type } => {
            let types: Vec<ColumnType> = match column_type {
                Some(name) => vec![ColumnType::from_name(&name)],
                None => ColumnType::ALL.to_vec(),
            };
            print_operators(&types, json)?;
        }

        FilterCommands::Options { screen, project } => {
            let context = resolve_project(project, config)?;
            let loader = FilterOptionsLoader::new(Arc::new(connect(config)?));

            let mut configuration = screen.configuration();
            let updated = loader
                .configure(&context.project_id, &mut configuration)
                .await
                .context("Failed to load filter options")?;
            info!("Options loaded for {} column(s)", updated);

            if json {
                print_json(&configuration)?;
            } else {
                for column in configuration.columns() {
                    if column.column_type.is_options() {
                        println!(
                            "{} ({}): {} option(s)",
                            column.key,
                            column.column_type,
                            column.options.len()
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_operators(types: &[ColumnType], json: bool) -> Result<()> {
    let describe = |ops: &[Operator]| -> Vec<Value> {
        ops.iter()
            .map(|op| json!({ "label": op.label(), "code": op.code() }))
            .collect()
    };

    if json {
        let mut table = serde_json::Map::new();
        for column_type in types {
            let mut entry = json!({ "operators": describe(operators_for(*column_type)) });
            if column_type.has_meta_key() {
                entry["nestedKey"] = Value::Array(describe(nested_key_operators()));
            }
            table.insert(column_type.name().to_string(), entry);
        }
        return print_json(&table);
    }

    let render = |ops: &[Operator]| {
        ops.iter()
            .map(|op| format!("{} ({})", op.label(), op.code()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    for column_type in types {
        println!("{}: {}", column_type, render(operators_for(*column_type)));
        if column_type.has_meta_key() {
            println!("  nested key: {}", render(nested_key_operators()));
        }
    }
    Ok(())
}

async fn handle_job_command(command: JobCommands, config: &CliConfig) -> Result<()> {
    match command {
        JobCommands::Build { form } => {
            let form = read_form(&form)?;
            let job = build_create(&form, &form.target.configuration())
                .context("Invalid evaluator form")?;
            print_json(&job)?;
        }

        JobCommands::Create { form } => {
            let form = read_form(&form)?;
            let job = build_create(&form, &form.target.configuration())
                .context("Invalid evaluator form")?;
            let created = create_job(&connect(config)?, &job)
                .await
                .context("Failed to create evaluator job")?;
            print_json(&created)?;
        }

        JobCommands::Update { id, status, form } => {
            let form = read_form(&form)?;
            let job = build_update(id, status.map(JobStatus::from), &form, &form.target.configuration())
                .context("Invalid evaluator form")?;
            let updated = update_job(&connect(config)?, &job)
                .await
                .context("Failed to update evaluator job")?;
            print_json(&updated)?;
        }

        JobCommands::Delete { id, project } => {
            let context = resolve_project(project, config)?;
            delete_job(&connect(config)?, &context.project_id, &id)
                .await
                .context("Failed to delete evaluator job")?;
            println!("✓ Deleted evaluator job {}", id);
        }
    }
    Ok(())
}

async fn handle_trace_command(command: TraceCommands, config: &CliConfig, json: bool) -> Result<()> {
    match command {
        TraceCommands::Preview {
            project,
            search,
            page,
            limit,
            filter,
        } => {
            let context = resolve_project(project, config)?;
            let configuration = FilterConfiguration::traces();
            let filter = match filter {
                Some(text) => renormalize(&parse_json(&text)?, &configuration),
                None => Vec::new(),
            };

            let mut request = TraceListRequest::new(context.project_id, filter).with_page(page, limit);
            if let Some(query) = search {
                request = request.with_search(query);
            }

            let loader = PreviewLoader::new(
                Arc::new(connect(config)?),
                Arc::new(CandidateChain::trace_list()),
            );
            let state = match loader.load(&request).await {
                Some(state) => state,
                None => loader.state(),
            };

            if json {
                print_json(&json!({
                    "rows": state.rows,
                    "total": state.total,
                    "note": state.note,
                }))?;
            } else if let Some(note) = &state.note {
                println!("✗ Preview {}", note);
            } else {
                match state.total {
                    Some(total) => println!("{} of {} trace(s)", state.rows.len(), total),
                    None => println!("{} trace(s)", state.rows.len()),
                }
                for row in &state.rows {
                    println!("  {}", summarize_row(row));
                }
            }
        }
    }
    Ok(())
}

fn handle_context_command(command: ContextCommands, json: bool) -> Result<()> {
    let store = ContextStore::default_location().context("Cannot locate the context file")?;

    match command {
        ContextCommands::Show => match store.load() {
            Some(context) if json => print_json(&context)?,
            Some(context) => {
                println!("Project: {}", context.project_id);
                println!("Org: {}", context.org_id.as_deref().unwrap_or("-"));
            }
            None if json => println!("null"),
            None => println!("No saved context"),
        },

        ContextCommands::Set { project, org } => {
            let mut context = ProjectContext::new(project);
            if let Some(org) = org {
                context = context.with_org(org);
            }
            store.save(&context).context("Failed to save context")?;
            println!("✓ Context saved to {}", store.path().display());
        }

        ContextCommands::Clear => {
            store.clear().context("Failed to clear context")?;
            println!("✓ Context cleared");
        }
    }
    Ok(())
}

/// Flag, then config, then the saved context
fn resolve_project(flag: Option<String>, config: &CliConfig) -> Result<ProjectContext> {
    let org = config.project.org_id.clone();
    let with_org = |context: ProjectContext| match &org {
        Some(org) => context.with_org(org.clone()),
        None => context,
    };

    if let Some(project) = flag.or_else(|| config.project.project_id.clone()) {
        return Ok(with_org(ProjectContext::new(project)));
    }

    let saved = ContextStore::default_location().ok().and_then(|store| store.load());
    match saved {
        Some(context) => Ok(context),
        None => bail!("No project selected; pass --project or run `judgekit context set`"),
    }
}

fn connect(config: &CliConfig) -> Result<TrpcClient> {
    config.validate()?;
    TrpcClient::new(config.client_config()).context("Failed to create backend client")
}

/// Inline text, `@path` or `-` for stdin
fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    match arg.strip_prefix('@') {
        Some(path) => read_file(Path::new(path)),
        None => Ok(arg.to_string()),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_json(arg: &str) -> Result<Value> {
    serde_json::from_str(&read_input(arg)?).context("Input is not valid JSON")
}

fn parse_expressions(arg: &str) -> Result<Vec<FilterExpression>> {
    serde_json::from_str(&read_input(arg)?).context("Expected a JSON array of filter expressions")
}

fn read_form(path: &Path) -> Result<EvaluatorForm> {
    serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("{} is not a valid evaluator form", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summarize_row(row: &Value) -> String {
    let field = |name: &str| row.get(name).and_then(Value::as_str).unwrap_or("-");
    format!("{}  {}  {}", field("id"), field("timestamp"), field("name"))
}
