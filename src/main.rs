use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::*;
use mdiss::batch::{self, DEFAULT_PATTERN};
use mdiss::config::{self, Config, TokenLookup};
use mdiss::export::{self, ExportFormat, ExportRow};
use mdiss::theme::Theme;
use mdiss::tracker::{
    self, DraftOptions, FilingOptions, FilingOutcome, IssueState, StatusUpdate,
};
use mdiss::{
    AnalysisResult, AnalysisSummary, CommandRecord, CommandStatistics, ErrorAnalyzer,
    GitHubClient, IssueTracker, MarkdownParser,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "mdiss", version, about = "Turn markdown reports of failed commands into GitHub issues")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AuthArgs {
    /// GitHub token (overrides token file, config and GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// File containing the GitHub token
    #[arg(long)]
    token_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a report and file one issue per failed command
    Create {
        markdown: PathBuf,
        /// Target repository as owner/name
        #[arg(long)]
        repo: Option<String>,
        #[command(flatten)]
        auth: AuthArgs,
        /// Write the resolved token to this file
        #[arg(long)]
        save_token: Option<PathBuf>,
        /// Show what would be filed without calling the API
        #[arg(long)]
        dry_run: bool,
        /// File issues even when an open issue with the same title exists
        #[arg(long)]
        no_skip_existing: bool,
        #[arg(long, value_delimiter = ',')]
        assignees: Vec<String>,
        #[arg(long)]
        milestone: Option<u64>,
    },
    /// Print statistics and a classification for every failed command
    Analyze {
        /// Markdown file or directory of reports
        path: PathBuf,
        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export parsed commands as a table, JSON, YAML or CSV
    Export {
        markdown: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Table)]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List issues in the repository
    ListIssues {
        #[arg(long)]
        repo: Option<String>,
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(long, value_enum, default_value_t = IssueState::Open)]
        state: IssueState,
        /// Comma separated label filter
        #[arg(long)]
        labels: Option<String>,
    },
    /// Move an issue to open, closed, in_progress, reopened or done
    UpdateStatus {
        number: u64,
        status: String,
        #[arg(long)]
        repo: Option<String>,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Store a GitHub token in .env and create the default config file
    Setup {
        #[arg(long)]
        token: Option<String>,
        /// Directory that receives .env and .gitignore
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print the JSON schema of exported rows
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_or_default(cli.config.as_deref()).context("failed to load config")?;
    if cli.no_color || !config.display.color_output {
        colored::control::set_override(false);
    }
    let theme = &config.display.theme;

    match cli.command {
        Commands::Create {
            markdown,
            repo,
            auth,
            save_token,
            dry_run,
            no_skip_existing,
            assignees,
            milestone,
        } => {
            let pairs = parse_and_analyze(&markdown, &config)?;
            if pairs.is_empty() {
                println!("{}", "No failed commands found.".yellow());
                return Ok(());
            }

            let (owner, name) = config.repository(repo.as_deref())?;
            let token = resolve_token(&auth, &config)?;
            let token = match token {
                Some(token) => token,
                None if dry_run => String::new(),
                None => bail!("no GitHub token found; pass --token, --token-file or set GITHUB_TOKEN"),
            };
            if let Some(path) = save_token.filter(|_| !token.is_empty()) {
                config::save_token_to_file(&path, &token)?;
                println!("Saved token to {}", path.display());
            }

            let client = GitHubClient::new(&token, &owner, &name, &config.github.api_url)?;
            if !dry_run {
                let info = client
                    .test_connection()
                    .await
                    .with_context(|| format!("cannot access {}/{}", owner, name))?;
                println!("Connected to {}", info.full_name.as_str().bold());
            }

            let options = FilingOptions {
                dry_run,
                skip_existing: !no_skip_existing,
                draft: DraftOptions {
                    default_labels: config.github.default_labels.clone(),
                    assignees: if assignees.is_empty() {
                        config.github.assignees.clone()
                    } else {
                        assignees
                    },
                    milestone,
                },
            };
            let outcomes = tracker::file_issues(&client, &pairs, &options).await;
            print_outcomes(&outcomes, theme);

            if outcomes.iter().any(|o| matches!(o, FilingOutcome::Failed { .. })) {
                bail!("some issues could not be created");
            }
        }
        Commands::Analyze { path, pattern, json } => {
            let files = batch::collect_markdown_files(&path, &pattern)?;
            let mut records = Vec::new();
            for result in batch::parse_all(files).await? {
                match result.records {
                    Ok(parsed) => records.extend(parsed),
                    Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                }
            }

            let analyzer = ErrorAnalyzer::from_settings(&config.analysis);
            let analyses = analyzer.analyze_all(&records);
            let report = AnalysisReport {
                statistics: CommandStatistics::collect(&records, &config.analysis),
                summary: AnalysisSummary::collect(&analyses),
                commands: records
                    .iter()
                    .zip(&analyses)
                    .map(|(record, analysis)| ExportRow::new(record, Some(analysis)))
                    .collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, &records, &analyses, theme);
            }
        }
        Commands::Export {
            markdown,
            format,
            output,
        } => {
            let pairs = parse_and_analyze(&markdown, &config)?;
            let rows: Vec<ExportRow> = pairs
                .iter()
                .map(|(record, analysis)| ExportRow::new(record, Some(analysis)))
                .collect();
            let rendered = export::render(&rows, format, config.display.max_cell_width)?;

            match output {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported {} commands to {}", rows.len(), path.display());
                }
                None => print!("{}", rendered),
            }
        }
        Commands::ListIssues {
            repo,
            auth,
            state,
            labels,
        } => {
            let client = connect(&config, repo.as_deref(), &auth)?;
            let issues = client.list_issues(state, labels.as_deref()).await?;
            if issues.is_empty() {
                println!("No {} issues in {}.", state.as_str(), client.repository());
            }
            for issue in issues {
                println!(
                    "{} {} [{}] {}",
                    format!("#{}", issue.number).bold(),
                    issue.title,
                    issue.state,
                    theme.muted.apply(&issue.label_names().join(", "))
                );
            }
        }
        Commands::UpdateStatus {
            number,
            status,
            repo,
            auth,
        } => {
            let status: StatusUpdate = status.parse()?;
            let client = connect(&config, repo.as_deref(), &auth)?;
            let issue = tracker::update_status(&client, number, status).await?;
            println!(
                "{} #{} is now {} ({})",
                "Updated".green().bold(),
                issue.number,
                issue.state,
                issue.html_url
            );
        }
        Commands::Setup { token, dir } => {
            let token = match token {
                Some(token) => token,
                None => prompt("GitHub token: ")?,
            };
            if token.trim().is_empty() {
                bail!("no token entered");
            }
            let env_path = config::save_token_to_dotenv(&dir, &token)?;
            println!("Saved token to {}", env_path.display());

            let config_path = config::get_config_path()?;
            if !config_path.exists() {
                Config::create_default(&config_path)?;
                println!("Created default config file at {}", config_path.display());
            }
        }
        Commands::Schema => println!("{}", export::export_schema()?),
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn parse_and_analyze(path: &Path, config: &Config) -> Result<Vec<(CommandRecord, AnalysisResult)>> {
    let records = MarkdownParser::new()
        .parse_file(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let analyzer = ErrorAnalyzer::from_settings(&config.analysis);
    Ok(records
        .into_iter()
        .map(|record| {
            let analysis = analyzer.analyze(&record);
            (record, analysis)
        })
        .collect())
}

fn resolve_token(auth: &AuthArgs, config: &Config) -> Result<Option<String>> {
    let lookup = TokenLookup::from_env(auth.token.as_deref(), auth.token_file.as_deref());
    let resolved = lookup.resolve(config)?;
    if let Some((_, source)) = &resolved {
        tracing::debug!(?source, "resolved GitHub token");
    }
    Ok(resolved.map(|(token, _)| token))
}

fn connect(config: &Config, repo: Option<&str>, auth: &AuthArgs) -> Result<GitHubClient> {
    let (owner, name) = config.repository(repo)?;
    let Some(token) = resolve_token(auth, config)? else {
        bail!("no GitHub token found; pass --token, --token-file or set GITHUB_TOKEN");
    };
    Ok(GitHubClient::new(&token, &owner, &name, &config.github.api_url)?)
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[derive(Serialize)]
struct AnalysisReport {
    statistics: CommandStatistics,
    summary: AnalysisSummary,
    commands: Vec<ExportRow>,
}

fn print_outcomes(outcomes: &[FilingOutcome], theme: &Theme) {
    for outcome in outcomes {
        match outcome {
            FilingOutcome::Created(issue) => println!(
                "{} #{} {} {}",
                theme.success.apply("Created"),
                issue.number,
                issue.title,
                theme.muted.apply(&issue.html_url)
            ),
            FilingOutcome::Skipped { title, existing } => println!(
                "{} {} (already open as #{})",
                theme.muted.apply("Skipped"),
                title,
                existing.number
            ),
            FilingOutcome::DryRun(draft) => {
                println!("{} {}", theme.header.apply("Would create:"), draft.title);
                println!("  {} {}", theme.label.apply("labels:"), draft.labels.join(", "));
            }
            FilingOutcome::Failed { title, error } => {
                eprintln!("{} {}: {}", "Failed".red().bold(), title, error)
            }
        }
    }
}

fn print_report(report: &AnalysisReport, records: &[CommandRecord], analyses: &[AnalysisResult], theme: &Theme) {
    let stats = &report.statistics;
    println!("{}", theme.header.apply("Statistics"));
    println!("  {} {}", theme.label.apply("Total commands:"), stats.total);
    println!("  {} {}", theme.label.apply("Failed:"), stats.failed);
    println!("  {} {:.1}%", theme.label.apply("Success rate:"), stats.success_rate * 100.0);
    println!("  {} {:.2}s", theme.label.apply("Average time:"), stats.average_execution_time);
    println!("  {} {}", theme.label.apply("Timeouts:"), stats.timeout_count);
    println!("  {} {}", theme.label.apply("Critical:"), stats.critical_count);
    for (command_type, count) in &stats.command_types {
        println!("  {} {}", theme.label.apply(&format!("{}:", command_type)), count);
    }

    println!("\n{}", theme.header.apply("Categories"));
    for (category, count) in &report.summary.categories {
        println!("  {}: {}", category, count);
    }

    println!("\n{}", theme.header.apply("Commands"));
    for (record, analysis) in records.iter().zip(analyses) {
        let priority = theme
            .priority(analysis.priority)
            .apply(&format!("[{}]", analysis.priority.as_str().to_uppercase()));
        println!(
            "  {} {} {} ({:.0}%)",
            priority,
            theme.command.apply(&record.command),
            analysis.category,
            analysis.confidence * 100.0
        );
        println!("    {}", theme.muted.apply(&analysis.root_cause));
    }
}
