use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use seoul_api_tester::registry::{EndpointKind, Registry};
use seoul_api_tester::report::{console, json, junit};
use seoul_api_tester::{report, ApiTester, Settings};

#[derive(Parser)]
#[command(name = "seoul-api-tester")]
#[command(version)]
#[command(about = "Probe the Seoul open-data transit and population APIs", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the endpoints and write a results file
    Run {
        /// Settings file (YAML); defaults to ./seoul-api.yaml if present
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the results file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Only probe these endpoint ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<u8>>,

        /// Also write <results>_junit.xml next to the results file
        #[arg(long, default_value = "false")]
        junit: bool,
    },

    /// List the registered endpoints
    List {
        /// Settings file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate settings without sending any request
    Check {
        /// Settings file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Re-render a results file from an earlier run
    Report {
        /// Path to results JSON
        results: PathBuf,

        /// Output format (json, junit, summary)
        #[arg(short, long, default_value = "summary")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    let result = run(cli.command).await;
    if let Err(ref e) = result {
        log::error!("Run aborted: {:?}", e);
    }
    result
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            config,
            output,
            only,
            junit: write_junit,
        } => {
            println!("{}", "Seoul transit API test".bold());
            println!("{}", "=".repeat(50));

            let settings = Settings::load(config.as_deref())?;
            let tester = ApiTester::new(settings)?;

            let test_results = match only {
                Some(ids) => tester.test_apis(&ids).await,
                None => tester.test_all_apis().await,
            };

            let path = json::write_report(&test_results, &output, &chrono::Local::now())?;
            println!(
                "\n{} Results saved to {}",
                "📄".to_string().blue(),
                path.display().to_string().cyan()
            );

            if write_junit {
                let junit_path = junit::write_report(&test_results, &path)?;
                println!(
                    "{} JUnit report saved to {}",
                    "📊".to_string().blue(),
                    junit_path.display().to_string().cyan()
                );
            }

            print!("{}", console::success_digest(&test_results));
        }

        Commands::List { config } => {
            let settings = Settings::load(config.as_deref())?;
            let registry = Registry::from_settings(&settings);
            print_registry(&registry);
        }

        Commands::Check { config } => {
            let settings = Settings::load(config.as_deref())?;
            let validation = settings.validate();
            if validation.valid {
                println!("{} Settings are valid", "✅".green());
            } else {
                println!("{} Settings are not valid:", "❌".red());
                for issue in &validation.issues {
                    println!("  - {}", issue);
                }
                anyhow::bail!("{} settings issue(s)", validation.issues.len());
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            report::generate_report(&results, &format, output.as_deref())
                .with_context(|| format!("Failed to render {}", results.display()))?;
        }
    }

    Ok(())
}

fn print_registry(registry: &Registry) {
    for spec in registry.iter() {
        let kind = match &spec.kind {
            EndpointKind::Active { .. } => "traffic".normal(),
            EndpointKind::SpecialPopulation { .. } => "population".cyan(),
            EndpointKind::Discontinued => "discontinued".yellow(),
        };
        println!("{:>2}  {:<12} {}", spec.id, kind, spec.name);
        if let Some(url) = spec.display_url() {
            println!("    {}", url);
        }
    }
}
