//! Resume writer: local AI resume summaries and cover letters

use clap::Parser;
use log::error;
use resume_writer::cli::{Cli, Commands, ConfigAction, ModelAction};
use resume_writer::engine::{ApplicationRequest, ResumeEngine};
use resume_writer::error::{Result, ResumeWriterError};
use resume_writer::input::manager::InputManager;
use resume_writer::llm::model_manager::ModelManager;
use resume_writer::{web, Config};
use std::io::{self, BufRead, Write};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Option<Commands>, mut config: Config) -> Result<()> {
    let command = match command {
        Some(command) => command,
        None => choose_mode()?,
    };

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            println!("🚀 Starting resume writer");
            let engine = ResumeEngine::load(&config).await?;
            web::serve(&config, engine).await
        }

        Commands::Terminal => resume_writer::terminal::run(&config).await,

        Commands::Generate {
            resume,
            job,
            company,
            position,
        } => {
            resume_writer::cli::validate_file_extension(&resume, &["pdf", "docx", "doc", "txt"])
                .map_err(|e| ResumeWriterError::InvalidInput(format!("Resume file: {}", e)))?;
            resume_writer::cli::validate_file_extension(&job, &["txt"])
                .map_err(|e| ResumeWriterError::InvalidInput(format!("Job description file: {}", e)))?;

            println!("📄 Resume: {}", resume.display());
            println!("💼 Job Description: {}", job.display());

            let mut input_manager = InputManager::new();
            let resume_text = input_manager.extract_text(&resume).await?;
            let job_description = input_manager.extract_text(&job).await?;

            let mut engine = ResumeEngine::load(&config).await?;
            let draft = engine.write_application(&ApplicationRequest {
                resume_text,
                job_description,
                company,
                position,
            })?;

            println!("\n📄 Resume Summary");
            println!("{}", "─".repeat(60));
            println!("{}\n", draft.resume_summary);
            println!("✉️  Cover Letter");
            println!("{}", "─".repeat(60));
            println!("{}", draft.cover_letter);
            Ok(())
        }

        Commands::Models { action } => run_models_command(action, &config).await,

        Commands::Config { action } => run_config_command(action, &config),
    }
}

/// Interactive mode chooser, shown when no subcommand is given.
fn choose_mode() -> Result<Commands> {
    println!("💼 Resume Writer");
    println!("How would you like to run?");
    println!("  1. 🌐 Web Interface");
    println!("  2. 💻 Command Line Interface");
    print!("Choice (1/2): ");
    io::stdout().flush()?;

    let mut choice = String::new();
    io::stdin().lock().read_line(&mut choice)?;

    match choice.trim() {
        "2" => Ok(Commands::Terminal),
        _ => Ok(Commands::Serve {
            host: None,
            port: None,
        }),
    }
}

async fn run_models_command(action: ModelAction, config: &Config) -> Result<()> {
    config.ensure_models_dir()?;
    let mut manager =
        ModelManager::new(config.get_models_dir(), &config.models.available_models).await?;

    match action {
        ModelAction::List => {
            println!("📦 Available models:\n");

            println!("Summarizers:");
            for model in config.list_summarizer_models() {
                print_model_line(model, manager.is_model_downloaded(&model.name), config);
            }

            println!("\nGenerators:");
            for model in config.list_generator_models() {
                print_model_line(model, manager.is_model_downloaded(&model.name), config);
            }
            Ok(())
        }

        ModelAction::Download { model, force } => {
            if force && manager.is_model_downloaded(&model) {
                println!("♻️  Removing existing copy of {}", model);
                manager.remove_model(&model).await?;
            }
            let path = manager.download_model(&model).await?;
            println!("📁 Model stored at: {}", path.display());
            Ok(())
        }

        ModelAction::Remove { model } => {
            manager.remove_model(&model).await?;
            println!("🗑️  Removed model: {}", model);
            Ok(())
        }

        ModelAction::Info { model } => {
            let info = manager
                .get_model_info(&model)
                .ok_or_else(|| ResumeWriterError::ModelNotFound(model.clone()))?;

            println!("📦 {}", info.name);
            println!("   Repo: {}", info.repo_id);
            println!("   Type: {:?}", info.model_type);
            println!("   Size: ~{} MB", info.size_mb);
            println!("   {}", info.description);
            if manager.is_model_downloaded(&model) {
                println!("   Status: ✅ downloaded");
            } else {
                println!("   Status: ⬇️  not downloaded");
            }
            Ok(())
        }
    }
}

fn print_model_line(
    model: &resume_writer::config::AvailableModel,
    downloaded: bool,
    config: &Config,
) {
    let status = if downloaded { "✅" } else { "⬇️ " };
    let default_marker = if model.name == config.models.default_summarizer
        || model.name == config.models.default_generator
    {
        " (default)"
    } else {
        ""
    };
    println!(
        "  {} {} - ~{} MB{}",
        status, model.name, model.size_mb, default_marker
    );
    println!("     {}", model.description);
}

fn run_config_command(action: Option<ConfigAction>, config: &Config) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).map_err(|e| {
                ResumeWriterError::Configuration(format!("Failed to serialize config: {}", e))
            })?;
            println!("{}", content);
            Ok(())
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            println!("✅ Configuration reset to defaults");
            Ok(())
        }
    }
}
