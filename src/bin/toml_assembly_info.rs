use assembly_info::config::toml_config::TomlConfig;
use assembly_info::core::outputs;
use assembly_info::core::ConfigProvider;
use assembly_info::domain::model::{LogLevel, OutputFormat};
use assembly_info::utils::{logger, validation::Validate};
use assembly_info::{AssemblyInfoEngine, AssemblyInfoError, LocalStorage};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-assembly-info")]
#[command(about = "Stamps assembly metadata using a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "assembly-info.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    json_logs: bool,

    /// Override the output format from config
    #[arg(long)]
    output_format: Option<OutputFormat>,

    /// Override fail_on_warning from config
    #[arg(long)]
    fail_on_warning: Option<bool>,

    /// Dry run - show what would be updated without writing any file
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(format) = args.output_format {
        config.options.output_format = Some(format);
    }
    if let Some(fail) = args.fail_on_warning {
        config.options.fail_on_warning = Some(fail);
    }

    // 初始化日誌
    if args.json_logs {
        let level = if args.verbose { LogLevel::Verbose } else { config.log_level() };
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(config.log_level(), args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based assembly info tool");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    let storage = LocalStorage::new(config.source.path.clone());
    let output_format = config.output_format();
    let engine = AssemblyInfoEngine::new(storage, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No file will be modified");
        return perform_dry_run(&engine).await;
    }

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Assembly info updated successfully!");
            eprintln!(
                "✅ Updated {} file(s), skipped {}, {} warning(s)",
                summary.updated.len(),
                summary.skipped.len(),
                summary.warnings.len()
            );

            let rendered = outputs::render(&summary.outputs, output_format)?;
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Assembly info update failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 其他檔案已更新，輸出變數照常提供
            if let AssemblyInfoError::FilesFailed { summary } = &e {
                for failure in &summary.failed {
                    eprintln!("  ❌ {}: {}", failure.path, failure.error);
                }
                let rendered = outputs::render(&summary.outputs, output_format)?;
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
            }

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let options = config.options();

    eprintln!("📋 Configuration Summary:");
    eprintln!("  Source: {}", config.source_path());
    eprintln!("  Files: {}", config.file_patterns().join(", "));
    eprintln!("  Insert attributes: {}", options.insert_attributes);
    eprintln!("  File encoding: {}", options.file_encoding);
    eprintln!("  Write BOM: {}", options.write_bom);
    eprintln!("  Fail on warning: {}", options.fail_on_warning);
    eprintln!("  Output format: {}", options.output_format);

    if args.dry_run {
        eprintln!("  🔍 DRY RUN MODE ENABLED");
    }

    eprintln!();
}

async fn perform_dry_run(
    engine: &AssemblyInfoEngine<LocalStorage, TomlConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = match engine.plan().await {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    };

    eprintln!("🔍 Dry Run Analysis:");
    eprintln!();

    eprintln!("🏷️ Assembly Attributes:");
    for attribute in plan.prepared.assembly.attributes() {
        eprintln!("  {} = {}", attribute.kind, attribute.value);
    }

    let properties = plan.prepared.package.properties();
    if !properties.is_empty() {
        eprintln!();
        eprintln!("📦 Package Properties:");
        for (name, value) in properties {
            eprintln!("  {} = {}", name, value);
        }
    }

    eprintln!();
    eprintln!("📄 Files ({}):", plan.files.len());
    for file in &plan.files {
        match file.patcher {
            Some(patcher) => eprintln!("  {} [{}]", file.path, patcher),
            None => eprintln!("  {} ⚠️ unsupported, would be skipped", file.path),
        }
    }

    eprintln!();
    eprintln!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
