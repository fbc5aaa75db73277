use assembly_info::core::outputs;
use assembly_info::core::ConfigProvider;
use assembly_info::utils::{logger, validation::Validate};
use assembly_info::{AssemblyInfoEngine, AssemblyInfoError, CliConfig, LocalStorage};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();
    let options = config.options();

    // 初始化日誌
    logger::init_cli_logger(options.log_level, config.verbose);

    tracing::info!("Starting assembly-info CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.path.clone());
    let engine = AssemblyInfoEngine::new(storage, config);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Assembly info updated successfully!");
            for file in &summary.updated {
                tracing::info!("📄 {} ({} change(s), {})", file.path, file.changes.len(), file.encoding);
            }

            // 輸出變數寫到 stdout，供建置系統讀取
            let rendered = outputs::render(&summary.outputs, options.output_format)?;
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
                let rendered = outputs::render(&summary.outputs, options.output_format)?;
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
