use clap::Parser;
use fashion_etl::core::Pipeline;
use fashion_etl::utils::error::{ErrorSeverity, EtlError};
use fashion_etl::utils::{logger, validation::Validate};
use fashion_etl::{Cli, Command, EtlEngine, FashionPipeline, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting fashion-etl ({:?})", cli.command);

    // 載入配置並套用命令列覆蓋
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    tracing::debug!(
        "Source: {:?}, output: {:?}",
        config.source,
        config.load
    );

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    if let Err(e) = run(cli.command, config).await {
        exit_with(&e);
    }
}

async fn run(command: Command, config: TomlConfig) -> fashion_etl::Result<()> {
    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = FashionPipeline::from_config(storage, config)?;

    match command {
        Command::Extract => {
            let records = pipeline.extract().await?;
            println!(
                "✅ Scraped {} products into {}",
                records.len(),
                pipeline.config().load.raw_file
            );
        }
        Command::Transform => {
            let table = pipeline.read_raw_table().await?;
            let dataset = pipeline.transform(table).await?;
            println!(
                "✅ Cleaned {} products into {}",
                dataset.len(),
                pipeline.config().load.clean_file
            );
        }
        Command::Load => {
            let dataset = pipeline.read_clean_dataset().await?;
            let report = pipeline.load(dataset).await?;
            print_report(&report);
        }
        Command::Run => {
            let engine = EtlEngine::new(pipeline);
            let report = engine.run().await?;
            tracing::info!("✅ ETL process completed successfully!");
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &fashion_etl::core::LoadReport) {
    println!("✅ {} products ready", report.rows);
    match report.sheets_ok {
        Some(true) => println!("📊 Spreadsheet updated"),
        Some(false) => println!("⚠️  Spreadsheet update failed, see logs"),
        None => {}
    }
    if let Some(rows) = report.rows_inserted {
        println!("🗄️  {} rows inserted into PostgreSQL", rows);
    }
}

fn exit_with(e: &EtlError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!("❌ fashion-etl failed: {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2, // 重試錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    };
    std::process::exit(exit_code);
}
