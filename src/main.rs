use clap::Parser;
use freight_quote::config::cli::{Command, DestinationArgs, ProductArgs};
use freight_quote::domain::model::{DimensionRecord, Product};
use freight_quote::domain::ports::QuoteSettings;
use freight_quote::utils::error::ErrorSeverity;
use freight_quote::utils::{logger, validation::Validate};
use freight_quote::{
    adapters::cart_csv, CliConfig, HttpRateProvider, QuoteConfig, QuoteError, QuoteSurface,
    SpecExtractor,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 載入 TOML 配置
    let config = match QuoteConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(3);
        }
    };

    // 初始化日誌
    let logging = config.logging();
    if args.json_logs || config.json_logs() {
        logger::init_service_logger(&logging);
    } else {
        logger::init_cli_logger(&logging, args.verbose);
    }
    tracing::info!("Starting freight-quote CLI");
    tracing::debug!("CLI args: {:?}", args);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let settings: Arc<dyn QuoteSettings> = Arc::new(config.clone());
    let extractor = SpecExtractor::new()?;

    let (mut surface, destination) = match &args.command {
        Command::Cart(cart) => {
            let items = match cart_csv::load_cart(&cart.cart, &extractor) {
                Ok(items) => items,
                Err(e) => exit_with(&e),
            };
            (QuoteSurface::cart(items, settings), &cart.destination)
        }
        Command::Product(product_args) => {
            let product = product_from_args(product_args);
            let specs = extractor.extract(&product);
            let mut surface = QuoteSurface::product(product, specs, settings);
            if let Some(quantity) = product_args.quantity {
                if let Err(e) = surface.set_quantity(quantity) {
                    exit_with(&e);
                }
            }
            (surface, &product_args.destination)
        }
    };

    surface.set_destination(destination.zip.clone());
    surface.set_liftgate(destination.liftgate);

    let shipment = match surface.shipment() {
        Ok(shipment) => shipment,
        Err(e) => exit_with(&e),
    };
    println!("📦 Shipment: {}", shipment.summary());
    for line in &shipment.breakdown {
        println!("   • {}", line);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the rate provider will not be contacted");
        match surface.begin_quote() {
            Ok(pending) => println!("{}", serde_json::to_string_pretty(pending.request())?),
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    let provider = HttpRateProvider::new(config.provider.endpoint.clone(), config.timeout_seconds())?
        .with_headers(config.headers());

    if let Err(e) = surface.request_quote(&provider).await {
        exit_with(&e);
    }

    if let Some(index) = destination.select {
        if let Err(e) = surface.select(index) {
            exit_with(&e);
        }
    }

    print_result(&surface, destination);
    Ok(())
}

fn product_from_args(args: &ProductArgs) -> Product {
    let mut product = Product::new("cli-product", args.name.clone());

    if args.weight_lbs.is_some()
        || args.height_in.is_some()
        || args.width_in.is_some()
        || args.length_in.is_some()
    {
        product = product.with_dimensions(DimensionRecord {
            length: args.length_in,
            width: args.width_in,
            height: args.height_in,
            weight: args.weight_lbs,
        });
    }
    if let Some(description) = &args.description {
        product = product.with_description(description.clone());
    }
    if let Some(moq) = args.min_order {
        product = product.with_min_order_quantity(moq);
    }
    product
}

fn print_result(surface: &QuoteSurface, destination: &DestinationArgs) {
    let checkout = surface.checkout();

    if let (Some(failure), Some(notice)) = (surface.failure(), &checkout.notice) {
        // 婉拒或無報價只是提示，其餘才是錯誤
        let icon = if failure.is_soft() { "ℹ️ " } else { "⚠️ " };
        println!("{} {}", icon, notice);
        if failure.is_retryable() {
            println!("💡 Run the command again to retry.");
        }
    }

    let selected = surface.selected_index();
    for (index, quote) in surface.options().iter().enumerate() {
        let marker = if selected == Some(index) { "(•)" } else { "( )" };
        println!("{} [{}] {}", marker, index, quote);
    }

    match &checkout.line {
        Some(line) => println!(
            "✅ Checkout enabled to {}: {} ({} cents)",
            destination.zip.trim(),
            line.label,
            line.amount
        ),
        None => println!("⛔ Checkout disabled until a freight option is selected"),
    }
}

fn exit_with(e: &QuoteError) -> ! {
    tracing::error!(
        "❌ Freight quote failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
