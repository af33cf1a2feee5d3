//! `vind` - CLI for vindecoder
//!
//! This binary scrapes and seeds the WMI database, decodes and generates
//! VINs, and runs the HTTP API.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vindecoder::cli::{
    Cli, Command, ConfigCommand, DecodeCommand, FactoriesCommand, GenerateCommand,
    InspectCommand, LogosCommand, RegionsCommand, ScrapeCommand, SeedCommand, ServeCommand,
};
use vindecoder::icons::{self, RegionIconReport};
use vindecoder::scrape::{self, ScrapeOptions, ScrapeReport};
use vindecoder::seed::{self, SeedOptions, SeedReport};
use vindecoder::storage::TableReport;
use vindecoder::{init_logging, logos, server, Config, DecodedVin, Decoder, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate --file` reports its own load errors
    if let Command::Config(ConfigCommand::Validate { file: Some(file) }) = &cli.command {
        return handle_validate(Some(file.clone()));
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Init => handle_init(&config),
        Command::Seed(cmd) => handle_seed(&config, &cmd),
        Command::Scrape(cmd) => handle_scrape(&config, &cmd),
        Command::Decode(cmd) => handle_decode(&config, &cmd),
        Command::Generate(cmd) => handle_generate(&config, &cmd),
        Command::Factories(cmd) => handle_factories(&config, &cmd),
        Command::Logos(cmd) => handle_logos(&config, &cmd),
        Command::Regions(cmd) => handle_regions(&config, &cmd),
        Command::Inspect(cmd) => handle_inspect(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Serve(cmd) => handle_serve(config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd, cli.config),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn handle_init(config: &Config) -> Result<()> {
    for dir in [
        config.sources_dir(),
        config.logo_output_dir(),
        config.region_icon_output_dir(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let storage = open_storage(config)?;

    println!("Database:      {}", storage.path().display());
    println!("Data sources:  {}", config.sources_dir().display());
    println!("Logo sources:  {}", config.logo_source_dir().display());
    println!("Logo output:   {}", config.logo_output_dir().display());
    println!("Region images: {}", config.region_icon_source_dir().display());
    println!();
    println!(
        "Run `vind seed`. Missing {}, {} and {} files are downloaded or scraped.",
        config.sources.countries_file, config.sources.regions_file, config.sources.factories_file
    );
    Ok(())
}

fn handle_seed(config: &Config, cmd: &SeedCommand) -> Result<()> {
    let mut options = SeedOptions::from_config(config);
    if cmd.no_fetch {
        options.fetch_countries = false;
        options.fetch_wmi_page = false;
    }
    options.scrape = cmd.scrape;
    options.skip_logos = cmd.skip_logos;
    options.skip_region_icons = cmd.skip_region_icons;

    let report = seed::run_all(config, &options).context("seeding failed")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_seed_report(&report);
    }
    Ok(())
}

fn print_seed_report(report: &SeedReport) {
    if let Some(scrape) = &report.scrape {
        print_scrape_report(scrape);
        println!();
    }

    println!("Seed report");
    println!("-----------");
    println!(
        "{:<12} {:>9} {:>9} {:>9} {:>9}",
        "Step", "Inserted", "Updated", "Skipped", "Errors"
    );
    for step in &report.steps {
        println!(
            "{:<12} {:>9} {:>9} {:>9} {:>9}",
            step.step,
            step.inserted,
            step.updated,
            step.skipped,
            step.errors.len()
        );
    }

    if let Some(logos) = &report.logos {
        println!();
        print_logo_report(logos);
    }
    if let Some(icons) = &report.region_icons {
        println!();
        print_region_icon_report(icons);
    }

    println!();
    println!("Countries:     {}", report.stats.countries);
    println!("WMI regions:   {}", report.stats.wmi_regions);
    println!("WMI factories: {}", report.stats.wmi_factories);
    println!("Factory logos: {}", report.stats.factory_logos);
}

fn print_logo_report(report: &logos::LogoImportReport) {
    println!("Logo import");
    println!("-----------");
    println!("Logos found:        {}", report.logos_found);
    println!(
        "Factories matched:  {} of {} ({:.1}%)",
        report.factories_matched,
        report.factories_total,
        report.coverage_percent()
    );
    println!("Thumbnails written: {}", report.thumbnails_created);
    if !report.thumbnails_failed.is_empty() {
        println!("Thumbnails failed:  {}", report.thumbnails_failed.len());
        for failure in &report.thumbnails_failed {
            println!("  {failure}");
        }
    }
    println!("Mappings created:   {}", report.mappings_created);
    if !report.top_logos.is_empty() {
        println!("Top logos:");
        for (logo, count) in &report.top_logos {
            println!("  {logo:<30} {count}");
        }
    }
}

fn handle_scrape(config: &Config, cmd: &ScrapeCommand) -> Result<()> {
    let options = ScrapeOptions {
        fetch: config.sources.fetch_wmi_page && !cmd.no_fetch,
        refresh: cmd.refresh,
    };
    let report = scrape::scrape_sources(config, &options).context("scraping failed")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_scrape_report(&report);
    }
    Ok(())
}

fn print_scrape_report(report: &ScrapeReport) {
    println!("Scrape");
    println!("------");
    println!(
        "Page:               {} ({})",
        report.page.display(),
        if report.fetched { "downloaded" } else { "cached" }
    );
    println!("Region ranges:      {}", report.regions);
    println!("Factory rows:       {}", report.factories);
}

fn print_region_icon_report(report: &RegionIconReport) {
    println!("Region icons");
    println!("------------");
    println!("Images found:       {}", report.found);
    println!("Icons written:      {}", report.processed);
    for failure in &report.failed {
        println!("  failed: {failure}");
    }
}

fn handle_regions(config: &Config, cmd: &RegionsCommand) -> Result<()> {
    match cmd {
        RegionsCommand::Import { json } => {
            let report =
                icons::import_region_icons(config).context("region icon import failed")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_region_icon_report(&report);
            }
        }
    }
    Ok(())
}

fn handle_decode(config: &Config, cmd: &DecodeCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let decoded = Decoder::new(&storage).decode(&cmd.vin)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        print_decoded(&decoded);
    }
    Ok(())
}

fn print_decoded(decoded: &DecodedVin) {
    let model_year = decoded
        .model_year
        .map_or_else(|| "Unknown".to_string(), |year| year.to_string());
    let logos = if decoded.manufacturer_logos.is_empty() {
        "-".to_string()
    } else {
        decoded.manufacturer_logos.join(", ")
    };

    println!("VIN:            {}", decoded.vin);
    println!("  WMI:          {}", decoded.wmi);
    println!("  VDS:          {}", decoded.vds);
    println!("  VIS:          {}", decoded.vis);
    println!(
        "  Check digit:  {} ({})",
        decoded.check_digit,
        if decoded.check_digit_valid {
            "valid"
        } else {
            "invalid"
        }
    );
    println!(
        "  Model year:   {model_year} ({})",
        decoded.model_year_char
    );
    println!("  Plant:        {}", decoded.plant_code);
    println!("  Serial:       {}", decoded.serial_number);
    println!();
    println!(
        "Region:         {} {} ({})",
        decoded.region_flag, decoded.region_country, decoded.region
    );
    println!(
        "Country:        {} {} ({})",
        decoded.country_flag, decoded.country, decoded.country_region
    );
    println!("Manufacturer:   {}", decoded.manufacturer);
    println!("  Logos:        {logos}");
    println!(
        "  Factory:      {} {} ({})",
        decoded.factory_flag, decoded.factory_country, decoded.factory_region
    );
}

fn handle_generate(config: &Config, cmd: &GenerateCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let decoder = Decoder::new(&storage);
    let mut rng = match cmd.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let decoded = (0..cmd.count)
        .map(|_| decoder.generate(&mut rng))
        .collect::<vindecoder::Result<Vec<_>>>()?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        for vin in &decoded {
            println!("{}  {:<6} {}", vin.vin, vin.wmi, vin.manufacturer);
        }
    }
    Ok(())
}

fn handle_factories(config: &Config, cmd: &FactoriesCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let mut factories = storage.logo_overview()?;
    if cmd.missing_logos {
        factories.retain(|f| !f.has_logos);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&factories)?);
        return Ok(());
    }

    println!("{:<5} {:<40} {:<24} Logos", "WMI", "Manufacturer", "Country");
    for factory in &factories {
        println!(
            "{:<5} {:<40} {:<24} {}",
            factory.wmi,
            factory.manufacturer,
            factory.country,
            factory.logos.join(", ")
        );
    }
    println!();
    println!("{} factories", factories.len());
    Ok(())
}

fn handle_logos(config: &Config, cmd: &LogosCommand) -> Result<()> {
    match cmd {
        LogosCommand::Import { json } => {
            let storage = open_storage(config)?;
            let report = logos::import(&storage, config).context("logo import failed")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_logo_report(&report);
            }
        }
    }
    Ok(())
}

fn handle_inspect(config: &Config, cmd: &InspectCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let tables = storage.inspect(cmd.rows)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    println!("Database: {}", storage.path().display());
    for table in &tables {
        println!();
        print_table(table);
    }
    Ok(())
}

fn print_table(table: &TableReport) {
    println!("Table: {} ({} rows)", table.name, table.row_count);
    println!("{}", "=".repeat(table.name.len() + 7));
    println!("{}", table.create_sql);
    println!();
    println!("Columns:");
    for column in &table.columns {
        let mut flags = Vec::new();
        if column.primary_key {
            flags.push("PK".to_string());
        }
        if column.not_null {
            flags.push("NOT NULL".to_string());
        }
        if let Some(default) = &column.default {
            flags.push(format!("DEFAULT {default}"));
        }
        println!(
            "  {:<16} {:<10} {}",
            column.name,
            column.column_type,
            flags.join(" ")
        );
    }

    if !table.foreign_keys.is_empty() {
        println!("Foreign keys:");
        for fk in &table.foreign_keys {
            println!(
                "  {} -> {}.{} (ON DELETE {})",
                fk.from, fk.table, fk.to, fk.on_delete
            );
        }
    }

    if !table.sample_rows.is_empty() {
        println!("Sample rows:");
        println!("  {}", table.sample_columns.join(" | "));
        for row in &table.sample_rows {
            println!("  {}", row.join(" | "));
        }
    }
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;
    let seeded_at = storage.metadata("seeded_at")?;
    let sources = storage.source_hashes()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "seeded_at": seeded_at,
            "stats": stats,
            "sources": sources
                .iter()
                .map(|(name, hash)| (name.clone(), serde_json::Value::from(hash.clone())))
                .collect::<serde_json::Map<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("vind status");
        println!("-----------");
        println!("Database:       {}", storage.path().display());
        println!("Schema version: {}", stats.schema_version);
        println!("Size:           {} bytes", stats.db_size_bytes);
        println!(
            "Seeded at:      {}",
            seeded_at.as_deref().unwrap_or("never")
        );
        println!();
        println!("Countries:      {}", stats.countries);
        println!("WMI regions:    {}", stats.wmi_regions);
        println!("WMI factories:  {}", stats.wmi_factories);
        println!("Factory logos:  {}", stats.factory_logos);
        if !sources.is_empty() {
            println!();
            println!("Sources:");
            for (name, hash) in &sources {
                println!("  {name:<10} {hash}");
            }
        }
    }
    Ok(())
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if let Some(workers) = cmd.workers {
        config.server.workers = workers;
    }
    config.validate()?;

    server::serve(&config).context("HTTP server failed")?;
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) -> Result<()> {
    match Config::load_from(file) {
        Ok(config) => {
            config.validate()?;
            println!("Configuration is valid.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            Err(e.into())
        }
    }
}

fn handle_config(
    config: &Config,
    cmd: ConfigCommand,
    config_path: Option<std::path::PathBuf>,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!();
                println!("[Sources]");
                println!("  Directory:        {}", config.sources_dir().display());
                println!("  Countries:        {}", config.sources.countries_file);
                println!("  Regions:          {}", config.sources.regions_file);
                println!("  Factories:        {}", config.sources.factories_file);
                println!("  Fetch countries:  {}", config.sources.fetch_countries);
                println!("  Countries URL:    {}", config.sources.countries_url);
                println!("  WMI page:         {}", config.sources.wmi_page_url);
                println!("  WMI page cache:   {}", config.wmi_page_cache_path().display());
                println!("  Fetch WMI page:   {}", config.sources.fetch_wmi_page);
                println!();
                println!("[Logos]");
                println!("  Source dir:       {}", config.logo_source_dir().display());
                println!("  Output dir:       {}", config.logo_output_dir().display());
                println!("  Extensions:       {}", config.logos.extensions.join(" "));
                println!("  Aliases:          {}", config.logos.aliases.len());
                println!("  Thumbnail height: {}", config.logos.thumbnail_height);
                println!();
                println!("[Region icons]");
                println!("  Source dir:       {}", config.region_icon_source_dir().display());
                println!("  Output dir:       {}", config.region_icon_output_dir().display());
                println!("  Extensions:       {}", config.region_icons.extensions.join(" "));
                println!("  Size:             {}", config.region_icons.size);
                println!();
                println!("[Server]");
                println!("  Bind:             {}", config.server.bind);
                println!("  Port:             {}", config.server.port);
                println!("  Workers:          {}", config.server.workers);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { .. } => {
            handle_validate(config_path)?;
        }
    }
    Ok(())
}
