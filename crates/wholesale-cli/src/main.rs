// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use logging::LogTarget;
use runtime::ApiRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;
use wholesale_api::Client;
use wholesale_testkit::{CatalogFaker, MockApi};

const DEMO_SEED: u64 = 2023;
const DEMO_PRODUCTS: usize = 24;
const DEMO_SUPPLIERS: usize = 6;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let mut config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `wholesale --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    if let Some(api_url) = &options.api_url {
        config.api.base_url = Some(api_url.clone());
    }

    let demo_api = if options.demo {
        let catalog = CatalogFaker::new(DEMO_SEED).catalog(DEMO_PRODUCTS, DEMO_SUPPLIERS);
        let api = MockApi::start_with(move |url| catalog.respond(url))
            .context("start demo catalog server")?;
        config.api.base_url = Some(api.base_url().to_owned());
        Some(api)
    } else {
        None
    };

    let log_target = if options.check_only {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file()?)
    };
    logging::init_logging(config.log_level()?, &log_target)?;

    let base_url = config.api_base_url();
    let client = Client::new(&base_url, config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values or set WHOLESALE_API_URL",
            options.config_path.display()
        )
    })?;
    info!(%base_url, demo = options.demo, check = options.check_only, "starting");

    if options.check_only {
        let products = client.list_products().with_context(|| {
            format!("fetch products from {base_url}; is the catalog API running?")
        })?;
        println!("{} products available at {base_url}", products.len());
        return Ok(());
    }

    let mut state = config.initial_state();
    let mut runtime = ApiRuntime::new(client);
    let result = wholesale_tui::run_app(&mut state, &mut runtime);
    drop(demo_api);
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    api_url: Option<String>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        api_url: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--api-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--api-url requires a base URL"))?;
                options.api_url = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("wholesale: terminal viewer for the wholesale base catalog");
    println!("  --config <path>          Use a specific config path");
    println!("  --api-url <url>          Override [api].base_url");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Serve a generated catalog in-process and view it");
    println!("  --check                  Validate config and fetch the product list once");
    println!("  --help                   Show this help");
}
