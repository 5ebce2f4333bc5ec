use clap::Parser;
use std::error::Error;
use subnet_topology_planner::config::{Config, OutputFormat};
use subnet_topology_planner::output::{plan_json, plan_print, print_report};
use subnet_topology_planner::{plan, read_declaration};

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let config = Config::parse();
    log4rs::init_file(&config.log_config, Default::default())
        .map_err(|e| format!("Error initializing log4rs from {}: {e}", config.log_config))?;
    //
    log::info!("#Start main()");

    let declaration = read_declaration(&config.declaration)?;
    let plan = plan(&declaration, config.mode)?;

    match config.format {
        OutputFormat::Csv => plan_print(&plan),
        OutputFormat::Json => println!("{}", plan_json(&plan)?),
    }
    print_report(plan.report());

    if !plan.is_provisionable() {
        return Err(format!(
            "{} planning issue(s) in {}, refusing to provision",
            plan.report().len(),
            config.declaration
        )
        .into());
    }
    Ok(())
}
