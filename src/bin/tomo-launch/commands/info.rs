use serde::Serialize;
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};
use tomo_launch::config::Config;
use tomo_launch::core::executor::DryRunExecutor;
use tomo_launch::core::inventory::ResourceInventory;
use tomo_launch::core::planner::ProcessPlan;
use tomo_launch::core::probe::ResourceProbe;
use tomo_launch::Launcher;

#[derive(Debug, Serialize)]
struct InfoReport<'a> {
    launcher: &'a str,
    inventory: ResourceInventory,
    plan: ProcessPlan,
}

pub fn handle_info<P: ResourceProbe>(
    config: Config,
    probe: P,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let launcher = Launcher::new(config, probe, DryRunExecutor);
    let (inventory, plan) = match launcher.assess() {
        Ok(assessment) => assessment,
        Err(err) => {
            eprintln!("tomo-launch: {err}");
            return Ok(ExitCode::from(err.exit_code()));
        }
    };

    let report = InfoReport {
        launcher: &launcher.config().launcher.program,
        inventory,
        plan,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_table(&report));
    }
    Ok(ExitCode::SUCCESS)
}

fn render_table(report: &InfoReport<'_>) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "RESOURCE")]
        resource: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let rows = vec![
        Row {
            resource: "cores",
            value: report.inventory.core_count.to_string(),
        },
        Row {
            resource: "gpus",
            value: report.inventory.gpu_count.to_string(),
        },
        Row {
            resource: "nodes",
            value: report.plan.node_count.to_string(),
        },
        Row {
            resource: "ranks",
            value: report.plan.process_count.to_string(),
        },
        Row {
            resource: "labels",
            value: report.plan.labels.to_string(),
        },
        Row {
            resource: "launcher",
            value: report.launcher.to_string(),
        },
    ];

    Table::new(&rows).with(Style::empty()).to_string()
}
