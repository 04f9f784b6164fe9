mod steps;
mod world;

use clap::Args;
use colored::Colorize;
use cucumber::{cli, World as _};
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::Arc;

use lumi_storefront::runner::cucumber_adapter::has_tag;
use lumi_storefront::runner::{Lifecycle, ScenarioInfo};
use lumi_storefront::utils::{HarnessConfig, Interrupt};
use world::StoreWorld;

/// Exit code when the run itself broke (report I/O, setup)
const EXIT_FATAL: i32 = 2;

#[derive(Args, Debug, Clone)]
struct HarnessArgs {
    /// Harness config file (YAML)
    #[arg(long, default_value = "lumi-storefront.yaml")]
    config: PathBuf,

    /// Feature file or directory, overriding the config
    #[arg(long)]
    features: Option<PathBuf>,

    /// Report output directory, overriding the config
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, default_value = "false")]
    headless: bool,

    /// Emulate the configured mobile device
    #[arg(long, default_value = "false")]
    mobile: bool,
}

impl HarnessArgs {
    /// Config file, then environment, then flags
    fn load_config(&self) -> anyhow::Result<HarnessConfig> {
        let mut config = HarnessConfig::load(&self.config)?;
        config.apply_env();

        if let Some(ref features) = self.features {
            config.features = features.clone();
        }
        if let Some(ref report_dir) = self.report_dir {
            config.report_dir = report_dir.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if self.mobile {
            config.browser.mobile_emulation = true;
        }
        Ok(config)
    }
}

fn fatal(error: anyhow::Error) -> ! {
    log::error!("{:#}", error);
    eprintln!("{} {:#}", "✗".red().bold(), error);
    std::process::exit(EXIT_FATAL);
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = cli::Opts::<_, _, _, HarnessArgs>::parsed();
    let config = opts.custom.load_config().unwrap_or_else(|e| fatal(e));

    println!(
        "{} Running features from: {}",
        "▶".green().bold(),
        config.features.display()
    );
    println!("  Tag: {}", format!("@{}", config.tag).yellow());
    if config.browser.headless {
        println!("  Headless: {}", "Enabled".green());
    }
    if config.browser.mobile_emulation {
        println!("  Device: {}", config.browser.device.cyan());
    }

    let interrupt = Interrupt::new();
    if let Err(e) = interrupt.install_ctrlc() {
        log::warn!("Ctrl+C handler not installed: {}", e);
    }

    let lifecycle =
        Arc::new(Lifecycle::run_starting(config, interrupt).unwrap_or_else(|e| fatal(e)));
    let features = lifecycle.context().config.features.clone();
    let tag = lifecycle.context().config.tag.clone();

    let before = lifecycle.clone();
    let after = lifecycle.clone();

    StoreWorld::cucumber()
        .max_concurrent_scenarios(1)
        .before(move |feature, rule, scenario, world| {
            let lifecycle = before.clone();
            async move {
                let info = ScenarioInfo::from_gherkin(feature, rule, scenario);
                let node = lifecycle.before_scenario(info).await;
                world.attach(lifecycle.context().clone(), node);
            }
            .boxed_local()
        })
        .after(move |_feature, _rule, _scenario, event, world| {
            let lifecycle = after.clone();
            async move {
                let session = world.and_then(|w| w.session.take());
                if let Err(e) = lifecycle.after_scenario(session, event).await {
                    fatal(e);
                }
            }
            .boxed_local()
        })
        .with_cli(opts)
        .filter_run(features, move |feature, rule, scenario| {
            has_tag(&tag, feature, rule, scenario)
        })
        .await;

    match lifecycle.run_finished().await {
        Ok(0) => std::process::exit(0),
        Ok(_) => std::process::exit(1),
        Err(e) => fatal(e),
    }
}
