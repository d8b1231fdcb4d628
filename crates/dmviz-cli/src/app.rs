//! Resolves configuration and controls, loads the snapshot and derives the
//! requested view.

use crate::args::Args;
use crate::error::CliResult;
use dmviz_config::{Config, ConfigLoader};
use dmviz_graphs::{ChartKind, ControlChange, Controls, DerivedView, GraphManager, SnapshotLoader, ViewState};
use tracing::{debug, info, instrument};

/// Loads the configuration file (or the default lookup) and applies the
/// command line source overrides.
pub fn resolve_config(args: &Args) -> CliResult<Config> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_config(path)?,
        None => ConfigLoader::load()?,
    };

    if let Some(dir) = &args.data_dir {
        config.data.base_dir.clone_from(dir);
        config.data.base_url = None;
    }
    if let Some(url) = &args.base_url {
        config.data.base_url = Some(url.clone());
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }

    config.validate()?;
    Ok(config)
}

/// Controls and view state for one invocation: configured defaults, then
/// the command line flags, then hidden and selected contacts.
pub fn resolve_controls(config: &Config, args: &Args) -> CliResult<(Controls, ViewState)> {
    let mut controls = Controls::from_config(config)?;
    let mut state = ViewState::default();

    // the response chart has its own default length
    if args.chart == ChartKind::Response && args.controls.top_n.is_none() {
        controls.apply(ControlChange::TopN(config.ranking.response_top_n), &mut state)?;
    }

    for change in args.controls.changes(&controls.range)? {
        debug!(?change, "Applying control");
        controls.apply(change, &mut state)?;
    }

    for name in &args.controls.hide {
        if !state.is_hidden(name) {
            state.toggle_hidden(name);
        }
    }
    if let Some(name) = &args.controls.select {
        state.select(name);
    }

    Ok((controls, state))
}

/// Loads the datasets `args.chart` needs and derives its view.
#[instrument(skip_all, fields(chart = %args.chart))]
pub async fn derive_view(config: &Config, args: &Args) -> CliResult<DerivedView> {
    let (controls, state) = resolve_controls(config, args)?;

    let loader = SnapshotLoader::from_config(&config.data)?;
    let snapshot = loader
        .load(&args.chart.required_datasets(controls.granularity))
        .await?;

    let view = GraphManager::from_config(config).derive(args.chart, &snapshot, &controls, &state)?;
    info!("View derived");
    Ok(view)
}

/// Derives the view and renders it as JSON.
pub async fn run(config: &Config, args: &Args) -> CliResult<String> {
    let view = derive_view(config, args).await?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&view)?
    } else {
        serde_json::to_string(&view)?
    };
    Ok(json)
}
