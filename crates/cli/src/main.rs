use clap::Parser;
use config::Config;
use flume::bounded;
use orchestrator::{
    ControlEvent, ReadaheadPolicy, Services, SysfsActuator, TracefsSampler, TunerEngine,
    UnixSocketClassifier,
};
use ratuned::{
    cli::Cli,
    signals::{SignalEvent, wait_for_signal},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. For example, `RATUNED_LOG=warn ratuned -vvv` will
    // still log at the trace level. The environment variable (`RATUNED_LOG`)
    // can only set the log level per crate, not override the verbosity flag.
    // Eg. `RATUNED_LOG=orchestrator=warn ratuned -vvv` will log at the trace
    // level for all crates except `orchestrator` which will log at the warn
    // level.
    let env_filter = EnvFilter::builder()
        .with_env_var("RATUNED_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    let mut config = load_config(&cli)?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    debug!(?config, ?cli);

    // install signal handlers
    let (signals_tx, signals_rx) = bounded(8);
    let signal_handle = tokio::spawn(async move { wait_for_signal(signals_tx).await });

    // Attach the probe before anything else: without events there is nothing
    // to tune, so a failure here is fatal.
    let sampler = TracefsSampler::attach(&config.sampler.device, config.sampler.queue_capacity)?;
    let services = Services {
        sampler: Box::new(sampler),
        classifier: Box::new(UnixSocketClassifier::new(
            &config.inference.socket,
            config.inference.timeout,
        )),
        actuator: Box::new(SysfsActuator::new(
            &config.sampler.device,
            ReadaheadPolicy::from(&config.readahead),
        )),
    };

    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let mut engine = TunerEngine::new(config, services);
    let engine_cancel = cancel.clone();
    let mut engine_handle =
        tokio::spawn(async move { engine.run_until(engine_cancel, control_rx).await });

    let result = loop {
        tokio::select! {
            // the engine stopping, cleanly or not, ends the process
            res = &mut engine_handle => {
                let res = res?;
                if let Err(err) = &res {
                    error!("error happened in the control loop: {}", err);
                }
                break res;
            }

            // handle the signal events
            event_res = signals_rx.recv_async() => {
                let event = event_res?;
                debug!(?event, "received signal event");

                match event {
                    SignalEvent::Shutdown => cancel.cancel(),
                    SignalEvent::ReloadConfig => match load_config(&cli) {
                        Ok(mut reloaded) => {
                            cli.apply_overrides(&mut reloaded);
                            match reloaded.validate() {
                                Ok(()) => {
                                    let _ = control_tx.send(ControlEvent::Reload(Box::new(reloaded)));
                                }
                                Err(err) => error!("reloaded config rejected: {}", err),
                            }
                        }
                        Err(err) => error!("config reload failed, keeping previous: {}", err),
                    },
                    SignalEvent::DumpStatus => {
                        let _ = control_tx.send(ControlEvent::DumpStatus);
                    }
                }
            }
        }
    };

    signal_handle.abort();
    Ok(result?)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("/etc/ratuned/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/ratuned/config.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    Ok(config)
}
