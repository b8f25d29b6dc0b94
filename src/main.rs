use anyhow::Result;
use std::path::PathBuf;

use plugin_base_core::console::format_entry;
use plugin_base_core::HostState;

fn main() -> Result<()> {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: plugin-base <descriptor.json>...");
        std::process::exit(2);
    }

    let host = HostState::new()?;
    run(&host, &paths);
    Ok(())
}

fn run(host: &HostState, paths: &[PathBuf]) {
    let mut plugins = Vec::new();
    for path in paths {
        match host.load_plugin(path) {
            Ok(plugin) => {
                host.console
                    .write()
                    .log_info(&format!("Loaded: {} v{}", plugin.name(), plugin.version()));
                plugins.push(plugin);
            }
            Err(e) => {
                host.console
                    .write()
                    .log_error(&format!("Failed to load {}: {:#}", path.display(), e));
            }
        }
    }

    host.run_session(&mut plugins);

    for timed in host.console.write().get_new_entries() {
        println!("[{}] {}", timed.at.format("%H:%M:%S"), format_entry(&timed.entry));
    }

    for check in host.updates.drain() {
        println!(
            "update check pending: {} v{} from {}",
            check.plugin, check.version, check.source
        );
    }
}
