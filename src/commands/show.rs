// ABOUTME: Show command implementation.
// ABOUTME: Prints the finalized configuration, including always-exposed ports and derived bindings.

use dockapp::config::DeployConfig;
use dockapp::deploy::{exposed_ports, host_bindings};
use dockapp::output::{Output, OutputMode};

pub fn show(config: &DeployConfig, output: &Output) {
    let exposed: Vec<String> = exposed_ports(&config.ports)
        .iter()
        .map(ToString::to_string)
        .collect();
    let env: Vec<String> = config.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let host = host_bindings(config);
    let port_bind: Vec<String> = host
        .port_bindings
        .iter()
        .map(|(port, host_port)| format!("{port}={host_port}"))
        .collect();

    if output.mode() == OutputMode::Json {
        let value = serde_json::json!({
            "name": config.name.as_str(),
            "image": config.image,
            "exposedPorts": exposed,
            "env": env,
            "portBind": port_bind,
            "binds": host.binds,
            "command": config.command,
            "timeout": config.timeout.map(|t| t.as_secs_f64()),
        });
        println!("{value}");
        return;
    }

    println!("name:      {}", config.name);
    println!("image:     {}", config.image);
    println!("exposed:   {}", exposed.join(", "));
    println!("env:       {}", env.join(" "));
    println!("portBind:  {}", port_bind.join(", "));
    println!("binds:     {}", host.binds.join(", "));
    println!("command:   {}", config.command.join(" "));
    if let Some(timeout) = config.timeout {
        println!("timeout:   {}s", timeout.as_secs());
    }
}
